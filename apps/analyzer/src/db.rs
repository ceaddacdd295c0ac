use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Tables are created on startup if missing; records live in JSONB columns.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS cvs (
        id          UUID PRIMARY KEY,
        filename    TEXT,
        data        JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS jobs (
        id          UUID PRIMARY KEY,
        data        JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS analyses (
        id                 UUID PRIMARY KEY,
        cv_id              UUID NOT NULL REFERENCES cvs(id) ON DELETE CASCADE,
        job_id             UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
        suitability_score  SMALLINT NOT NULL,
        result             JSONB NOT NULL,
        duration_seconds   DOUBLE PRECISION NOT NULL,
        created_at         TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS analyses_cv_idx ON analyses (cv_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS analyses_job_score_idx ON analyses (job_id, suitability_score DESC)",
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Idempotent: safe to run on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to bootstrap database schema")?;
    }
    info!("Database schema ready");
    Ok(())
}
