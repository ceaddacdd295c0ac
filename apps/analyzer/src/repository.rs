//! Document store: persistence of extracted CVs, jobs and analysis records.
//!
//! Records are opaque to the store: each one is a JSONB document plus the few
//! columns needed for lookup and ordering. Lookups return `Option`; turning an
//! absent record into "not found" is the caller's decision.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::analysis::{AnalysisRecord, AnalysisResult};
use crate::models::cv::StructuredCv;
use crate::models::job::StructuredJob;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvRecord {
    pub id: Uuid,
    pub filename: Option<String>,
    pub cv: StructuredCv,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub job: StructuredJob,
    pub created_at: DateTime<Utc>,
}

/// One row of a job's candidate ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub analysis_id: Uuid,
    pub cv_id: Uuid,
    pub candidate_name: Option<String>,
    pub suitability_score: u8,
    pub analysis_date: DateTime<Utc>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;

    async fn insert_cv(&self, filename: Option<String>, cv: StructuredCv) -> Result<CvRecord>;
    async fn get_cv(&self, id: Uuid) -> Result<Option<CvRecord>>;

    async fn insert_job(&self, job: StructuredJob) -> Result<JobRecord>;
    async fn get_job(&self, id: Uuid) -> Result<Option<JobRecord>>;

    async fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()>;
    async fn get_analysis(&self, id: Uuid) -> Result<Option<AnalysisRecord>>;
    /// Newest first.
    async fn analyses_for_cv(&self, cv_id: Uuid) -> Result<Vec<AnalysisRecord>>;
    /// Highest suitability score first, newest first among equal scores.
    async fn top_matches_for_job(&self, job_id: Uuid, limit: usize) -> Result<Vec<AnalysisSummary>>;
}

// ────────────────────────────────────────────────────────────────────────────
// Postgres
// ────────────────────────────────────────────────────────────────────────────

#[derive(sqlx::FromRow)]
struct CvRow {
    id: Uuid,
    filename: Option<String>,
    data: Json<StructuredCv>,
    created_at: DateTime<Utc>,
}

impl From<CvRow> for CvRecord {
    fn from(row: CvRow) -> Self {
        CvRecord {
            id: row.id,
            filename: row.filename,
            cv: row.data.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct JobRow {
    id: Uuid,
    data: Json<StructuredJob>,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for JobRecord {
    fn from(row: JobRow) -> Self {
        JobRecord {
            id: row.id,
            job: row.data.0,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AnalysisRow {
    id: Uuid,
    cv_id: Uuid,
    job_id: Uuid,
    result: Json<AnalysisResult>,
    duration_seconds: f64,
    created_at: DateTime<Utc>,
}

impl From<AnalysisRow> for AnalysisRecord {
    fn from(row: AnalysisRow) -> Self {
        AnalysisRecord {
            id: row.id,
            cv_id: row.cv_id,
            job_id: row.job_id,
            result: row.result.0,
            analysis_duration_seconds: row.duration_seconds,
            analysis_date: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: Uuid,
    cv_id: Uuid,
    candidate_name: Option<String>,
    suitability_score: i16,
    created_at: DateTime<Utc>,
}

const ANALYSIS_COLUMNS: &str = "id, cv_id, job_id, result, duration_seconds, created_at";

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_cv(&self, filename: Option<String>, cv: StructuredCv) -> Result<CvRecord> {
        let row = sqlx::query_as::<_, CvRow>(
            r#"
            INSERT INTO cvs (id, filename, data, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, filename, data, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(filename)
        .bind(Json(&cv))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert CV")?;
        Ok(row.into())
    }

    async fn get_cv(&self, id: Uuid) -> Result<Option<CvRecord>> {
        let row = sqlx::query_as::<_, CvRow>(
            "SELECT id, filename, data, created_at FROM cvs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load CV")?;
        Ok(row.map(Into::into))
    }

    async fn insert_job(&self, job: StructuredJob) -> Result<JobRecord> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, data, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, data, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Json(&job))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert job")?;
        Ok(row.into())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRecord>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT id, data, created_at FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load job")?;
        Ok(row.map(Into::into))
    }

    async fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO analyses
                (id, cv_id, job_id, suitability_score, result, duration_seconds, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(record.cv_id)
        .bind(record.job_id)
        .bind(i16::from(record.result.overall_score))
        .bind(Json(&record.result))
        .bind(record.analysis_duration_seconds)
        .bind(record.analysis_date)
        .execute(&self.pool)
        .await
        .context("Failed to insert analysis")?;
        Ok(())
    }

    async fn get_analysis(&self, id: Uuid) -> Result<Option<AnalysisRecord>> {
        let row = sqlx::query_as::<_, AnalysisRow>(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM analyses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load analysis")?;
        Ok(row.map(Into::into))
    }

    async fn analyses_for_cv(&self, cv_id: Uuid) -> Result<Vec<AnalysisRecord>> {
        let rows = sqlx::query_as::<_, AnalysisRow>(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM analyses WHERE cv_id = $1 ORDER BY created_at DESC"
        ))
        .bind(cv_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list analyses for CV")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn top_matches_for_job(&self, job_id: Uuid, limit: usize) -> Result<Vec<AnalysisSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT a.id, a.cv_id, c.data->'contact_info'->>'name' AS candidate_name,
                   a.suitability_score, a.created_at
            FROM analyses a
            JOIN cvs c ON c.id = a.cv_id
            WHERE a.job_id = $1
            ORDER BY a.suitability_score DESC, a.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(job_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to rank analyses for job")?;

        Ok(rows
            .into_iter()
            .map(|row| AnalysisSummary {
                analysis_id: row.id,
                cv_id: row.cv_id,
                candidate_name: row.candidate_name,
                suitability_score: row.suitability_score.clamp(0, 100) as u8,
                analysis_date: row.created_at,
            })
            .collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct InMemoryStore {
    cvs: RwLock<HashMap<Uuid, CvRecord>>,
    jobs: RwLock<HashMap<Uuid, JobRecord>>,
    analyses: RwLock<HashMap<Uuid, AnalysisRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_cv(&self, filename: Option<String>, cv: StructuredCv) -> Result<CvRecord> {
        let record = CvRecord {
            id: Uuid::new_v4(),
            filename,
            cv,
            created_at: Utc::now(),
        };
        self.cvs.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_cv(&self, id: Uuid) -> Result<Option<CvRecord>> {
        Ok(self.cvs.read().await.get(&id).cloned())
    }

    async fn insert_job(&self, job: StructuredJob) -> Result<JobRecord> {
        let record = JobRecord {
            id: Uuid::new_v4(),
            job,
            created_at: Utc::now(),
        };
        self.jobs.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<JobRecord>> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn insert_analysis(&self, record: &AnalysisRecord) -> Result<()> {
        self.analyses.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_analysis(&self, id: Uuid) -> Result<Option<AnalysisRecord>> {
        Ok(self.analyses.read().await.get(&id).cloned())
    }

    async fn analyses_for_cv(&self, cv_id: Uuid) -> Result<Vec<AnalysisRecord>> {
        let mut records: Vec<AnalysisRecord> = self
            .analyses
            .read()
            .await
            .values()
            .filter(|record| record.cv_id == cv_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.analysis_date.cmp(&a.analysis_date));
        Ok(records)
    }

    async fn top_matches_for_job(&self, job_id: Uuid, limit: usize) -> Result<Vec<AnalysisSummary>> {
        let mut records: Vec<AnalysisRecord> = self
            .analyses
            .read()
            .await
            .values()
            .filter(|record| record.job_id == job_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.result
                .overall_score
                .cmp(&a.result.overall_score)
                .then(b.analysis_date.cmp(&a.analysis_date))
        });
        records.truncate(limit);

        let cvs = self.cvs.read().await;
        Ok(records
            .into_iter()
            .map(|record| AnalysisSummary {
                analysis_id: record.id,
                cv_id: record.cv_id,
                candidate_name: cvs
                    .get(&record.cv_id)
                    .and_then(|stored| stored.cv.contact_info.name.clone()),
                suitability_score: record.result.overall_score,
                analysis_date: record.analysis_date,
            })
            .collect())
    }
}
