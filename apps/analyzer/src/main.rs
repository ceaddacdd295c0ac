mod analysis;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod repository;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::extractor::DocumentExtractor;
use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::{LlmClient, Reasoner};
use crate::repository::{DocumentStore, InMemoryStore, PgDocumentStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CV/job analyzer v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(database_url) => {
            let pool = create_pool(database_url).await?;
            ensure_schema(&pool).await?;
            info!("PostgreSQL store ready");
            Arc::new(PgDocumentStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set; records are kept in memory only");
            Arc::new(InMemoryStore::new())
        }
    };

    // Initialize reasoning engine
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    let reasoner = Reasoner::new(Arc::new(llm), config.llm_model.clone());
    info!("LLM client initialized (model: {})", reasoner.model());

    let state = AppState {
        store,
        extractor: DocumentExtractor::new(reasoner.clone())
            .with_retry_policy(config.extraction_retry),
        pipeline: AnalysisPipeline::new(reasoner).with_weights(config.scoring_weights),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
