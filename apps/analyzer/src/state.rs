use std::sync::Arc;

use crate::analysis::extractor::DocumentExtractor;
use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Config;
use crate::repository::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres when `DATABASE_URL` is set, in-memory otherwise.
    pub store: Arc<dyn DocumentStore>,
    pub extractor: DocumentExtractor,
    pub pipeline: AnalysisPipeline,
    pub config: Config,
}
