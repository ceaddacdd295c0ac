pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

/// Room for multipart framing on top of the file itself, so oversized files
/// get the explicit size error instead of a truncated body.
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size_bytes() + UPLOAD_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/config", get(health::config_handler))
        // CVs
        .route("/api/v1/cvs", post(handlers::handle_upload_cv))
        .route("/api/v1/cvs/:id", get(handlers::handle_get_cv))
        .route("/api/v1/cvs/:id/analyses", get(handlers::handle_cv_analyses))
        // Jobs
        .route("/api/v1/jobs", post(handlers::handle_create_job))
        .route("/api/v1/jobs/extract", post(handlers::handle_extract_job))
        .route("/api/v1/jobs/upload", post(handlers::handle_upload_job))
        .route("/api/v1/jobs/:id", get(handlers::handle_get_job))
        .route(
            "/api/v1/jobs/:id/top-matches",
            get(handlers::handle_top_matches),
        )
        // Analyses
        .route("/api/v1/analyses", post(handlers::handle_create_analysis))
        .route("/api/v1/analyses/:id", get(handlers::handle_get_analysis))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
