use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, the configured model and the storage backend.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cv-job-analyzer",
        "reasoning_engine_configured": !state.config.anthropic_api_key.is_empty(),
        "llm_model": state.config.llm_model,
        "storage": state.store.backend()
    }))
}

/// GET /api/config
/// Public upload limits for clients.
pub async fn config_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "max_file_size_mb": state.config.max_file_size_mb,
        "allowed_media_types": state.config.allowed_media_types,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
