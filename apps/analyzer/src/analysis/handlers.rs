//! Axum route handlers for the CV, job and analysis API.

use anyhow::anyhow;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::analysis::document::{media_essence, PDF};
use crate::analysis::extractor::{structure_job, DocumentKind};
use crate::analysis::pipeline::AnalysisOptions;
use crate::errors::AppError;
use crate::models::analysis::AnalysisRecord;
use crate::repository::{AnalysisSummary, CvRecord, JobRecord};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";
const MIN_JOB_TEXT_CHARS: usize = 50;
const DEFAULT_TOP_MATCHES: usize = 10;
const MAX_TOP_MATCHES: usize = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExtractJobRequest {
    pub text: String,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub cv_id: Uuid,
    pub job_id: Uuid,
    #[serde(default = "yes")]
    pub detailed: bool,
    #[serde(default = "yes")]
    pub save_result: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub analysis: AnalysisRecord,
    pub saved: bool,
}

#[derive(Debug, Deserialize)]
pub struct TopMatchesQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopMatchesResponse {
    pub job_id: Uuid,
    pub job_title: String,
    pub matches: Vec<AnalysisSummary>,
}

// ────────────────────────────────────────────────────────────────────────────
// CVs
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cvs
///
/// Multipart upload (`file` field). The document is processed in memory and
/// only its structured extraction is stored.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CvRecord>), AppError> {
    let upload = read_upload(&state, multipart).await?;
    info!(
        "Processing CV upload: {} ({}, {} bytes)",
        upload.filename.as_deref().unwrap_or("unnamed"),
        upload.media_type,
        upload.bytes.len()
    );

    let cv = state
        .extractor
        .extract(upload.bytes, &upload.media_type, DocumentKind::Cv)
        .await?
        .into_cv()
        .ok_or_else(|| anyhow!("Extractor returned a job posting for a CV upload"))?;
    let record = state.store.insert_cv(upload.filename, cv).await?;

    info!("Stored CV {}", record.id);
    Ok((StatusCode::CREATED, Json(record)))
}

/// Reads the `file` field and applies the emptiness, size and media-type checks.
async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<Upload, AppError> {
    let upload = loop {
        let Some(field) = multipart.next_field().await.map_err(multipart_error)? else {
            return Err(AppError::Validation(format!(
                "multipart field '{UPLOAD_FIELD}' is required"
            )));
        };
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let media_type = field
            .content_type()
            .map(media_essence)
            .filter(|media_type| media_type != "application/octet-stream")
            .or_else(|| filename.as_deref().and_then(media_type_from_extension))
            .unwrap_or_default();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        break Upload {
            filename,
            media_type,
            bytes,
        };
    };

    if upload.bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }
    if upload.bytes.len() > state.config.max_file_size_bytes() {
        return Err(AppError::PayloadTooLarge(format!(
            "File exceeds the {} MB limit",
            state.config.max_file_size_mb
        )));
    }
    if !state.config.accepts_media_type(&upload.media_type) {
        return Err(AppError::UnsupportedMediaType(upload.media_type));
    }
    Ok(upload)
}

struct Upload {
    filename: Option<String>,
    media_type: String,
    bytes: Bytes,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("invalid multipart body: {}", e.body_text()))
    }
}

fn media_type_from_extension(filename: &str) -> Option<String> {
    let extension = filename.rsplit_once('.')?.1.to_lowercase();
    let media_type = match extension.as_str() {
        "pdf" => PDF,
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        _ => return None,
    };
    Some(media_type.to_string())
}

/// GET /api/v1/cvs/:id
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
) -> Result<Json<CvRecord>, AppError> {
    let record = state
        .store
        .get_cv(cv_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))?;
    Ok(Json(record))
}

/// GET /api/v1/cvs/:id/analyses
pub async fn handle_cv_analyses(
    State(state): State<AppState>,
    Path(cv_id): Path<Uuid>,
) -> Result<Json<Vec<AnalysisRecord>>, AppError> {
    if state.store.get_cv(cv_id).await?.is_none() {
        return Err(AppError::NotFound(format!("CV {cv_id} not found")));
    }
    Ok(Json(state.store.analyses_for_cv(cv_id).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Jobs
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs
///
/// Stores an already-structured job. The same lenient coercion as extraction
/// applies; only `job_title` is required.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<JobRecord>), AppError> {
    let job = structure_job(body)?;
    let record = state.store.insert_job(job).await?;
    info!("Stored job {} ('{}')", record.id, record.job.job_title);
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/v1/jobs/extract
///
/// Extracts a job from raw posting text, then stores it.
pub async fn handle_extract_job(
    State(state): State<AppState>,
    Json(request): Json<ExtractJobRequest>,
) -> Result<(StatusCode, Json<JobRecord>), AppError> {
    if request.text.trim().chars().count() < MIN_JOB_TEXT_CHARS {
        return Err(AppError::Validation(format!(
            "job description text must be at least {MIN_JOB_TEXT_CHARS} characters"
        )));
    }

    let job = state.extractor.extract_job_text(&request.text).await?;
    let record = state.store.insert_job(job).await?;
    info!("Stored extracted job {} ('{}')", record.id, record.job.job_title);
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/v1/jobs/upload
///
/// Multipart job posting (`file` field), same limits as CV uploads.
pub async fn handle_upload_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobRecord>), AppError> {
    let upload = read_upload(&state, multipart).await?;
    let job = state
        .extractor
        .extract(upload.bytes, &upload.media_type, DocumentKind::Job)
        .await?
        .into_job()
        .ok_or_else(|| anyhow!("Extractor returned a CV for a job upload"))?;
    let record = state.store.insert_job(job).await?;
    info!("Stored uploaded job {} ('{}')", record.id, record.job.job_title);
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRecord>, AppError> {
    let record = state
        .store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job description {job_id} not found")))?;
    Ok(Json(record))
}

/// GET /api/v1/jobs/:id/top-matches?limit=N
pub async fn handle_top_matches(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<TopMatchesQuery>,
) -> Result<Json<TopMatchesResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_TOP_MATCHES);
    if !(1..=MAX_TOP_MATCHES).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_TOP_MATCHES}"
        )));
    }

    let job = state
        .store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job description {job_id} not found")))?;
    let matches = state.store.top_matches_for_job(job_id, limit).await?;

    Ok(Json(TopMatchesResponse {
        job_id,
        job_title: job.job.job_title,
        matches,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Analyses
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses
///
/// Runs the full pipeline for a stored CV and job. The record is persisted
/// unless `save_result` is false.
pub async fn handle_create_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let outcome = state
        .pipeline
        .run(
            state.store.as_ref(),
            request.cv_id,
            request.job_id,
            AnalysisOptions {
                detailed: request.detailed,
            },
        )
        .await?;

    let analysis = AnalysisRecord {
        id: Uuid::new_v4(),
        cv_id: request.cv_id,
        job_id: request.job_id,
        result: outcome.result,
        analysis_duration_seconds: outcome.duration.as_secs_f64(),
        analysis_date: Utc::now(),
    };

    if request.save_result {
        state.store.insert_analysis(&analysis).await?;
        info!("Stored analysis {}", analysis.id);
    }

    Ok(Json(AnalysisResponse {
        analysis,
        saved: request.save_result,
    }))
}

/// GET /api/v1/analyses/:id
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<Uuid>,
) -> Result<Json<AnalysisRecord>, AppError> {
    let record = state
        .store
        .get_analysis(analysis_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {analysis_id} not found")))?;
    Ok(Json(record))
}
