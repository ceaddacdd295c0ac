//! Document Extractor: turns a raw résumé or job posting into a structured
//! record with one reasoning-engine call, tolerating malformed replies.
//!
//! Flow: decode bytes → prompt with the schema → up to `max_attempts` calls with
//! exponential backoff until a reply parses as a JSON object → lenient schema
//! coercion (bad list items are dropped, not fatal) → best-effort raw-text capture.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::document::{decode_document, media_essence};
use crate::analysis::normalizer::normalize_date;
use crate::analysis::prompts::{CV_EXTRACTION_PROMPT, JOB_EXTRACTION_PROMPT, RAW_TEXT_PROMPT};
use crate::llm_client::prompts::json_only;
use crate::llm_client::{extract_json_object, PromptPart, Reasoner};
use crate::models::cv::StructuredCv;
use crate::models::job::StructuredJob;
use crate::models::lenient;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("No parseable JSON after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("Extracted document is not a JSON object")]
    NotAnObject,

    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("Extracted document does not match the schema: {0}")]
    Schema(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cv,
    Job,
}

impl DocumentKind {
    fn prompt(self) -> &'static str {
        match self {
            DocumentKind::Cv => CV_EXTRACTION_PROMPT,
            DocumentKind::Job => JOB_EXTRACTION_PROMPT,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuredDocument {
    Cv(StructuredCv),
    Job(StructuredJob),
}

impl StructuredDocument {
    pub fn into_cv(self) -> Option<StructuredCv> {
        match self {
            StructuredDocument::Cv(cv) => Some(cv),
            StructuredDocument::Job(_) => None,
        }
    }

    pub fn into_job(self) -> Option<StructuredJob> {
        match self {
            StructuredDocument::Job(job) => Some(job),
            StructuredDocument::Cv(_) => None,
        }
    }
}

/// Attempt budget for one extraction. The delay before attempt `n` (n ≥ 2) is
/// `base_delay * 2^(n-2)`: 1s, 2s with the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.pow(attempt.saturating_sub(2))
    }
}

#[derive(Clone)]
pub struct DocumentExtractor {
    reasoner: Reasoner,
    retry: RetryPolicy,
}

impl DocumentExtractor {
    pub fn new(reasoner: Reasoner) -> Self {
        Self {
            reasoner,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Extracts either kind of document from raw bytes.
    pub async fn extract(
        &self,
        raw: Bytes,
        media_type: &str,
        kind: DocumentKind,
    ) -> Result<StructuredDocument, ExtractionError> {
        match kind {
            DocumentKind::Cv => self
                .extract_cv(raw, media_type)
                .await
                .map(StructuredDocument::Cv),
            DocumentKind::Job => self
                .extract_job(raw, media_type)
                .await
                .map(StructuredDocument::Job),
        }
    }

    async fn extract_cv(
        &self,
        raw: Bytes,
        media_type: &str,
    ) -> Result<StructuredCv, ExtractionError> {
        let document = decode(raw, media_type).await?;
        let object = self.request_object(DocumentKind::Cv, &document).await?;
        let mut cv = structure_cv(Value::Object(object))?;
        if cv.raw_text.is_empty() {
            cv.raw_text = self.capture_raw_text(&document).await;
        }
        info!(
            "Extracted CV: {} skills, {} experiences, {} education entries",
            cv.skills.len(),
            cv.experiences.len(),
            cv.education.len()
        );
        Ok(cv)
    }

    async fn extract_job(
        &self,
        raw: Bytes,
        media_type: &str,
    ) -> Result<StructuredJob, ExtractionError> {
        let document = decode(raw, media_type).await?;
        self.extract_job_document(document).await
    }

    /// Extracts a job posting that is already plain text.
    pub async fn extract_job_text(&self, text: &str) -> Result<StructuredJob, ExtractionError> {
        if text.trim().is_empty() {
            return Err(ExtractionError::UnreadableDocument(
                "job description is empty".to_string(),
            ));
        }
        let document = PromptPart::Document {
            media_type: "text/plain".to_string(),
            text: text.to_string(),
        };
        self.extract_job_document(document).await
    }

    async fn extract_job_document(
        &self,
        document: PromptPart,
    ) -> Result<StructuredJob, ExtractionError> {
        let object = self.request_object(DocumentKind::Job, &document).await?;
        let mut job = structure_job(Value::Object(object))?;
        if job.raw_text.is_empty() {
            job.raw_text = self.capture_raw_text(&document).await;
        }
        info!(
            "Extracted job '{}': {} required skills, {} responsibilities",
            job.job_title,
            job.required_skills.len(),
            job.responsibilities.len()
        );
        Ok(job)
    }

    /// Calls the engine until a reply contains a parseable JSON object.
    async fn request_object(
        &self,
        kind: DocumentKind,
        document: &PromptPart,
    ) -> Result<Map<String, Value>, ExtractionError> {
        let parts = [PromptPart::text(json_only(kind.prompt())), document.clone()];
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = self.retry.delay_before(attempt);
                warn!(
                    "Extraction attempt {}/{} failed, retrying after {}ms...",
                    attempt - 1,
                    max_attempts,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            info!("Extraction attempt {attempt}/{max_attempts} ({kind:?})");

            let reply = match self.reasoner.generate(&parts).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Reasoning engine call failed: {e}");
                    last_error = e.to_string();
                    continue;
                }
            };

            match parse_object(&reply) {
                Ok(object) => return Ok(object),
                Err(e) => {
                    warn!("Extraction reply was not valid JSON: {e}");
                    last_error = e;
                }
            }
        }

        Err(ExtractionError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Best effort: a failure leaves the raw text empty.
    async fn capture_raw_text(&self, document: &PromptPart) -> String {
        let parts = [PromptPart::text(RAW_TEXT_PROMPT), document.clone()];
        match self.reasoner.generate(&parts).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!("Failed to capture raw text: {e}");
                String::new()
            }
        }
    }
}

async fn decode(raw: Bytes, media_type: &str) -> Result<PromptPart, ExtractionError> {
    let text = decode_document(raw, media_type).await?;
    Ok(PromptPart::Document {
        media_type: media_essence(media_type),
        text,
    })
}

fn parse_object(reply: &str) -> Result<Map<String, Value>, String> {
    let json = extract_json_object(reply).ok_or_else(|| "no JSON object in reply".to_string())?;
    serde_json::from_str(json).map_err(|e| e.to_string())
}

/// Validates and coerces an extracted CV object.
pub fn structure_cv(value: Value) -> Result<StructuredCv, ExtractionError> {
    if !value.is_object() {
        return Err(ExtractionError::NotAnObject);
    }
    let mut cv: StructuredCv = serde_json::from_value(value)?;

    for exp in &mut cv.experiences {
        normalize_optional_date(&mut exp.start_date);
        normalize_optional_date(&mut exp.end_date);
    }
    for edu in &mut cv.education {
        normalize_optional_date(&mut edu.start_date);
        normalize_optional_date(&mut edu.end_date);
    }
    for cert in &mut cv.certifications {
        normalize_optional_date(&mut cert.date);
    }

    Ok(cv)
}

/// Validates and coerces an extracted (or client-supplied) job object.
pub fn structure_job(value: Value) -> Result<StructuredJob, ExtractionError> {
    let object = value.as_object().ok_or(ExtractionError::NotAnObject)?;
    let has_title = object
        .get("job_title")
        .and_then(lenient::required_text_value)
        .is_some();
    if !has_title {
        return Err(ExtractionError::MissingField("job_title"));
    }
    Ok(serde_json::from_value(value)?)
}

fn normalize_optional_date(date: &mut Option<String>) {
    if let Some(value) = date.as_mut() {
        *value = normalize_date(value);
    }
}
