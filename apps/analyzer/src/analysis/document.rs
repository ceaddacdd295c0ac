//! Turns uploaded bytes into text the reasoning engine can read.

use bytes::Bytes;
use tracing::debug;

use crate::analysis::extractor::ExtractionError;

pub const PDF: &str = "application/pdf";

/// Decodes raw document bytes according to their declared media type.
/// PDF text extraction is CPU-bound and runs on the blocking pool.
pub async fn decode_document(raw: Bytes, media_type: &str) -> Result<String, ExtractionError> {
    let essence = media_essence(media_type);

    let text = if essence == PDF {
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&raw))
            .await
            .map_err(|e| ExtractionError::UnreadableDocument(format!("PDF worker failed: {e}")))?
            .map_err(|e| ExtractionError::UnreadableDocument(format!("invalid PDF: {e}")))?
    } else if essence.starts_with("text/") {
        String::from_utf8_lossy(&raw).into_owned()
    } else {
        return Err(ExtractionError::UnsupportedMediaType(media_type.to_string()));
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::UnreadableDocument(
            "document contains no text".to_string(),
        ));
    }

    debug!("Decoded {} document: {} chars", essence, text.len());
    Ok(text)
}

/// `"text/plain; charset=utf-8"` → `"text/plain"`.
pub fn media_essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}
