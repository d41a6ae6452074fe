//! Document text extraction.
//!
//! The pipeline only depends on the `TextExtractor` trait. `PdfTextExtractor` is the
//! production implementation backed by `pdf-extract`.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document could not be read: {0}")]
    Unreadable(String),

    #[error("document contains no extractable text")]
    Empty,
}

/// Converts an uploaded document into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: Bytes) -> Result<String, ExtractionError>;
}

/// Rejects whitespace-only output so callers never analyze an empty document.
pub fn ensure_text(text: String) -> Result<String, ExtractionError> {
    if text.trim().is_empty() {
        Err(ExtractionError::Empty)
    } else {
        Ok(text)
    }
}

/// PDF text extraction via `pdf-extract`.
///
/// Parsing is CPU-bound and runs on the blocking pool. `pdf-extract` can panic on
/// malformed input; a panic is reported as `ExtractionError::Unreadable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, document: Bytes) -> Result<String, ExtractionError> {
        if document.is_empty() {
            return Err(ExtractionError::Unreadable("document is empty".to_string()));
        }

        let size = document.len();
        let joined =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&document))
                .await;

        let text = match joined {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("PDF text extraction failed: {e}");
                return Err(ExtractionError::Unreadable(e.to_string()));
            }
            Err(e) => {
                warn!("PDF text extraction aborted: {e}");
                return Err(ExtractionError::Unreadable(
                    "PDF parser aborted on malformed input".to_string(),
                ));
            }
        };

        debug!("Extracted {} chars from {} byte PDF", text.len(), size);
        ensure_text(text)
    }
}
