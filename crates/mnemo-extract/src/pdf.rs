//! PDF text extractor.

use std::path::Path;

use async_trait::async_trait;
use mnemo_core::{ContentExtractor, ContentKind, ExtractError, ExtractedText};
use tokio::fs;
use tracing::debug;

/// Extractor for `.pdf` files, built on `pdf-extract`.
///
/// Parsing runs on the blocking pool; `pdf-extract` is CPU-bound and
/// synchronous.
pub struct PdfExtractor;

impl PdfExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for PdfExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::Pdf
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let bytes = fs::read(path).await?;
        debug!(path = %path.display(), size = bytes.len(), "extracting pdf text");

        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ExtractError::Failed(format!("pdf task panicked: {e}")))?
        .map_err(ExtractError::Parse)?;

        Ok(ExtractedText::Prose(text))
    }
}
