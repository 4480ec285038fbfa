//! Legacy `.doc` extractor backed by the external `antiword` converter.

use std::path::Path;

use async_trait::async_trait;
use mnemo_core::{ContentExtractor, ContentKind, ExtractError, ExtractedText};
use tokio::process::Command;
use tracing::debug;

const CONVERTER: &str = "antiword";

/// Extractor for pre-2007 Word documents.
///
/// The OLE2 container format is not worth parsing in-process; `antiword`
/// has handled it for decades. When the binary is not installed the
/// extractor reports [`ExtractError::ConverterUnavailable`] and the
/// pipeline records the file as failed.
pub struct LegacyDocExtractor;

impl LegacyDocExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LegacyDocExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for LegacyDocExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::LegacyDocument
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let converter = which::which(CONVERTER)
            .map_err(|_| ExtractError::ConverterUnavailable(CONVERTER.to_string()))?;
        debug!(converter = %converter.display(), path = %path.display(), "converting legacy document");

        let output = Command::new(converter).arg(path).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Failed(format!(
                "{CONVERTER} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(ExtractedText::Prose(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_legacy_document() {
        assert_eq!(
            LegacyDocExtractor::new().kind(),
            ContentKind::LegacyDocument
        );
    }

    #[tokio::test]
    async fn test_missing_converter_or_bad_input_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("old.doc");
        std::fs::write(&file_path, b"not really a doc").unwrap();

        // Without antiword installed this is ConverterUnavailable; with
        // it installed the garbage input makes the converter fail.
        let result = LegacyDocExtractor::new().extract(&file_path).await;
        assert!(result.is_err());
    }
}
