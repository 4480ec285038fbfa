//! Plain text extractor.

use std::path::Path;

use async_trait::async_trait;
use mnemo_core::{ContentExtractor, ContentKind, ExtractError, ExtractedText};
use tokio::fs;

/// Extractor for `.txt` and `.md` files.
///
/// Reads bytes and decodes lossily; personal archives routinely contain
/// the odd invalid byte and dropping a whole diary over one is worse
/// than a replacement character.
pub struct TextExtractor;

impl TextExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for TextExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::PlainText
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let bytes = fs::read(path).await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        Ok(ExtractedText::Prose(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_extract_simple_text() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("note.txt");
        std::fs::write(&file_path, "Hello, world!").unwrap();

        let text = TextExtractor::new().extract(&file_path).await.unwrap();
        assert_eq!(text, ExtractedText::Prose("Hello, world!".to_string()));
    }

    #[tokio::test]
    async fn test_extract_handles_unicode() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("unicode.md");
        let content = "Ciao mondo! Привет мир! こんにちは";
        std::fs::write(&file_path, content).unwrap();

        let text = TextExtractor::new().extract(&file_path).await.unwrap();
        assert_eq!(text, ExtractedText::Prose(content.to_string()));
    }

    #[tokio::test]
    async fn test_extract_invalid_utf8_is_lossy() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("mangled.txt");
        std::fs::write(&file_path, [b'h', b'i', 0xFF, b'!']).unwrap();

        let text = TextExtractor::new().extract(&file_path).await.unwrap();
        match text {
            ExtractedText::Prose(s) => {
                assert!(s.starts_with("hi"));
                assert!(s.contains('\u{FFFD}'));
            }
            ExtractedText::Turns(_) => panic!("expected prose"),
        }
    }

    #[tokio::test]
    async fn test_extract_nonexistent_file_fails() {
        let result = TextExtractor::new()
            .extract(Path::new("/nonexistent/file.txt"))
            .await;
        assert!(matches!(result, Err(ExtractError::Io(_))));
    }
}
