//! DOCX text extractor.
//!
//! A `.docx` is a ZIP archive; the document body lives in
//! `word/document.xml`. Paragraph markup is turned into blank lines so
//! the downstream prose segmenter sees real paragraph boundaries, then
//! the remaining tags are stripped.

use std::io::{Cursor, Read};
use std::path::Path;

use async_trait::async_trait;
use mnemo_core::{ContentExtractor, ContentKind, ExtractError, ExtractedText};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;

const DOCUMENT_ENTRY: &str = "word/document.xml";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

/// Extractor for `.docx` files.
pub struct DocxExtractor;

impl DocxExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn parse(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::Parse(format!("not a docx archive: {e}")))?;
        let mut entry = archive
            .by_name(DOCUMENT_ENTRY)
            .map_err(|e| ExtractError::Parse(format!("missing {DOCUMENT_ENTRY}: {e}")))?;
        let mut xml = String::new();
        entry
            .read_to_string(&mut xml)
            .map_err(|e| ExtractError::Parse(format!("document body not utf-8: {e}")))?;

        // Paragraph closes become paragraph breaks before tags go.
        let xml = xml.replace("</w:p>", "\n\n");
        let stripped = TAG_RE.replace_all(&xml, "");
        let text = decode_entities(&stripped);

        let paragraphs: Vec<&str> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        Ok(paragraphs.join("\n\n"))
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for DocxExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::ModernDocument
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let bytes = fs::read(path).await?;
        Ok(ExtractedText::Prose(self.parse(&bytes)?))
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
