//! Extractor registry keyed by detected content kind.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use mnemo_core::{ContentExtractor, ContentKind, ExtractError, ExtractedText};

use crate::{DocxExtractor, LegacyDocExtractor, PdfExtractor, StructuredExtractor, TextExtractor};

/// Registry of content extractors, one per [`ContentKind`].
///
/// Registering a second extractor for the same kind replaces the first,
/// which is how callers swap in alternatives for testing.
pub struct ExtractorRegistry {
    extractors: HashMap<ContentKind, Arc<dyn ContentExtractor>>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Create a registry with every built-in extractor registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TextExtractor::new());
        registry.register(StructuredExtractor::new());
        registry.register(PdfExtractor::new());
        registry.register(DocxExtractor::new());
        registry.register(LegacyDocExtractor::new());
        registry
    }

    /// Register an extractor under the kind it reports.
    pub fn register<E: ContentExtractor + 'static>(&mut self, extractor: E) {
        self.extractors.insert(extractor.kind(), Arc::new(extractor));
    }

    /// Get the extractor for a content kind.
    #[must_use]
    pub fn get(&self, kind: ContentKind) -> Option<Arc<dyn ContentExtractor>> {
        self.extractors.get(&kind).cloned()
    }

    /// Extract text from a file of a known kind.
    pub async fn extract(
        &self,
        path: &Path,
        kind: ContentKind,
    ) -> Result<ExtractedText, ExtractError> {
        let extractor = self
            .get(kind)
            .ok_or_else(|| ExtractError::UnsupportedKind(format!("{kind:?}")))?;
        extractor.extract(path).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
