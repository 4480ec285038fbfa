//! Trait seams between the pipeline and its collaborators.
//!
//! - [`ContentExtractor`]: turn a file of a known kind into raw text
//! - [`Embedder`]: turn text into vectors
//! - [`VectorStore`]: owner-scoped persistence and nearest-neighbour
//!   queries
//! - [`ImageDescriber`] / [`VideoDescriber`] / [`Transcriber`]: media
//!   analysis collaborators
//!
//! All collaborator traits are async and `Send + Sync` so the pipeline
//! can hold them behind `Arc<dyn …>` and swap implementations freely.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{EmbedError, ExtractError, StoreError};
use crate::types::{
    ContentKind, EmbeddedChunk, ExtractedText, ScoredChunk, VideoDescription,
};

// ============================================================================
// Extraction
// ============================================================================

/// One entry in the extraction capability table.
///
/// Each implementation handles exactly one detected [`ContentKind`];
/// the registry in `mnemo-extract` dispatches on that key. New formats
/// register new entries rather than extending a type hierarchy.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// The content kind this extractor handles.
    fn kind(&self) -> ContentKind;

    /// Extract raw text (or pre-parsed turns) from a file.
    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Text embedding collaborator.
///
/// Implementations must be deterministic for identical text and model
/// configuration; retrieval quality silently degrades when query-time
/// and ingest-time models differ.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, recorded in chunk metadata at ingest time.
    fn model_name(&self) -> &str;

    /// Embedding dimension.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one vector per input, same order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a single query string.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_batch(&[query]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbedError::InvalidResponse("empty embedding result".to_string()))
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Owner-scoped vector storage collaborator.
///
/// Every operation is strictly scoped by `owner_id`; one persona's
/// memories are never visible to another's queries. Upserts overwrite
/// entries sharing a chunk id, which is what makes re-ingestion
/// idempotent and interrupted runs resumable.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite chunks for an owner.
    async fn upsert(&self, owner_id: &str, items: &[EmbeddedChunk]) -> Result<(), StoreError>;

    /// Return up to `k` nearest chunks under cosine similarity,
    /// descending score.
    async fn query(
        &self,
        owner_id: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, StoreError>;

    /// Number of chunks stored for an owner.
    async fn count(&self, owner_id: &str) -> Result<u64, StoreError>;

    /// Remove all chunks for an owner; returns how many were removed.
    async fn reset(&self, owner_id: &str) -> Result<u64, StoreError>;
}

// ============================================================================
// Media analysis
// ============================================================================

/// Vision collaborator producing a textual description of an image.
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Describe the image, optionally steered by caller-supplied
    /// context.
    async fn describe(&self, path: &Path, context: Option<&str>)
        -> Result<String, ExtractError>;
}

/// Vision collaborator producing per-frame descriptions of a video,
/// plus a transcript when the audio track is recoverable.
#[async_trait]
pub trait VideoDescriber: Send + Sync {
    async fn describe(
        &self,
        path: &Path,
        context: Option<&str>,
    ) -> Result<VideoDescription, ExtractError>;
}

/// Audio transcription collaborator.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, path: &Path) -> Result<String, ExtractError>;
}
