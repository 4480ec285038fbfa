//! Error types for mnemo.

use thiserror::Error;

/// Main error type for mnemo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File bytes indicate a different format than the extension claims
    #[error("content mismatch: {0}")]
    ValidationMismatch(String),

    /// Extension outside the supported table, surfaced in single-file mode
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Content extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Segmentation failed
    #[error("segmentation error: {0}")]
    Segmentation(#[from] SegmentError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Content extraction errors.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("unsupported content kind: {0}")]
    UnsupportedKind(String),

    /// No external converter installed for the format (legacy documents)
    #[error("converter unavailable: {0}")]
    ConverterUnavailable(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("collaborator timed out after {0}s")]
    Timeout(u64),

    #[error("extraction failed: {0}")]
    Failed(String),
}

/// Segmentation errors.
#[derive(Error, Debug)]
pub enum SegmentError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("segmentation failed: {0}")]
    Failed(String),
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("provider error: {0}")]
    Provider(String),

    #[error("embedding timed out after {0}s")]
    Timeout(u64),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("batch size mismatch: sent {sent} texts, got {got} vectors")]
    BatchMismatch { sent: usize, got: usize },
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store initialization failed: {0}")]
    Init(String),

    #[error("upsert failed: {0}")]
    Upsert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("persistence failed: {0}")]
    Persist(String),
}

/// Result type alias for mnemo operations.
pub type Result<T> = std::result::Result<T, Error>;
