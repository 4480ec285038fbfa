//! # mnemo-core
//!
//! Core types and traits for mnemo, a persona memory engine.
//!
//! Mnemo turns heterogeneous personal-history material (chat exports,
//! prose documents, structured logs, media-derived text) into a
//! queryable memory index per persona, then ranks stored fragments
//! against live queries.
//!
//! This crate provides the foundational abstractions shared by the
//! pipeline crates:
//!
//! - **Content validation**: [`ContentVerdict`] produced by magic-byte
//!   inspection (implemented in `mnemo-validate`)
//! - **Extraction**: [`ContentExtractor`] trait, one impl per binary
//!   family
//! - **Segmentation**: [`MemoryChunk`] fragments with deterministic ids
//! - **Embedding**: [`Embedder`] trait for text-to-vector collaborators
//! - **Storage & retrieval**: [`VectorStore`] trait, owner-scoped
//!
//! ## Pipeline
//!
//! ```text
//! File -> validate -> extract -> classify + segment -> embed -> store
//!                                                                |
//!                                            query text -> embed -+-> ranked chunks
//! ```

pub mod error;
pub mod traits;
pub mod types;

pub use error::{EmbedError, Error, ExtractError, Result, SegmentError, StoreError};
pub use traits::*;
pub use types::*;
