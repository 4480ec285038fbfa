//! # mnemo-ingest
//!
//! The ingestion orchestrator: walks a file or directory, validates
//! content against its claimed extension, extracts text, segments it,
//! embeds the fragments, and upserts them into the vector store under
//! a single owner.
//!
//! Directory runs recover at file granularity; one corrupt file becomes
//! a `Failed` or `Skipped` entry in the [`RunReport`](mnemo_core::RunReport)
//! while the rest of the run continues. Re-running over unchanged
//! sources overwrites the same chunk ids, so ingestion is idempotent
//! and interrupted runs are resumable.

pub mod ingestor;

pub use ingestor::{IngestOptions, IngestUpdate, Ingestor};
