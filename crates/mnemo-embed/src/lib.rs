//! # mnemo-embed
//!
//! Embedding backends for the mnemo pipeline.
//!
//! - [`HttpEmbedder`]: OpenAI-compatible `/embeddings` endpoint, the
//!   production backend
//! - [`HashEmbedder`]: deterministic offline backend for tests and
//!   air-gapped runs
//! - [`EmbedderPool`]: concurrency cap around any [`Embedder`]
//!
//! [`Embedder`]: mnemo_core::Embedder

pub mod hash;
pub mod http;
pub mod pool;

pub use hash::HashEmbedder;
pub use http::{HttpEmbedder, HttpEmbedderConfig};
pub use pool::EmbedderPool;
