//! # mnemo-retrieve
//!
//! Query-time retrieval: embed the query text with the same embedder
//! used at ingestion, ask the store for the owner's nearest fragments,
//! and return them deduplicated in deterministic order.
//!
//! Retrieval never silently degrades: embedding and store failures are
//! hard failures of the query.

use std::collections::HashSet;
use std::sync::Arc;

use mnemo_core::{Error, Result, RetrievalResult, VectorStore};
use mnemo_embed::EmbedderPool;
use tracing::{debug, warn};

/// Owner-scoped similarity retriever.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<EmbedderPool>,
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<EmbedderPool>) -> Self {
        Self { store, embedder }
    }

    /// Retrieve up to `k` fragments for an owner, descending score.
    ///
    /// Ties break on smaller `sequence_index`, then lexical source
    /// path, so identical inputs always return identical output order.
    /// `k = 0` is a caller error; `k` beyond the stored count returns
    /// everything.
    pub async fn retrieve(
        &self,
        owner_id: &str,
        query_text: &str,
        k: usize,
    ) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(Error::Config("k must be positive".to_string()));
        }

        let vector = self.embedder.embed_query(query_text).await?;
        let scored = self.store.query(owner_id, &vector, k).await?;
        debug!(owner = owner_id, k, returned = scored.len(), "retrieval query");

        // The store contract already forbids duplicate ids; dedup here
        // anyway so a misbehaving backend cannot surface one fragment
        // twice.
        let mut seen: HashSet<String> = HashSet::with_capacity(scored.len());
        let mut results: RetrievalResult = Vec::with_capacity(scored.len());
        for item in scored {
            if !seen.insert(item.chunk.id.clone()) {
                continue;
            }
            if let Some(model) = item.chunk.metadata.get("embedding_model") {
                if model != self.embedder.model_name() {
                    warn!(
                        chunk = %item.chunk.id,
                        stored_model = %model,
                        query_model = %self.embedder.model_name(),
                        "chunk embedded under a different model; scores unreliable"
                    );
                }
            }
            results.push(item);
        }
        results.truncate(k);
        Ok(results)
    }
}
