//! In-process vector store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use mnemo_core::{EmbeddedChunk, ScoredChunk, StoreError, VectorStore};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{cosine_similarity, sort_scored};

/// Vector store holding everything in memory.
///
/// Entries are keyed owner first, then chunk id in a `BTreeMap` so
/// iteration order, and with it tie-breaking input order, is stable
/// across runs.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, BTreeMap<String, EmbeddedChunk>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert(&self, owner_id: &str, items: &[EmbeddedChunk]) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let owner = entries.entry(owner_id.to_string()).or_default();
        for item in items {
            owner.insert(item.chunk.id.clone(), item.clone());
        }
        debug!(owner = owner_id, upserted = items.len(), total = owner.len(), "upsert");
        Ok(())
    }

    async fn query(
        &self,
        owner_id: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        let entries = self.entries.read().await;
        let Some(owner) = entries.get(owner_id) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<ScoredChunk> = owner
            .values()
            .map(|item| ScoredChunk {
                chunk: item.chunk.clone(),
                score: cosine_similarity(vector, &item.vector),
            })
            .collect();
        sort_scored(&mut results);
        results.truncate(k);
        Ok(results)
    }

    async fn count(&self, owner_id: &str) -> Result<u64, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(owner_id).map_or(0, |o| o.len() as u64))
    }

    async fn reset(&self, owner_id: &str) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(owner_id).map_or(0, |o| o.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::{MemoryChunk, SourceKind};

    fn embedded(owner: &str, path: &str, seq: u32, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: MemoryChunk::new(owner, format!("text {seq}"), path, SourceKind::Prose, seq),
            vector,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_count() {
        let store = MemoryStore::new();
        store
            .upsert("alice", &[embedded("alice", "/a.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(store.count("alice").await.unwrap(), 1);
        assert_eq!(store.count("bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_same_id_overwrites() {
        let store = MemoryStore::new();
        let first = embedded("alice", "/a.txt", 0, vec![1.0, 0.0]);
        let mut second = embedded("alice", "/a.txt", 0, vec![0.0, 1.0]);
        second.chunk.text = "rewritten".to_string();

        store.upsert("alice", &[first]).await.unwrap();
        store.upsert("alice", &[second]).await.unwrap();

        assert_eq!(store.count("alice").await.unwrap(), 1);
        let results = store.query("alice", &[0.0, 1.0], 1).await.unwrap();
        assert_eq!(results[0].chunk.text, "rewritten");
    }

    #[tokio::test]
    async fn test_query_descending_score() {
        let store = MemoryStore::new();
        store
            .upsert(
                "alice",
                &[
                    embedded("alice", "/far.txt", 0, vec![0.0, 1.0]),
                    embedded("alice", "/near.txt", 0, vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let results = store.query("alice", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.source_path.to_str(), Some("/near.txt"));
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_query_tie_break_by_sequence_then_path() {
        let store = MemoryStore::new();
        // Identical vectors so every score ties.
        store
            .upsert(
                "alice",
                &[
                    embedded("alice", "/b.txt", 1, vec![1.0, 0.0]),
                    embedded("alice", "/b.txt", 0, vec![1.0, 0.0]),
                    embedded("alice", "/a.txt", 1, vec![1.0, 0.0]),
                ],
            )
            .await
            .unwrap();

        let results = store.query("alice", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results[0].chunk.sequence_index, 0);
        assert_eq!(results[1].chunk.source_path.to_str(), Some("/a.txt"));
        assert_eq!(results[2].chunk.source_path.to_str(), Some("/b.txt"));
    }

    #[tokio::test]
    async fn test_query_k_larger_than_population() {
        let store = MemoryStore::new();
        store
            .upsert("alice", &[embedded("alice", "/a.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        let results = store.query("alice", &[1.0, 0.0], 1000).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_owners_are_isolated() {
        let store = MemoryStore::new();
        store
            .upsert("alice", &[embedded("alice", "/a.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert("bob", &[embedded("bob", "/b.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();

        let results = store.query("alice", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.owner_id, "alice");
    }

    #[tokio::test]
    async fn test_reset_only_touches_one_owner() {
        let store = MemoryStore::new();
        store
            .upsert("alice", &[embedded("alice", "/a.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert("bob", &[embedded("bob", "/b.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(store.reset("alice").await.unwrap(), 1);
        assert_eq!(store.count("alice").await.unwrap(), 0);
        assert_eq!(store.count("bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_query_unknown_owner_is_empty() {
        let store = MemoryStore::new();
        let results = store.query("nobody", &[1.0], 5).await.unwrap();
        assert!(results.is_empty());
    }
}
