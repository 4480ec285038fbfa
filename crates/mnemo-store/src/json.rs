//! JSON-file-backed vector store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mnemo_core::{EmbeddedChunk, ScoredChunk, StoreError, VectorStore};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::{cosine_similarity, sort_scored};

/// Persistent vector store, one JSON file per owner.
///
/// The full owner map lives in memory once loaded; files are read
/// lazily on first touch and rewritten after every mutation. Writes go
/// through a temp file in the same directory so a crash mid-write
/// leaves the previous snapshot intact.
pub struct JsonStore {
    data_dir: PathBuf,
    cache: RwLock<HashMap<String, BTreeMap<String, EmbeddedChunk>>>,
}

impl JsonStore {
    /// Open a store rooted at `data_dir`, creating the directory if
    /// needed.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| StoreError::Init(format!("{}: {e}", data_dir.display())))?;
        info!(data_dir = %data_dir.display(), "opened json store");
        Ok(Self {
            data_dir,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn owner_file(&self, owner_id: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", sanitize(owner_id)))
    }

    /// Ensure the owner's chunks are in the cache, loading from disk on
    /// first touch.
    async fn load(&self, owner_id: &str) -> Result<(), StoreError> {
        {
            let cache = self.cache.read().await;
            if cache.contains_key(owner_id) {
                return Ok(());
            }
        }

        let path = self.owner_file(owner_id);
        let entries = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<EmbeddedChunk>>(&bytes)
                .map_err(|e| StoreError::Init(format!("{}: {e}", path.display())))?
                .into_iter()
                .map(|item| (item.chunk.id.clone(), item))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StoreError::Init(format!("{}: {e}", path.display()))),
        };

        let mut cache = self.cache.write().await;
        cache.entry(owner_id.to_string()).or_insert(entries);
        Ok(())
    }

    async fn persist(
        &self,
        owner_id: &str,
        entries: &BTreeMap<String, EmbeddedChunk>,
    ) -> Result<(), StoreError> {
        let path = self.owner_file(owner_id);
        let items: Vec<&EmbeddedChunk> = entries.values().collect();
        let bytes = serde_json::to_vec(&items)
            .map_err(|e| StoreError::Persist(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::Persist(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Persist(format!("{}: {e}", path.display())))?;
        debug!(owner = owner_id, chunks = items.len(), "persisted owner snapshot");
        Ok(())
    }
}

/// Owner ids become file names; anything path-hostile is replaced.
fn sanitize(owner_id: &str) -> String {
    owner_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl VectorStore for JsonStore {
    async fn upsert(&self, owner_id: &str, items: &[EmbeddedChunk]) -> Result<(), StoreError> {
        self.load(owner_id).await?;
        let mut cache = self.cache.write().await;
        let owner = cache.entry(owner_id.to_string()).or_default();
        for item in items {
            owner.insert(item.chunk.id.clone(), item.clone());
        }
        let snapshot = owner.clone();
        drop(cache);
        self.persist(owner_id, &snapshot).await
    }

    async fn query(
        &self,
        owner_id: &str,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, StoreError> {
        self.load(owner_id).await?;
        let cache = self.cache.read().await;
        let Some(owner) = cache.get(owner_id) else {
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
        self.load(owner_id).await?;
        let cache = self.cache.read().await;
        Ok(cache.get(owner_id).map_or(0, |o| o.len() as u64))
    }

    async fn reset(&self, owner_id: &str) -> Result<u64, StoreError> {
        self.load(owner_id).await?;
        let removed = {
            let mut cache = self.cache.write().await;
            cache.remove(owner_id).map_or(0, |o| o.len() as u64)
        };

        let path = self.owner_file(owner_id);
        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::Persist(format!("{}: {e}", path.display()))),
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_core::{MemoryChunk, SourceKind};
    use tempfile::tempdir;

    fn embedded(owner: &str, path: &str, seq: u32, vector: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: MemoryChunk::new(owner, format!("text {seq}"), path, SourceKind::Prose, seq),
            vector,
        }
    }

    #[tokio::test]
    async fn test_roundtrip_survives_reopen() {
        let dir = tempdir().unwrap();

        {
            let store = JsonStore::open(dir.path()).await.unwrap();
            store
                .upsert("alice", &[embedded("alice", "/a.txt", 0, vec![1.0, 0.0])])
                .await
                .unwrap();
        }

        let store = JsonStore::open(dir.path()).await.unwrap();
        assert_eq!(store.count("alice").await.unwrap(), 1);
        let results = store.query("alice", &[1.0, 0.0], 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.owner_id, "alice");
    }

    #[tokio::test]
    async fn test_owner_files_are_separate() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        store
            .upsert("alice", &[embedded("alice", "/a.txt", 0, vec![1.0])])
            .await
            .unwrap();
        store
            .upsert("bob", &[embedded("bob", "/b.txt", 0, vec![1.0])])
            .await
            .unwrap();

        assert!(dir.path().join("alice.json").exists());
        assert!(dir.path().join("bob.json").exists());
    }

    #[tokio::test]
    async fn test_hostile_owner_id_sanitized() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        store
            .upsert("../etc/passwd", &[embedded("x", "/a.txt", 0, vec![1.0])])
            .await
            .unwrap();

        assert!(dir.path().join("___etc_passwd.json").exists());
    }

    #[tokio::test]
    async fn test_reset_removes_file() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        store
            .upsert("alice", &[embedded("alice", "/a.txt", 0, vec![1.0])])
            .await
            .unwrap();

        assert_eq!(store.reset("alice").await.unwrap(), 1);
        assert!(!dir.path().join("alice.json").exists());
        assert_eq!(store.count("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_owner_counts_zero() {
        let dir = tempdir().unwrap();
        let store = JsonStore::open(dir.path()).await.unwrap();
        assert_eq!(store.count("nobody").await.unwrap(), 0);
        assert_eq!(store.reset("nobody").await.unwrap(), 0);
    }
}
