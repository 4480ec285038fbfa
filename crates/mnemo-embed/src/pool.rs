//! Concurrency cap around an embedder.

use std::sync::Arc;

use mnemo_core::{EmbedError, Embedder};
use tokio::sync::Semaphore;

/// Wraps an [`Embedder`] with a semaphore limiting concurrent calls.
///
/// Ingestion fires batches concurrently; the pool keeps the number of
/// in-flight provider requests bounded.
pub struct EmbedderPool {
    embedder: Arc<dyn Embedder>,
    semaphore: Semaphore,
    max_concurrent: usize,
}

impl EmbedderPool {
    pub fn new(embedder: Arc<dyn Embedder>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            embedder,
            semaphore: Semaphore::new(max_concurrent),
            max_concurrent,
        }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| EmbedError::Provider(format!("semaphore closed: {e}")))?;
        self.embedder.embed_batch(texts).await
    }

    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| EmbedError::Provider(format!("semaphore closed: {e}")))?;
        self.embedder.embed_query(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HashEmbedder;

    #[tokio::test]
    async fn test_pool_delegates_to_embedder() {
        let pool = EmbedderPool::new(Arc::new(HashEmbedder::new(32)), 4);
        assert_eq!(pool.model_name(), "hash-blake3");
        assert_eq!(pool.dimension(), 32);

        let vectors = pool.embed_batch(&["hello"]).await.unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].len(), 32);
    }

    #[tokio::test]
    async fn test_zero_concurrency_clamped() {
        let pool = EmbedderPool::new(Arc::new(HashEmbedder::new(8)), 0);
        assert_eq!(pool.max_concurrent(), 1);
        // Still usable.
        assert!(pool.embed_query("x").await.is_ok());
    }
}
