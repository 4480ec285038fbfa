//! Embedder backed by an OpenAI-compatible `/embeddings` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use mnemo_core::{EmbedError, Embedder};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Configuration for [`HttpEmbedder`].
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// Base URL of an OpenAI-compatible API, without trailing slash.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub dimension: usize,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            timeout_secs: 30,
        }
    }
}

/// Production embedding backend.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: HttpEmbedderConfig,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(config: HttpEmbedderConfig) -> Result<Self, EmbedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbedError::Provider(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.config.model, batch = texts.len(), "embedding batch");

        let body = json!({
            "model": self.config.model,
            "input": texts,
        });
        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbedError::Timeout(self.config.timeout_secs)
                } else {
                    EmbedError::Provider(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(EmbedError::Provider(format!(
                "embedding backend returned {}",
                response.status()
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::InvalidResponse(e.to_string()))?;

        if parsed.data.len() != texts.len() {
            return Err(EmbedError::BatchMismatch {
                sent: texts.len(),
                got: parsed.data.len(),
            });
        }

        // The API documents input order but keys each item by index;
        // trust the index.
        let mut data = parsed.data;
        data.sort_by_key(|item| item.index);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing_reorders_by_index() {
        let raw = r#"{"data": [
            {"index": 1, "embedding": [0.2]},
            {"index": 0, "embedding": [0.1]}
        ]}"#;
        let mut parsed: EmbeddingsResponse = serde_json::from_str(raw).unwrap();
        parsed.data.sort_by_key(|item| item.index);
        assert_eq!(parsed.data[0].embedding, vec![0.1]);
        assert_eq!(parsed.data[1].embedding, vec![0.2]);
    }

    #[tokio::test]
    async fn test_empty_batch_short_circuits() {
        let embedder = HttpEmbedder::new(HttpEmbedderConfig::default()).unwrap();
        let vectors = embedder.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
