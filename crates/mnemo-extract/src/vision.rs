//! Vision describers for images.
//!
//! The production implementation calls an OpenAI-compatible chat
//! completions endpoint with the image inlined as a base64 data URL.
//! [`PlaceholderImageDescriber`] stands in when no vision backend is
//! configured and in tests.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use mnemo_core::{ExtractError, ImageDescriber};
use serde::Deserialize;
use serde_json::json;
use tokio::fs;
use tracing::debug;

const DESCRIBE_PROMPT: &str = "Describe this image in detail for a personal memory system. \
     Include people, setting, activities, emotions, and any notable objects.";

/// Configuration for the vision backend.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Base URL of an OpenAI-compatible API, without trailing slash.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 500,
            timeout_secs: 60,
        }
    }
}

/// Image describer backed by an OpenAI-compatible vision model.
pub struct OpenAiImageDescriber {
    client: reqwest::Client,
    config: VisionConfig,
}

impl OpenAiImageDescriber {
    pub fn new(config: VisionConfig) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractError::Failed(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }
}

fn media_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl ImageDescriber for OpenAiImageDescriber {
    async fn describe(
        &self,
        path: &Path,
        context: Option<&str>,
    ) -> Result<String, ExtractError> {
        let bytes = fs::read(path).await?;
        let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let data_url = format!("data:{};base64,{b64}", media_type(path));

        let prompt = match context {
            Some(ctx) if !ctx.is_empty() => format!("{DESCRIBE_PROMPT} Context: {ctx}"),
            _ => DESCRIBE_PROMPT.to_string(),
        };

        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }]
        });

        debug!(path = %path.display(), model = %self.config.model, "describing image");
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractError::Timeout(self.config.timeout_secs)
                } else {
                    ExtractError::Failed(format!("vision request: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(ExtractError::Failed(format!(
                "vision backend returned {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Parse(format!("vision response: {e}")))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ExtractError::Parse("vision response had no choices".to_string()))
    }
}

/// No-op describer returning a fixed marker string.
pub struct PlaceholderImageDescriber;

#[async_trait]
impl ImageDescriber for PlaceholderImageDescriber {
    async fn describe(
        &self,
        path: &Path,
        _context: Option<&str>,
    ) -> Result<String, ExtractError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image");
        Ok(format!("[image: {name}]"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_mapping() {
        assert_eq!(media_type(Path::new("a.png")), "image/png");
        assert_eq!(media_type(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(media_type(Path::new("a.webp")), "image/webp");
        assert_eq!(media_type(Path::new("a")), "image/jpeg");
    }

    #[tokio::test]
    async fn test_placeholder_describer_names_the_file() {
        let description = PlaceholderImageDescriber
            .describe(Path::new("/photos/beach.jpg"), None)
            .await
            .unwrap();
        assert_eq!(description, "[image: beach.jpg]");
    }
}
