//! Configuration handling for mnemo.
//!
//! Loaded from `~/.config/mnemo/config.toml` (or `--config`); every
//! field has a serde default so a missing or partial file works.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use mnemo_core::SegmentConfig;
use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Override for the data directory holding owner stores
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub segment: SegmentSettings,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub vision: VisionSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from an explicit path, or the default location. A missing
    /// file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match config_dir() {
                Some(dir) => dir.join("config.toml"),
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Resolved data directory for owner stores.
    pub fn resolved_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        data_dir().context("could not determine a data directory")
    }
}

/// Embedding backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible HTTP endpoint
    Http,
    /// Deterministic offline embedder
    #[default]
    Hash,
}

/// Embedding-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub backend: EmbeddingBackend,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Fragments per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Max concurrent embedding requests
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Per-call timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_max_concurrent() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            max_concurrent: default_max_concurrent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Segmentation configuration as stored in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentSettings {
    #[serde(default = "default_target_words")]
    pub target_words: usize,

    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,

    #[serde(default = "default_overlap_turns")]
    pub overlap_turns: usize,

    #[serde(default = "default_boundary_gap_minutes")]
    pub boundary_gap_minutes: i64,
}

fn default_target_words() -> usize {
    500
}

fn default_overlap_words() -> usize {
    50
}

fn default_overlap_turns() -> usize {
    2
}

fn default_boundary_gap_minutes() -> i64 {
    180
}

impl Default for SegmentSettings {
    fn default() -> Self {
        Self {
            target_words: default_target_words(),
            overlap_words: default_overlap_words(),
            overlap_turns: default_overlap_turns(),
            boundary_gap_minutes: default_boundary_gap_minutes(),
        }
    }
}

impl From<&SegmentSettings> for SegmentConfig {
    fn from(settings: &SegmentSettings) -> Self {
        Self {
            target_words: settings.target_words,
            overlap_words: settings.overlap_words,
            overlap_turns: settings.overlap_turns,
            boundary_gap_minutes: settings.boundary_gap_minutes,
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default result count
    #[serde(default = "default_k")]
    pub default_k: usize,
}

fn default_k() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
        }
    }
}

/// Vision backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionSettings {
    /// Call a real vision backend; off means placeholder descriptions
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_vision_model")]
    pub model: String,

    #[serde(default = "default_whisper_model")]
    pub whisper_model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_max_frames")]
    pub max_frames: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_vision_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_max_frames() -> usize {
    5
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            model: default_vision_model(),
            whisper_model: default_whisper_model(),
            max_tokens: default_max_tokens(),
            max_frames: default_max_frames(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// XDG data directory for mnemo.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MNEMO_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }
    ProjectDirs::from("", "", "mnemo").map(|dirs| dirs.data_dir().to_path_buf())
}

/// XDG config directory for mnemo.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MNEMO_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    ProjectDirs::from("", "", "mnemo").map(|dirs| dirs.config_dir().to_path_buf())
}
