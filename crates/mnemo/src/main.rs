//! # mnemo CLI
//!
//! Command-line interface for mnemo, a persona memory engine.
//!
//! ## Commands
//!
//! - `mnemo ingest <OWNER> <PATH>` - Ingest a file or directory of
//!   personal material for a persona
//! - `mnemo query <OWNER> <TEXT>` - Retrieve the persona's most similar
//!   memory fragments
//! - `mnemo stats <OWNER>` - Show stored fragment counts
//! - `mnemo check <PATH>` - Validate a file's content against its
//!   extension without ingesting
//!
//! ## Examples
//!
//! ```bash
//! # Ingest a chat export with tags
//! mnemo ingest alice ~/exports/whatsapp.txt --tags friends,2024
//!
//! # Ingest a photo with a caller description, skipping the vision model
//! mnemo ingest alice ~/photos/lake.jpg --no-vision --description "Birthday dinner at the lake"
//!
//! # Query, JSON output
//! mnemo query alice "what did we do last summer" -k 10 --format json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mnemo_core::{Embedder, IngestionOutcome, VectorStore};
use mnemo_embed::{EmbedderPool, HashEmbedder, HttpEmbedder, HttpEmbedderConfig};
use mnemo_extract::{
    ExtractorRegistry, FfmpegVideoDescriber, OpenAiImageDescriber, PlaceholderImageDescriber,
    PlaceholderVideoDescriber, VisionConfig, WhisperTranscriber,
};
use mnemo_ingest::{IngestOptions, Ingestor};
use mnemo_retrieve::Retriever;
use mnemo_store::JsonStore;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{Config, EmbeddingBackend};

#[derive(Parser)]
#[command(name = "mnemo")]
#[command(about = "Persona memory engine: ingest personal archives, retrieve by similarity")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/mnemo/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a file or directory for a persona
    Ingest {
        /// Persona the material belongs to
        owner: String,

        /// File or directory to ingest
        path: PathBuf,

        /// Comma-separated tags attached to every fragment
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Free-form description; for media it becomes the leading
        /// fragment and steers the vision model
        #[arg(long)]
        description: Option<String>,

        /// Do not call vision/transcription backends
        #[arg(long)]
        no_vision: bool,
    },

    /// Retrieve the most similar memory fragments
    Query {
        /// Persona to query
        owner: String,

        /// Query text
        text: String,

        /// Maximum results (default: retrieval.default_k from config)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Show stored fragment counts for a persona
    Stats {
        /// Persona to inspect
        owner: String,
    },

    /// Validate a file's content against its extension
    Check {
        /// File to check
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct IngestOutput {
    ingested: usize,
    skipped: usize,
    failed: usize,
    chunks: u64,
    entries: Vec<IngestEntry>,
}

#[derive(Serialize)]
struct IngestEntry {
    path: String,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[derive(Serialize)]
struct QueryOutput {
    owner: String,
    query: String,
    results: Vec<QueryItem>,
}

#[derive(Serialize)]
struct QueryItem {
    score: f32,
    source: String,
    kind: String,
    text: String,
}

#[derive(Serialize)]
struct StatsOutput {
    owner: String,
    chunks: u64,
    data_dir: String,
}

#[derive(Serialize)]
struct CheckOutput {
    path: String,
    claimed: String,
    detected: String,
    verdict: String,
    detail: String,
}

/// Assemble the embedder configured for this run.
fn build_embedder(config: &Config) -> Result<Arc<EmbedderPool>> {
    let embedding = &config.embedding;
    let embedder: Arc<dyn Embedder> = match embedding.backend {
        EmbeddingBackend::Hash => Arc::new(HashEmbedder::new(embedding.dimension)),
        EmbeddingBackend::Http => {
            let api_key = std::env::var(&embedding.api_key_env).unwrap_or_default();
            Arc::new(HttpEmbedder::new(HttpEmbedderConfig {
                base_url: embedding.base_url.clone(),
                api_key,
                model: embedding.model.clone(),
                dimension: embedding.dimension,
                timeout_secs: embedding.timeout_secs,
            })?)
        }
    };
    Ok(Arc::new(EmbedderPool::new(
        embedder,
        embedding.max_concurrent,
    )))
}

/// Assemble the full ingestion stack.
async fn build_ingestor(config: &Config) -> Result<Ingestor> {
    let data_dir = config.resolved_data_dir()?;
    let store = Arc::new(JsonStore::open(data_dir.join("owners")).await?);
    let embedder = build_embedder(config)?;

    let vision = &config.vision;
    let (image, video): (
        Arc<dyn mnemo_core::ImageDescriber>,
        Arc<dyn mnemo_core::VideoDescriber>,
    ) = if vision.enabled {
        let api_key = std::env::var(&vision.api_key_env).unwrap_or_default();
        let image = Arc::new(OpenAiImageDescriber::new(VisionConfig {
            base_url: vision.base_url.clone(),
            api_key: api_key.clone(),
            model: vision.model.clone(),
            max_tokens: vision.max_tokens,
            timeout_secs: vision.timeout_secs,
        })?);
        let transcriber = Arc::new(WhisperTranscriber::new(
            vision.base_url.clone(),
            api_key,
            vision.whisper_model.clone(),
            vision.timeout_secs,
        )?);
        let video = Arc::new(FfmpegVideoDescriber::new(
            image.clone(),
            Some(transcriber),
            vision.max_frames,
        ));
        (image, video)
    } else {
        (
            Arc::new(PlaceholderImageDescriber),
            Arc::new(PlaceholderVideoDescriber),
        )
    };

    Ok(Ingestor::new(
        ExtractorRegistry::with_defaults(),
        embedder,
        store,
        image,
        video,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let default_level = if cli.verbose {
        "debug"
    } else {
        &config.logging.level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Ingest {
            owner,
            path,
            tags,
            description,
            no_vision,
        } => {
            if !path.exists() {
                bail!("path does not exist: {}", path.display());
            }
            if no_vision && description.is_none() && is_media_file(&path) {
                bail!("--no-vision on a media file requires --description");
            }

            let ingestor = build_ingestor(&config).await?;
            let mut opts = IngestOptions::new(&owner);
            opts.tags = tags;
            opts.description = description;
            opts.use_vision = !no_vision && config.vision.enabled;
            opts.segment = (&config.segment).into();
            opts.batch_size = config.embedding.batch_size;
            opts.call_timeout_secs = config.embedding.timeout_secs;

            info!(owner = %owner, path = %path.display(), "starting ingestion");
            let report = ingestor
                .ingest(&path, &opts)
                .await
                .with_context(|| format!("ingesting {}", path.display()))?;

            let output = IngestOutput {
                ingested: report.ingested_files(),
                skipped: report.skipped_files(),
                failed: report.failed_files(),
                chunks: report.total_chunks(),
                entries: report
                    .entries
                    .iter()
                    .map(|e| {
                        let (outcome, detail) = match &e.outcome {
                            IngestionOutcome::Ingested { chunks } => {
                                ("ingested".to_string(), Some(format!("{chunks} chunks")))
                            }
                            IngestionOutcome::Skipped { reason } => {
                                ("skipped".to_string(), Some(reason.clone()))
                            }
                            IngestionOutcome::Failed { error } => {
                                ("failed".to_string(), Some(error.clone()))
                            }
                        };
                        IngestEntry {
                            path: e.path.display().to_string(),
                            outcome,
                            detail,
                        }
                    })
                    .collect(),
            };

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                OutputFormat::Text => {
                    for entry in &output.entries {
                        let detail = entry.detail.as_deref().unwrap_or("");
                        println!("{:10} {}  {}", entry.outcome, entry.path, detail);
                    }
                    println!(
                        "\n{} ingested, {} skipped, {} failed, {} fragments stored",
                        output.ingested, output.skipped, output.failed, output.chunks
                    );
                }
            }
        }

        Commands::Query { owner, text, k } => {
            let data_dir = config.resolved_data_dir()?;
            let store = Arc::new(JsonStore::open(data_dir.join("owners")).await?);
            let embedder = build_embedder(&config)?;
            let retriever = Retriever::new(store, embedder);

            let k = k.unwrap_or(config.retrieval.default_k);
            let results = retriever
                .retrieve(&owner, &text, k)
                .await
                .context("retrieval failed")?;

            let output = QueryOutput {
                owner,
                query: text,
                results: results
                    .iter()
                    .map(|r| QueryItem {
                        score: r.score,
                        source: r.chunk.source_path.display().to_string(),
                        kind: r.chunk.source_kind.to_string(),
                        text: r.chunk.text.clone(),
                    })
                    .collect(),
            };

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                OutputFormat::Text => {
                    if output.results.is_empty() {
                        println!("no memories found");
                    }
                    for (i, item) in output.results.iter().enumerate() {
                        println!(
                            "{}. [{:.3}] {} ({})",
                            i + 1,
                            item.score,
                            item.source,
                            item.kind
                        );
                        println!("   {}\n", item.text.replace('\n', "\n   "));
                    }
                }
            }
        }

        Commands::Stats { owner } => {
            let config_data_dir = config.resolved_data_dir()?;
            let store = JsonStore::open(config_data_dir.join("owners")).await?;
            let chunks = store.count(&owner).await?;

            let output = StatsOutput {
                owner,
                chunks,
                data_dir: config_data_dir.display().to_string(),
            };
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                OutputFormat::Text => {
                    println!("owner:    {}", output.owner);
                    println!("chunks:   {}", output.chunks);
                    println!("data dir: {}", output.data_dir);
                }
            }
        }

        Commands::Check { path } => {
            if !path.exists() {
                bail!("path does not exist: {}", path.display());
            }
            let verdict = mnemo_validate::classify(&path);
            let output = CheckOutput {
                path: path.display().to_string(),
                claimed: verdict.claimed.to_string(),
                detected: verdict.detected.to_string(),
                verdict: format!("{:?}", verdict.verdict).to_lowercase(),
                detail: verdict.detail,
            };
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
                OutputFormat::Text => {
                    println!("claimed:  {}", output.claimed);
                    println!("detected: {}", output.detected);
                    println!("verdict:  {} ({})", output.verdict, output.detail);
                }
            }
            if output.verdict == "mismatch" {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn is_media_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .and_then(|ext| mnemo_validate::expected_kind(&ext))
        .is_some_and(mnemo_core::ContentKind::is_media)
}
