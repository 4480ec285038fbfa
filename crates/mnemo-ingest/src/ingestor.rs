//! File-to-store ingestion pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use mnemo_core::{
    ContentKind, EmbeddedChunk, Error, ExtractError, ExtractedText, IngestionOutcome,
    MemoryChunk, Result, RunReport, SegmentConfig, SourceKind, VectorStore, Verdict,
};
use mnemo_embed::EmbedderPool;
use mnemo_extract::ExtractorRegistry;
use mnemo_segment::{classify_text, parse_chat_lines, segment_chat, segment_prose, TextShape};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Ingestion progress events, emitted in traversal order.
#[derive(Debug, Clone)]
pub enum IngestUpdate {
    FileStarted { path: PathBuf },
    FileIngested { path: PathBuf, chunks: u32 },
    FileSkipped { path: PathBuf, reason: String },
    FileFailed { path: PathBuf, error: String },
}

/// Per-run ingestion options.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Persona the ingested memories belong to.
    pub owner_id: String,
    /// Caller tags, attached verbatim to every fragment.
    pub tags: Vec<String>,
    /// Free-form description; for media files it is also stored as the
    /// leading fragment and passed to the vision collaborator.
    pub description: Option<String>,
    /// Route media through the vision collaborators. When off, a media
    /// file without a description cannot produce any text and fails.
    pub use_vision: bool,
    pub segment: SegmentConfig,
    /// Fragments per embedding request.
    pub batch_size: usize,
    /// Timeout applied to every external call, in seconds.
    pub call_timeout_secs: u64,
}

impl IngestOptions {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            tags: Vec::new(),
            description: None,
            use_vision: true,
            segment: SegmentConfig::default(),
            batch_size: 32,
            call_timeout_secs: 60,
        }
    }
}

/// The ingestion pipeline. One instance serves many runs.
pub struct Ingestor {
    extractors: ExtractorRegistry,
    embedder: Arc<EmbedderPool>,
    store: Arc<dyn VectorStore>,
    image: Arc<dyn mnemo_core::ImageDescriber>,
    video: Arc<dyn mnemo_core::VideoDescriber>,
    update_tx: broadcast::Sender<IngestUpdate>,
}

impl Ingestor {
    pub fn new(
        extractors: ExtractorRegistry,
        embedder: Arc<EmbedderPool>,
        store: Arc<dyn VectorStore>,
        image: Arc<dyn mnemo_core::ImageDescriber>,
        video: Arc<dyn mnemo_core::VideoDescriber>,
    ) -> Self {
        let (update_tx, _) = broadcast::channel(256);
        Self {
            extractors,
            embedder,
            store,
            image,
            video,
            update_tx,
        }
    }

    /// Subscribe to per-file progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<IngestUpdate> {
        self.update_tx.subscribe()
    }

    /// Ingest a file or directory for one owner.
    ///
    /// Directory mode walks recursively in sorted order, silently
    /// skipping unsupported extensions and recovering from per-file
    /// failures. Single-file mode fails loud on an unsupported
    /// extension or a content mismatch.
    pub async fn ingest(&self, target: &Path, opts: &IngestOptions) -> Result<RunReport> {
        if target.is_dir() {
            self.ingest_directory(target, opts).await
        } else {
            self.ingest_single(target, opts).await
        }
    }

    async fn ingest_directory(&self, dir: &Path, opts: &IngestOptions) -> Result<RunReport> {
        info!(dir = %dir.display(), owner = %opts.owner_id, "ingesting directory");
        let mut report = RunReport::default();

        let mut walker = WalkDir::new(dir).sort_by_file_name().into_iter();
        loop {
            let entry = match walker.next() {
                None => break,
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    warn!(error = %e, "walk error, skipping entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !extension_of(path)
                .is_some_and(|ext| mnemo_validate::is_supported_extension(&ext))
            {
                debug!(path = %path.display(), "unsupported extension, skipping");
                continue;
            }

            let outcome = self.process_file(path, opts).await;
            self.emit(path, &outcome);
            report.push(path, outcome);
        }

        info!(
            ingested = report.ingested_files(),
            skipped = report.skipped_files(),
            failed = report.failed_files(),
            chunks = report.total_chunks(),
            "directory run complete"
        );
        Ok(report)
    }

    async fn ingest_single(&self, path: &Path, opts: &IngestOptions) -> Result<RunReport> {
        let ext = extension_of(path)
            .filter(|e| mnemo_validate::is_supported_extension(e))
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;

        let verdict = mnemo_validate::classify(path);
        if verdict.is_mismatch() {
            return Err(Error::ValidationMismatch(verdict.detail));
        }
        debug!(path = %path.display(), ext = %ext, "single file validated");

        let outcome = self.process_file(path, opts).await;
        self.emit(path, &outcome);
        let mut report = RunReport::default();
        report.push(path, outcome);
        Ok(report)
    }

    fn emit(&self, path: &Path, outcome: &IngestionOutcome) {
        let update = match outcome {
            IngestionOutcome::Ingested { chunks } => IngestUpdate::FileIngested {
                path: path.to_path_buf(),
                chunks: *chunks,
            },
            IngestionOutcome::Skipped { reason } => IngestUpdate::FileSkipped {
                path: path.to_path_buf(),
                reason: reason.clone(),
            },
            IngestionOutcome::Failed { error } => IngestUpdate::FileFailed {
                path: path.to_path_buf(),
                error: error.clone(),
            },
        };
        // No subscribers is fine.
        let _ = self.update_tx.send(update);
    }

    /// Run one file through the full pipeline. Never returns an error;
    /// everything becomes an outcome so directory runs keep going.
    async fn process_file(&self, path: &Path, opts: &IngestOptions) -> IngestionOutcome {
        let _ = self.update_tx.send(IngestUpdate::FileStarted {
            path: path.to_path_buf(),
        });

        let verdict = mnemo_validate::classify(path);
        match verdict.verdict {
            Verdict::Mismatch => {
                return IngestionOutcome::Skipped {
                    reason: verdict.detail,
                }
            }
            Verdict::Unknown => {
                // Content could not be read or recognized; extraction
                // decides whether anything is salvageable.
                debug!(path = %path.display(), detail = %verdict.detail, "verdict unknown");
            }
            Verdict::Match => {}
        }

        let fragments = if verdict.claimed.is_media() {
            match self.media_fragments(path, verdict.claimed, opts).await {
                Ok(fragments) => fragments,
                Err(outcome) => return outcome,
            }
        } else {
            match self.text_fragments(path, verdict.claimed, opts).await {
                Ok(fragments) => fragments,
                Err(outcome) => return outcome,
            }
        };

        if fragments.is_empty() {
            return IngestionOutcome::Skipped {
                reason: "no extractable text".to_string(),
            };
        }

        match self.embed_and_store(path, &fragments, opts).await {
            Ok(count) => IngestionOutcome::Ingested { chunks: count },
            Err(e) => IngestionOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Extract and segment a text-family file into (text, kind) pairs.
    async fn text_fragments(
        &self,
        path: &Path,
        kind: ContentKind,
        opts: &IngestOptions,
    ) -> std::result::Result<Vec<(String, SourceKind)>, IngestionOutcome> {
        let duration = Duration::from_secs(opts.call_timeout_secs);
        let extracted = match timeout(duration, self.extractors.extract(path, kind)).await {
            Ok(Ok(extracted)) => extracted,
            // A missing external converter is an extraction failure like
            // any other; only validation mismatches and empty extraction
            // are skips.
            Ok(Err(e)) => {
                return Err(IngestionOutcome::Failed {
                    error: e.to_string(),
                })
            }
            Err(_) => {
                return Err(IngestionOutcome::Failed {
                    error: ExtractError::Timeout(opts.call_timeout_secs).to_string(),
                })
            }
        };

        if extracted.is_empty() {
            return Ok(Vec::new());
        }

        Ok(match extracted {
            ExtractedText::Turns(turns) => {
                let items: Vec<mnemo_segment::ChatItem> = turns
                    .into_iter()
                    .map(mnemo_segment::ChatItem::Turn)
                    .collect();
                segment_chat(&items, &opts.segment)
                    .into_iter()
                    .map(|f| (f, SourceKind::Chat))
                    .collect()
            }
            ExtractedText::Prose(raw) => {
                let classification = classify_text(&raw);
                match classification.shape {
                    TextShape::Chat => {
                        debug!(
                            path = %path.display(),
                            matched = classification.evidence.matched_lines,
                            total = classification.evidence.total_lines,
                            "detected chat log"
                        );
                        let items = parse_chat_lines(&raw);
                        segment_chat(&items, &opts.segment)
                            .into_iter()
                            .map(|f| (f, SourceKind::Chat))
                            .collect()
                    }
                    TextShape::Prose => {
                        let source_kind = if kind == ContentKind::Structured {
                            SourceKind::Structured
                        } else {
                            SourceKind::Prose
                        };
                        segment_prose(&raw, &opts.segment)
                            .into_iter()
                            .map(|f| (f, source_kind))
                            .collect()
                    }
                }
            }
        })
    }

    /// Produce fragments for an image or video via the collaborators.
    ///
    /// A caller-supplied description is stored verbatim as the leading
    /// fragment and also steers the vision model.
    async fn media_fragments(
        &self,
        path: &Path,
        kind: ContentKind,
        opts: &IngestOptions,
    ) -> std::result::Result<Vec<(String, SourceKind)>, IngestionOutcome> {
        let media_kind = match kind {
            ContentKind::Image => SourceKind::MediaImage,
            ContentKind::Video => SourceKind::MediaVideo,
            _ => SourceKind::MediaAudioTranscript,
        };

        let mut fragments: Vec<(String, SourceKind)> = Vec::new();
        if let Some(description) = opts.description.as_deref() {
            if !description.trim().is_empty() {
                fragments.push((description.to_string(), media_kind));
            }
        }

        if !opts.use_vision {
            if fragments.is_empty() {
                return Err(IngestionOutcome::Failed {
                    error: "vision disabled and no description provided".to_string(),
                });
            }
            return Ok(fragments);
        }

        let duration = Duration::from_secs(opts.call_timeout_secs);
        let context = opts.description.as_deref();
        match kind {
            ContentKind::Image => {
                let described = timeout(duration, self.image.describe(path, context)).await;
                match described {
                    Ok(Ok(text)) => {
                        for fragment in segment_prose(&text, &opts.segment) {
                            fragments.push((fragment, SourceKind::MediaImage));
                        }
                    }
                    Ok(Err(e)) => {
                        return Err(IngestionOutcome::Failed {
                            error: e.to_string(),
                        })
                    }
                    Err(_) => {
                        return Err(IngestionOutcome::Failed {
                            error: ExtractError::Timeout(opts.call_timeout_secs).to_string(),
                        })
                    }
                }
            }
            ContentKind::Video => {
                let described = timeout(duration, self.video.describe(path, context)).await;
                match described {
                    Ok(Ok(description)) => {
                        let frames = description.frame_descriptions.join("\n\n");
                        for fragment in segment_prose(&frames, &opts.segment) {
                            fragments.push((fragment, SourceKind::MediaVideo));
                        }
                        if let Some(transcript) = description.transcript {
                            for fragment in segment_prose(&transcript, &opts.segment) {
                                fragments.push((fragment, SourceKind::MediaAudioTranscript));
                            }
                        }
                    }
                    Ok(Err(e)) => {
                        return Err(IngestionOutcome::Failed {
                            error: e.to_string(),
                        })
                    }
                    Err(_) => {
                        return Err(IngestionOutcome::Failed {
                            error: ExtractError::Timeout(opts.call_timeout_secs).to_string(),
                        })
                    }
                }
            }
            _ => {
                return Err(IngestionOutcome::Failed {
                    error: format!("no media collaborator for {kind}"),
                })
            }
        }

        Ok(fragments)
    }

    /// Embed fragments in bounded batches and upsert them.
    ///
    /// Batches run concurrently under the pool's cap; `join_all`
    /// preserves submission order so vectors line up with fragments
    /// before anything is written.
    async fn embed_and_store(
        &self,
        path: &Path,
        fragments: &[(String, SourceKind)],
        opts: &IngestOptions,
    ) -> Result<u32> {
        let chunks: Vec<MemoryChunk> = fragments
            .iter()
            .enumerate()
            .map(|(i, (text, source_kind))| {
                let mut chunk = MemoryChunk::new(
                    &opts.owner_id,
                    text.clone(),
                    path,
                    *source_kind,
                    i as u32,
                );
                self.attach_metadata(&mut chunk, path, opts);
                chunk
            })
            .collect();

        let batch_size = opts.batch_size.max(1);
        let duration = Duration::from_secs(opts.call_timeout_secs);
        let batches: Vec<_> = chunks
            .chunks(batch_size)
            .map(|batch| {
                let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
                async move {
                    timeout(duration, self.embedder.embed_batch(&texts))
                        .await
                        .map_err(|_| {
                            mnemo_core::EmbedError::Timeout(opts.call_timeout_secs)
                        })?
                }
            })
            .collect();

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
        for batch in join_all(batches).await {
            vectors.extend(batch?);
        }
        if vectors.len() != chunks.len() {
            return Err(Error::Embedding(mnemo_core::EmbedError::BatchMismatch {
                sent: chunks.len(),
                got: vectors.len(),
            }));
        }

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| EmbeddedChunk { chunk, vector })
            .collect();
        let count = embedded.len() as u32;
        self.store.upsert(&opts.owner_id, &embedded).await?;
        debug!(path = %path.display(), chunks = count, "file ingested");
        Ok(count)
    }

    fn attach_metadata(&self, chunk: &mut MemoryChunk, path: &Path, opts: &IngestOptions) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            chunk
                .metadata
                .insert("source".to_string(), name.to_string());
        }
        if !opts.tags.is_empty() {
            chunk
                .metadata
                .insert("tags".to_string(), opts.tags.join(","));
        }
        if let Some(description) = &opts.description {
            chunk
                .metadata
                .insert("description".to_string(), description.clone());
        }
        chunk.metadata.insert(
            "embedding_model".to_string(),
            self.embedder.model_name().to_string(),
        );
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}
