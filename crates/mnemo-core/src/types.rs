//! Core types shared across the mnemo pipeline.
//!
//! ## Memory
//! - [`MemoryChunk`]: one retrievable fragment of ingested text
//! - [`EmbeddedChunk`]: a chunk paired with its embedding vector
//! - [`SourceKind`]: what family of source a chunk came from
//! - [`Turn`]: one message of a conversational source
//!
//! ## Validation
//! - [`ContentKind`]: true content family detected from bytes
//! - [`ContentVerdict`]: claimed-vs-detected comparison result
//!
//! ## Ingestion
//! - [`IngestionOutcome`]: per-file result
//! - [`RunReport`]: outcomes aggregated in traversal order
//!
//! ## Retrieval
//! - [`ScoredChunk`]: a chunk with its similarity score

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Memory chunks
// ============================================================================

/// What family of source material a chunk was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// Literary or free-form prose
    Prose,
    /// Turn-based dialogue (chat logs, messenger exports)
    Chat,
    /// Structured records flattened to text (JSON, CSV)
    Structured,
    /// Vision-derived description of an image
    MediaImage,
    /// Vision-derived description of video frames
    MediaVideo,
    /// Transcript of audio content
    MediaAudioTranscript,
}

impl SourceKind {
    /// Stable textual form, used in chunk metadata.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Prose => "prose",
            SourceKind::Chat => "chat",
            SourceKind::Structured => "structured",
            SourceKind::MediaImage => "media-image",
            SourceKind::MediaVideo => "media-video",
            SourceKind::MediaAudioTranscript => "media-audio-transcript",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of retrievable knowledge.
///
/// The `id` is derived deterministically from owner, source path and
/// sequence index, so re-ingesting an unchanged file overwrites the
/// same ids instead of duplicating them. The stored `text` is always
/// verbatim source material (or verbatim collaborator output for
/// media); mnemo never paraphrases it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryChunk {
    /// Stable identifier, unique per `(owner_id, source_path, sequence_index)`
    pub id: String,
    /// Persona this memory belongs to
    pub owner_id: String,
    /// Verbatim fragment text, never empty
    pub text: String,
    /// Path of the source file
    pub source_path: PathBuf,
    /// Family of the source material
    pub source_kind: SourceKind,
    /// Emission order within the source file, monotonic from zero
    pub sequence_index: u32,
    /// Open key-value metadata: tags, timestamps, speaker, media flags
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl MemoryChunk {
    /// Derive the stable chunk id for a given position in a source.
    #[must_use]
    pub fn derive_id(owner_id: &str, source_path: &Path, sequence_index: u32) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(owner_id.as_bytes());
        hasher.update(b"\x00");
        hasher.update(source_path.to_string_lossy().as_bytes());
        hasher.update(b"\x00");
        hasher.update(&sequence_index.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Create a chunk with a derived id.
    #[must_use]
    pub fn new(
        owner_id: impl Into<String>,
        text: impl Into<String>,
        source_path: impl Into<PathBuf>,
        source_kind: SourceKind,
        sequence_index: u32,
    ) -> Self {
        let owner_id = owner_id.into();
        let source_path = source_path.into();
        Self {
            id: Self::derive_id(&owner_id, &source_path, sequence_index),
            owner_id,
            text: text.into(),
            source_path,
            source_kind,
            sequence_index,
            metadata: BTreeMap::new(),
        }
    }
}

/// A chunk paired with the vector produced for it.
///
/// The vector travels alongside the chunk on its way into the store;
/// the store owns it from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: MemoryChunk,
    pub vector: Vec<f32>,
}

/// One message attributed to one sender in a conversational source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Turn {
    #[must_use]
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Render as a single chat-log line: `[ts] speaker: text` or
    /// `speaker: text`.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.timestamp {
            Some(ts) if !ts.is_empty() => format!("[{}] {}: {}", ts, self.speaker, self.text),
            _ => format!("{}: {}", self.speaker, self.text),
        }
    }
}

/// Text produced by an extraction collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractedText {
    /// Free-running text, shape still to be classified
    Prose(String),
    /// Already-structured conversation, bypasses line-pattern detection
    Turns(Vec<Turn>),
}

impl ExtractedText {
    /// True when there is nothing to segment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            ExtractedText::Prose(text) => text.trim().is_empty(),
            ExtractedText::Turns(turns) => turns.is_empty(),
        }
    }
}

// ============================================================================
// Content validation
// ============================================================================

/// True content family of a file, detected independently of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    /// Free text without a recognized binary signature
    PlainText,
    /// Structured text records (JSON, CSV)
    Structured,
    /// PDF document
    Pdf,
    /// OLE2 compound file (legacy .doc/.xls/.ppt)
    LegacyDocument,
    /// ZIP-based container (modern .docx and friends)
    ModernDocument,
    /// Raster image
    Image,
    /// Video container
    Video,
    /// Audio container
    Audio,
    /// Could not be determined
    Unknown,
}

impl ContentKind {
    /// Whether the kind is handled by the media (vision/transcription)
    /// path rather than text extraction.
    #[must_use]
    pub fn is_media(self) -> bool {
        matches!(
            self,
            ContentKind::Image | ContentKind::Video | ContentKind::Audio
        )
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentKind::PlainText => "plain text",
            ContentKind::Structured => "structured text",
            ContentKind::Pdf => "PDF document",
            ContentKind::LegacyDocument => "OLE2 document (.doc/.xls/.ppt)",
            ContentKind::ModernDocument => "ZIP/Open-XML document",
            ContentKind::Image => "image",
            ContentKind::Video => "video",
            ContentKind::Audio => "audio",
            ContentKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Outcome of comparing claimed extension against detected bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    /// Claimed and detected kinds agree (or content is plausible text)
    Match,
    /// Bytes indicate a different recognized binary family than claimed
    Mismatch,
    /// Could not determine: unreadable, empty, or no known signature
    Unknown,
}

/// Result of content validation for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentVerdict {
    pub claimed: ContentKind,
    pub detected: ContentKind,
    pub verdict: Verdict,
    /// Human-readable explanation, precise for Mismatch/Unknown
    pub detail: String,
}

impl ContentVerdict {
    #[must_use]
    pub fn is_mismatch(&self) -> bool {
        self.verdict == Verdict::Mismatch
    }
}

// ============================================================================
// Ingestion reporting
// ============================================================================

/// Per-file result of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestionOutcome {
    /// File fully processed; `chunks` fragments written
    Ingested { chunks: u32 },
    /// File intentionally not processed (e.g. content mismatch)
    Skipped { reason: String },
    /// Processing failed partway; the run continued
    Failed { error: String },
}

/// One entry of a [`RunReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub path: PathBuf,
    pub outcome: IngestionOutcome,
}

/// Outcomes of an ingestion run, in traversal order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn push(&mut self, path: impl Into<PathBuf>, outcome: IngestionOutcome) {
        self.entries.push(ReportEntry {
            path: path.into(),
            outcome,
        });
    }

    #[must_use]
    pub fn ingested_files(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, IngestionOutcome::Ingested { .. }))
            .count()
    }

    #[must_use]
    pub fn skipped_files(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, IngestionOutcome::Skipped { .. }))
            .count()
    }

    #[must_use]
    pub fn failed_files(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, IngestionOutcome::Failed { .. }))
            .count()
    }

    /// Total fragments written across all ingested files.
    #[must_use]
    pub fn total_chunks(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| match e.outcome {
                IngestionOutcome::Ingested { chunks } => u64::from(chunks),
                _ => 0,
            })
            .sum()
    }
}

// ============================================================================
// Retrieval
// ============================================================================

/// A retrieved chunk with its cosine similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: MemoryChunk,
    pub score: f32,
}

/// Ordered, deduplicated retrieval output, descending score.
pub type RetrievalResult = Vec<ScoredChunk>;

// ============================================================================
// Segmentation configuration
// ============================================================================

/// Configuration for prose and chat segmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Target fragment size in words
    pub target_words: usize,
    /// Overlap budget in words for prose fragments (whole paragraphs)
    pub overlap_words: usize,
    /// Number of trailing turns carried across a chat fragment boundary
    pub overlap_turns: usize,
    /// Time gap (minutes) that forces a conversation boundary
    pub boundary_gap_minutes: i64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            target_words: 500,
            overlap_words: 50,
            overlap_turns: 2,
            boundary_gap_minutes: 180,
        }
    }
}

/// Description of a video produced by a media collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoDescription {
    /// One description per sampled frame, in frame order
    pub frame_descriptions: Vec<String>,
    /// Transcript of the audio track, when one was recoverable
    pub transcript: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_kind_keys_a_map() {
        // Extractor registries key on the kind.
        let mut map = std::collections::HashMap::new();
        map.insert(ContentKind::Pdf, "pdf");
        map.insert(ContentKind::PlainText, "text");
        assert_eq!(map.get(&ContentKind::Pdf), Some(&"pdf"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_chunk_id_is_deterministic() {
        let a = MemoryChunk::derive_id("alice", Path::new("/data/diary.txt"), 3);
        let b = MemoryChunk::derive_id("alice", Path::new("/data/diary.txt"), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_chunk_id_varies_by_owner_path_and_index() {
        let base = MemoryChunk::derive_id("alice", Path::new("/data/diary.txt"), 0);
        assert_ne!(
            base,
            MemoryChunk::derive_id("bob", Path::new("/data/diary.txt"), 0)
        );
        assert_ne!(
            base,
            MemoryChunk::derive_id("alice", Path::new("/data/other.txt"), 0)
        );
        assert_ne!(
            base,
            MemoryChunk::derive_id("alice", Path::new("/data/diary.txt"), 1)
        );
    }

    #[test]
    fn test_chunk_new_derives_id() {
        let chunk = MemoryChunk::new("alice", "hello", "/data/diary.txt", SourceKind::Prose, 2);
        assert_eq!(
            chunk.id,
            MemoryChunk::derive_id("alice", Path::new("/data/diary.txt"), 2)
        );
        assert_eq!(chunk.sequence_index, 2);
    }

    #[test]
    fn test_turn_render_with_timestamp() {
        let turn = Turn::new("Alice", "hi there").with_timestamp("2023-01-01 10:00");
        assert_eq!(turn.render(), "[2023-01-01 10:00] Alice: hi there");
    }

    #[test]
    fn test_turn_render_without_timestamp() {
        let turn = Turn::new("Alice", "hi there");
        assert_eq!(turn.render(), "Alice: hi there");
    }

    #[test]
    fn test_source_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&SourceKind::MediaImage).unwrap(),
            "\"media-image\""
        );
        assert_eq!(
            serde_json::to_string(&SourceKind::MediaAudioTranscript).unwrap(),
            "\"media-audio-transcript\""
        );
    }

    #[test]
    fn test_extracted_text_is_empty() {
        assert!(ExtractedText::Prose("  \n ".to_string()).is_empty());
        assert!(ExtractedText::Turns(vec![]).is_empty());
        assert!(!ExtractedText::Prose("hello".to_string()).is_empty());
        assert!(!ExtractedText::Turns(vec![Turn::new("a", "b")]).is_empty());
    }

    #[test]
    fn test_run_report_counters() {
        let mut report = RunReport::default();
        report.push("/a.txt", IngestionOutcome::Ingested { chunks: 3 });
        report.push(
            "/b.txt",
            IngestionOutcome::Skipped {
                reason: "mismatch".to_string(),
            },
        );
        report.push(
            "/c.txt",
            IngestionOutcome::Failed {
                error: "boom".to_string(),
            },
        );
        report.push("/d.txt", IngestionOutcome::Ingested { chunks: 2 });

        assert_eq!(report.ingested_files(), 2);
        assert_eq!(report.skipped_files(), 1);
        assert_eq!(report.failed_files(), 1);
        assert_eq!(report.total_chunks(), 5);
    }

    #[test]
    fn test_run_report_preserves_order() {
        let mut report = RunReport::default();
        report.push("/z.txt", IngestionOutcome::Ingested { chunks: 1 });
        report.push("/a.txt", IngestionOutcome::Ingested { chunks: 1 });
        assert_eq!(report.entries[0].path, PathBuf::from("/z.txt"));
        assert_eq!(report.entries[1].path, PathBuf::from("/a.txt"));
    }

    #[test]
    fn test_content_kind_is_media() {
        assert!(ContentKind::Image.is_media());
        assert!(ContentKind::Video.is_media());
        assert!(!ContentKind::Pdf.is_media());
        assert!(!ContentKind::PlainText.is_media());
    }

    #[test]
    fn test_memory_chunk_serde_round_trip() {
        let mut chunk =
            MemoryChunk::new("alice", "content", "/data/diary.txt", SourceKind::Chat, 0);
        chunk
            .metadata
            .insert("tags".to_string(), "family".to_string());

        let json = serde_json::to_string(&chunk).unwrap();
        let back: MemoryChunk = serde_json::from_str(&json).unwrap();
        assert_eq!(chunk, back);
    }

    #[test]
    fn test_segment_config_default() {
        let cfg = SegmentConfig::default();
        assert_eq!(cfg.target_words, 500);
        assert_eq!(cfg.overlap_words, 50);
        assert_eq!(cfg.overlap_turns, 2);
        assert_eq!(cfg.boundary_gap_minutes, 180);
    }
}
