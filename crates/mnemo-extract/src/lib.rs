//! # mnemo-extract
//!
//! Content extraction from source files for the mnemo ingestion
//! pipeline.
//!
//! This crate provides the extraction layer that reads files and
//! produces [`ExtractedText`](mnemo_core::ExtractedText) for downstream
//! segmentation and embedding.
//!
//! ## Supported Formats
//!
//! | Extractor | Formats | Output |
//! |-----------|---------|--------|
//! | [`TextExtractor`] | `.txt`, `.md` | UTF-8 prose, lossy on invalid bytes |
//! | [`StructuredExtractor`] | `.json`, `.csv` | Parsed turns for chat exports, flattened text otherwise |
//! | [`PdfExtractor`] | `.pdf` | Page text |
//! | [`DocxExtractor`] | `.docx` | Paragraph text from the document body |
//! | [`LegacyDocExtractor`] | `.doc` | Text via the external `antiword` converter |
//!
//! ## Media Analysis
//!
//! Images, videos, and audio are not handled by the registry; the
//! pipeline routes them to the collaborator traits in `mnemo-core`
//! instead. This crate ships the implementations:
//!
//! - [`OpenAiImageDescriber`] / [`PlaceholderImageDescriber`] for images
//! - [`FfmpegVideoDescriber`] / [`PlaceholderVideoDescriber`] for videos
//! - [`WhisperTranscriber`] for audio tracks

pub mod docx;
pub mod legacy;
pub mod media;
pub mod pdf;
pub mod registry;
pub mod structured;
pub mod text;
pub mod vision;

pub use docx::DocxExtractor;
pub use legacy::LegacyDocExtractor;
pub use media::{FfmpegVideoDescriber, PlaceholderVideoDescriber, WhisperTranscriber};
pub use pdf::PdfExtractor;
pub use registry::ExtractorRegistry;
pub use structured::StructuredExtractor;
pub use text::TextExtractor;
pub use vision::{OpenAiImageDescriber, PlaceholderImageDescriber, VisionConfig};
