//! Byte signatures and the extension tables.
//!
//! The signature table is ordered most-specific first; the first
//! matching entry wins. RIFF containers share a four-byte header, so
//! `detect` resolves the sub-type at bytes 8..12 when enough of the
//! prefix is available.

use mnemo_core::ContentKind;

/// Number of prefix bytes required to cover every recognized signature.
pub const PREFIX_LEN: usize = 16;

/// A recognized byte signature near a file's start.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub magic: &'static [u8],
    pub kind: ContentKind,
    /// Extensions compatible with this signature (lowercase, no dot)
    pub extensions: &'static [&'static str],
    pub name: &'static str,
}

/// What `detect` found in a byte prefix.
#[derive(Debug, Clone, Copy)]
pub struct Detected {
    pub kind: ContentKind,
    pub extensions: &'static [&'static str],
    pub name: &'static str,
}

const SIGNATURES: &[Signature] = &[
    Signature {
        magic: &[0xff, 0xd8, 0xff],
        kind: ContentKind::Image,
        extensions: &["jpg", "jpeg"],
        name: "JPEG image",
    },
    Signature {
        magic: &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'],
        kind: ContentKind::Image,
        extensions: &["png"],
        name: "PNG image",
    },
    Signature {
        magic: b"GIF87a",
        kind: ContentKind::Image,
        extensions: &["gif"],
        name: "GIF image",
    },
    Signature {
        magic: b"GIF89a",
        kind: ContentKind::Image,
        extensions: &["gif"],
        name: "GIF image",
    },
    Signature {
        magic: b"%PDF",
        kind: ContentKind::Pdf,
        extensions: &["pdf"],
        name: "PDF document",
    },
    // OLE2 compound document: legacy .doc/.xls/.ppt
    Signature {
        magic: &[0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1],
        kind: ContentKind::LegacyDocument,
        extensions: &["doc", "xls", "ppt"],
        name: "OLE2 document (.doc/.xls/.ppt)",
    },
    // ZIP local file header: modern Office documents and friends
    Signature {
        magic: &[b'P', b'K', 0x03, 0x04],
        kind: ContentKind::ModernDocument,
        extensions: &["docx", "xlsx", "pptx", "odt", "epub", "zip"],
        name: "ZIP/Open-XML document (.docx/.xlsx/...)",
    },
    // Matroska / WebM EBML header
    Signature {
        magic: &[0x1a, 0x45, 0xdf, 0xa3],
        kind: ContentKind::Video,
        extensions: &["mkv", "webm"],
        name: "MKV/WebM video",
    },
    // RIFF container: sub-typed below into WebP / AVI / WAV
    Signature {
        magic: b"RIFF",
        kind: ContentKind::Video,
        extensions: &["webp", "avi", "wav"],
        name: "RIFF container",
    },
];

/// RIFF sub-types, identified at bytes 8..12.
const RIFF_SUBTYPES: &[(&[u8; 4], Detected)] = &[
    (
        b"WEBP",
        Detected {
            kind: ContentKind::Image,
            extensions: &["webp"],
            name: "WebP image",
        },
    ),
    (
        b"AVI ",
        Detected {
            kind: ContentKind::Video,
            extensions: &["avi"],
            name: "AVI video",
        },
    ),
    (
        b"WAVE",
        Detected {
            kind: ContentKind::Audio,
            extensions: &["wav"],
            name: "WAV audio",
        },
    ),
];

/// Detect a known binary signature in a byte prefix.
///
/// Pure function of the prefix; returns `None` for plausible free
/// text.
#[must_use]
pub fn detect(prefix: &[u8]) -> Option<Detected> {
    for sig in SIGNATURES {
        if prefix.len() >= sig.magic.len() && &prefix[..sig.magic.len()] == sig.magic {
            if sig.magic == b"RIFF" && prefix.len() >= 12 {
                let subtype: &[u8] = &prefix[8..12];
                for (tag, resolved) in RIFF_SUBTYPES {
                    if subtype == *tag {
                        return Some(*resolved);
                    }
                }
            }
            return Some(Detected {
                kind: sig.kind,
                extensions: sig.extensions,
                name: sig.name,
            });
        }
    }
    None
}

// ============================================================================
// Extension tables
// ============================================================================
//
// The supported-extension table is explicit, public configuration,
// enumerable by callers and tests.

/// Free-text extensions, validated by absence of binary magic.
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Structured-text extensions (chat exports, tabular logs).
pub const STRUCTURED_EXTENSIONS: &[&str] = &["json", "csv"];

/// Modern document extensions.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx"];

/// Legacy document extensions requiring an external converter.
pub const LEGACY_DOCUMENT_EXTENSIONS: &[&str] = &["doc"];

/// Image extensions.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Video extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Extensions whose container magic varies too much to validate.
pub const SKIP_VALIDATION_EXTENSIONS: &[&str] = &["mp4", "mov"];

/// The kind a well-formed file with this extension is expected to be.
#[must_use]
pub fn expected_kind(extension: &str) -> Option<ContentKind> {
    let ext = extension.to_lowercase();
    let ext = ext.as_str();
    if TEXT_EXTENSIONS.contains(&ext) {
        Some(ContentKind::PlainText)
    } else if STRUCTURED_EXTENSIONS.contains(&ext) {
        Some(ContentKind::Structured)
    } else if ext == "pdf" {
        Some(ContentKind::Pdf)
    } else if ext == "docx" {
        Some(ContentKind::ModernDocument)
    } else if LEGACY_DOCUMENT_EXTENSIONS.contains(&ext) {
        Some(ContentKind::LegacyDocument)
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        Some(ContentKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Some(ContentKind::Video)
    } else {
        None
    }
}

/// All extensions the ingestion pipeline accepts.
#[must_use]
pub fn supported_extensions() -> Vec<&'static str> {
    TEXT_EXTENSIONS
        .iter()
        .chain(STRUCTURED_EXTENSIONS)
        .chain(DOCUMENT_EXTENSIONS)
        .chain(LEGACY_DOCUMENT_EXTENSIONS)
        .chain(IMAGE_EXTENSIONS)
        .chain(VIDEO_EXTENSIONS)
        .copied()
        .collect()
}

/// Whether the pipeline accepts files with this extension at all.
#[must_use]
pub fn is_supported_extension(extension: &str) -> bool {
    let ext = extension.to_lowercase();
    supported_extensions().contains(&ext.as_str())
}
