//! Content validation for the mnemo ingestion pipeline.
//!
//! Determines a file's true content family from a bounded byte prefix,
//! independent of its claimed extension, and compares the two. The
//! dangerous case is a misnamed or misexported file: bytes that carry
//! a *different* recognized binary signature than the extension claims
//! yield [`Verdict::Mismatch`], which forbids extraction.
//!
//! Validation never fails hard: unreadable or empty files produce
//! [`Verdict::Unknown`] with a precise reason.

pub mod signatures;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use mnemo_core::{ContentKind, ContentVerdict, Verdict};
use tracing::debug;

pub use signatures::{
    detect, expected_kind, is_supported_extension, supported_extensions, Detected,
    DOCUMENT_EXTENSIONS, IMAGE_EXTENSIONS, LEGACY_DOCUMENT_EXTENSIONS, PREFIX_LEN,
    SKIP_VALIDATION_EXTENSIONS, STRUCTURED_EXTENSIONS, TEXT_EXTENSIONS, VIDEO_EXTENSIONS,
};

/// Classify a file, reading only a bounded byte prefix.
///
/// The declared extension is taken from the path itself.
#[must_use]
pub fn classify(path: &Path) -> ContentVerdict {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let claimed = expected_kind(&extension).unwrap_or(ContentKind::Unknown);

    if SKIP_VALIDATION_EXTENSIONS.contains(&extension.as_str()) {
        // MP4/MOV brand bytes vary too much across encoders to check.
        return ContentVerdict {
            claimed,
            detected: ContentKind::Unknown,
            verdict: Verdict::Match,
            detail: format!("'.{extension}' container magic not validated"),
        };
    }

    let mut prefix = [0u8; signatures::PREFIX_LEN];
    let read = match File::open(path).and_then(|mut f| f.read(&mut prefix)) {
        Ok(n) => n,
        Err(e) => {
            return ContentVerdict {
                claimed,
                detected: ContentKind::Unknown,
                verdict: Verdict::Unknown,
                detail: format!("'{file_name}': unreadable ({e})"),
            };
        }
    };
    if read == 0 {
        return ContentVerdict {
            claimed,
            detected: ContentKind::Unknown,
            verdict: Verdict::Unknown,
            detail: format!("'{file_name}': empty file"),
        };
    }

    let verdict = classify_prefix(&prefix[..read], &extension, &file_name);
    debug!(
        file = %file_name,
        claimed = %verdict.claimed,
        detected = %verdict.detected,
        "content validation: {:?}",
        verdict.verdict
    );
    verdict
}

/// Classify from an already-read prefix. Pure function of prefix and
/// name; `classify` is a thin I/O wrapper over this.
#[must_use]
pub fn classify_prefix(prefix: &[u8], extension: &str, file_name: &str) -> ContentVerdict {
    let extension = extension.to_lowercase();
    let claimed = expected_kind(&extension).unwrap_or(ContentKind::Unknown);
    let detected = detect(prefix);

    let is_text_like = TEXT_EXTENSIONS.contains(&extension.as_str())
        || STRUCTURED_EXTENSIONS.contains(&extension.as_str());

    if is_text_like {
        // A text extension must carry no recognized binary signature
        // and decode cleanly as UTF-8.
        if let Some(found) = detected {
            return ContentVerdict {
                claimed,
                detected: found.kind,
                verdict: Verdict::Mismatch,
                detail: format!(
                    "'{file_name}': extension is '.{extension}' but file content is {}",
                    found.name
                ),
            };
        }
        if !prefix_is_utf8(prefix) {
            return ContentVerdict {
                claimed,
                detected: ContentKind::Unknown,
                verdict: Verdict::Mismatch,
                detail: format!(
                    "'{file_name}': extension is '.{extension}' but file contains non-UTF-8 binary data"
                ),
            };
        }
        return ContentVerdict {
            claimed,
            detected: claimed,
            verdict: Verdict::Match,
            detail: "plausible free text".to_string(),
        };
    }

    match detected {
        Some(found) if found.extensions.contains(&extension.as_str()) => ContentVerdict {
            claimed,
            detected: found.kind,
            verdict: Verdict::Match,
            detail: found.name.to_string(),
        },
        Some(found) => ContentVerdict {
            claimed,
            detected: found.kind,
            verdict: Verdict::Mismatch,
            detail: format!(
                "'{file_name}': extension is '.{extension}' but file content is {}",
                found.name
            ),
        },
        None => ContentVerdict {
            claimed,
            detected: ContentKind::Unknown,
            verdict: Verdict::Unknown,
            detail: format!("'{file_name}': no recognized signature for '.{extension}'"),
        },
    }
}

/// Whether a byte prefix is valid UTF-8, tolerating a multi-byte
/// sequence cut off at the end of the window.
fn prefix_is_utf8(prefix: &[u8]) -> bool {
    match std::str::from_utf8(prefix) {
        Ok(_) => true,
        // error_len() == None means the prefix ends mid-sequence, which
        // a bounded read can legitimately do.
        Err(e) => e.error_len().is_none(),
    }
}
