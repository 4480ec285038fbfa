//! # mnemo-store
//!
//! Owner-scoped vector storage backends.
//!
//! - [`MemoryStore`]: in-process store for tests and ephemeral runs
//! - [`JsonStore`]: one JSON file per owner under a data directory,
//!   the default persistent backend
//!
//! Both backends share the same ordering contract: query results come
//! back in descending cosine similarity, ties broken by ascending
//! sequence index and then lexical source path, so identical inputs
//! always produce identical output order.

pub mod json;
pub mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use mnemo_core::ScoredChunk;

/// Cosine similarity between two vectors.
///
/// Dimension mismatches and zero vectors score 0.0 rather than erroring;
/// a stale entry embedded under a different model should rank last, not
/// poison the whole query.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Sort scored chunks into the canonical output order.
pub(crate) fn sort_scored(results: &mut [ScoredChunk]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.chunk.sequence_index.cmp(&b.chunk.sequence_index))
            .then_with(|| a.chunk.source_path.cmp(&b.chunk.source_path))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.6, 0.8];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_opposite_vectors() {
        let score = cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_dimension_mismatch_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_cosine_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
