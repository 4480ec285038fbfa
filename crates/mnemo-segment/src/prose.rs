//! Paragraph-aware prose segmentation.
//!
//! Paragraphs (blank-line boundaries) accumulate into a fragment until
//! the next one would exceed the word budget; the next fragment then
//! opens by repeating whole trailing paragraphs within the overlap
//! budget, so adjacent fragments share context without ever splitting
//! a paragraph partially.

use mnemo_core::SegmentConfig;
use tracing::debug;

/// Split text into overlapping fragments of whole paragraphs.
///
/// Guarantees: every input character appears in at least one fragment;
/// fragments are emitted in source order; a paragraph exceeding the
/// budget on its own becomes its own fragment (split further on
/// sentence boundaries, hard word cut as last resort).
#[must_use]
pub fn segment_prose(text: &str, config: &SegmentConfig) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let paragraphs: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let mut fragments: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0usize;

    for para in paragraphs {
        let para_words = word_count(para);

        // An oversized paragraph stands alone; it never merges with
        // neighbours and never carries overlap across its edges.
        if para_words > config.target_words {
            if !current.is_empty() {
                fragments.push(current.join("\n\n"));
                current.clear();
                current_words = 0;
            }
            fragments.extend(split_oversized(para, config));
            continue;
        }

        if current_words + para_words > config.target_words && !current.is_empty() {
            fragments.push(current.join("\n\n"));

            // Repeat whole trailing paragraphs within the overlap
            // budget; a paragraph is never carried partially.
            let overlap = trailing_overlap(&current, config.overlap_words);
            current = overlap;
            current_words = current.iter().map(|p| word_count(p)).sum();
        }

        current.push(para);
        current_words += para_words;
    }

    if !current.is_empty() {
        fragments.push(current.join("\n\n"));
    }

    debug!(
        fragments = fragments.len(),
        target_words = config.target_words,
        "prose segmentation complete"
    );
    fragments
}

/// Whole trailing paragraphs whose cumulative word count fits the
/// overlap budget.
fn trailing_overlap<'a>(paragraphs: &[&'a str], budget_words: usize) -> Vec<&'a str> {
    let mut overlap: Vec<&'a str> = Vec::new();
    let mut words = 0usize;
    for para in paragraphs.iter().rev() {
        let pw = word_count(para);
        if words + pw > budget_words {
            break;
        }
        overlap.push(para);
        words += pw;
    }
    overlap.reverse();
    overlap
}

/// Split one oversized paragraph: sentence boundaries first, hard word
/// windows as last resort.
fn split_oversized(paragraph: &str, config: &SegmentConfig) -> Vec<String> {
    let sentences = split_sentences(paragraph);

    let mut fragments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_words = 0usize;

    for sentence in sentences {
        let sent_words = word_count(sentence);

        if sent_words > config.target_words {
            // A single run-on "sentence" longer than the whole budget:
            // no boundary to respect, cut on words.
            if !current.is_empty() {
                fragments.push(std::mem::take(&mut current));
                current_words = 0;
            }
            fragments.extend(hard_split(sentence, config));
            continue;
        }

        if current_words + sent_words > config.target_words && !current.is_empty() {
            fragments.push(std::mem::take(&mut current));
            current_words = 0;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);
        current_words += sent_words;
    }

    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

/// Word-window split with trailing-word overlap.
fn hard_split(text: &str, config: &SegmentConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let step = config
        .target_words
        .saturating_sub(config.overlap_words)
        .max(1);

    let mut fragments = Vec::new();
    let mut start = 0usize;
    while start < words.len() {
        let end = (start + config.target_words).min(words.len());
        fragments.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    fragments
}

/// Split on sentence-final punctuation followed by whitespace.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if matches!(bytes[i], b'.' | b'!' | b'?') {
            // Swallow any run of closing punctuation.
            let mut end = i + 1;
            while end < bytes.len() && matches!(bytes[end], b'.' | b'!' | b'?' | b'"' | b'\'' | b')')
            {
                end += 1;
            }
            if end >= bytes.len() || bytes[end].is_ascii_whitespace() {
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target: usize, overlap: usize) -> SegmentConfig {
        SegmentConfig {
            target_words: target,
            overlap_words: overlap,
            ..SegmentConfig::default()
        }
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(segment_prose("", &SegmentConfig::default()).is_empty());
        assert!(segment_prose("  \n\n  ", &SegmentConfig::default()).is_empty());
    }

    #[test]
    fn test_small_text_is_single_fragment() {
        let fragments = segment_prose("One paragraph.\n\nAnother paragraph.", &config(100, 10));
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0], "One paragraph.\n\nAnother paragraph.");
    }

    #[test]
    fn test_fragments_in_source_order() {
        let text =
            "alpha one two three\n\nbeta one two three\n\ngamma one two three\n\ndelta one two three";
        let fragments = segment_prose(text, &config(8, 0));
        assert!(fragments.len() > 1);
        let joined = fragments.join(" ");
        let alpha = joined.find("alpha").unwrap();
        let delta = joined.find("delta").unwrap();
        assert!(alpha < delta);
    }

    #[test]
    fn test_overlap_repeats_whole_trailing_paragraph() {
        // Each paragraph is 4 words; target 8 fits two paragraphs,
        // overlap 4 carries exactly one paragraph over.
        let text = "p1 a b c\n\np2 a b c\n\np3 a b c";
        let fragments = segment_prose(text, &config(8, 4));
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], "p1 a b c\n\np2 a b c");
        assert_eq!(fragments[1], "p2 a b c\n\np3 a b c");
    }

    #[test]
    fn test_overlap_never_partial_paragraph() {
        // Overlap budget of 2 words cannot fit a whole 4-word
        // paragraph, so nothing is carried over.
        let text = "p1 a b c\n\np2 a b c\n\np3 a b c";
        let fragments = segment_prose(text, &config(8, 2));
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1], "p3 a b c");
    }

    #[test]
    fn test_coverage_reconstructs_input() {
        // Strip the shared overlap paragraphs and the concatenation
        // must equal the (paragraph-normalized) input.
        let paras: Vec<String> = (0..12)
            .map(|i| format!("paragraph {i} has exactly six words"))
            .collect();
        let text = paras.join("\n\n");
        let fragments = segment_prose(&text, &config(18, 6));
        assert!(fragments.len() > 1);

        let mut reconstructed: Vec<String> = Vec::new();
        let mut prev_tail: Vec<String> = Vec::new();
        for frag in &fragments {
            let frag_paras: Vec<String> = frag.split("\n\n").map(str::to_string).collect();
            // The overlap is the longest prefix mirroring the previous
            // fragment's tail, always whole paragraphs.
            let mut skip = 0;
            for k in (1..=frag_paras.len().min(prev_tail.len())).rev() {
                if prev_tail[prev_tail.len() - k..] == frag_paras[..k] {
                    skip = k;
                    break;
                }
            }
            reconstructed.extend(frag_paras[skip..].iter().cloned());
            prev_tail = frag_paras;
        }

        assert_eq!(reconstructed.join("\n\n"), text);
    }

    #[test]
    fn test_oversized_paragraph_stands_alone() {
        let big: String = (0..30).map(|i| format!("word{i} ")).collect();
        let text = format!("small one.\n\n{}\n\nsmall two.", big.trim());
        let fragments = segment_prose(&text, &config(20, 5));
        // small one | oversized (split) | small two
        assert!(fragments.len() >= 3);
        assert_eq!(fragments[0], "small one.");
        assert_eq!(fragments.last().unwrap(), "small two.");
    }

    #[test]
    fn test_oversized_paragraph_splits_on_sentences() {
        let text = "First sentence here. Second sentence here. Third sentence here. \
                    Fourth sentence here. Fifth sentence here. Sixth sentence here.";
        let fragments = segment_prose(text, &config(9, 0));
        assert!(fragments.len() > 1);
        for frag in &fragments {
            // No fragment starts mid-sentence.
            assert!(frag.ends_with('.'), "fragment {frag:?} cut mid-sentence");
        }
    }

    #[test]
    fn test_unbroken_run_gets_hard_cut() {
        let words: String = (0..50).map(|i| format!("w{i} ")).collect();
        let fragments = segment_prose(words.trim(), &config(10, 2));
        assert!(fragments.len() > 1);
        // Every word must appear somewhere.
        let joined = fragments.join(" ");
        assert!(joined.contains("w0"));
        assert!(joined.contains("w49"));
    }

    #[test]
    fn test_split_sentences_handles_quotes() {
        let sentences = split_sentences(r#"He said "go home." She left. The end"#);
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], r#"He said "go home.""#);
        assert_eq!(sentences[2], "The end");
    }

    #[test]
    fn test_split_sentences_ignores_decimal_points() {
        let sentences = split_sentences("Pi is 3.14 roughly. Yes.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], "Pi is 3.14 roughly.");
    }
}
