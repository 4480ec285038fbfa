//! Turn-preserving segmentation for conversational text.
//!
//! Fragments are built from whole turns only. A turn is never split
//! across fragments, even when a single turn exceeds the word target.
//! Conversation boundaries (explicit separators or long time gaps)
//! close the current fragment without carrying any overlap forward.

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use mnemo_core::{SegmentConfig, Turn};

/// One parsed element of a chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatItem {
    Turn(Turn),
    /// An explicit divider line such as `----` between conversations.
    Separator,
}

/// Consecutive turns by the same speaker closer together than this are
/// merged into one turn before segmentation.
const COALESCE_WINDOW_MIN: i64 = 5;

const TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%y, %H:%M",
    "%m/%d/%Y, %H:%M",
    "%m/%d/%y, %I:%M %p",
    "%m/%d/%Y, %I:%M %p",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn minutes_between(a: &NaiveDateTime, b: &NaiveDateTime) -> i64 {
    (*b - *a).num_minutes().abs()
}

/// Merges runs of same-speaker turns sent within [`COALESCE_WINDOW_MIN`]
/// minutes of each other. Turns without a parseable timestamp are never
/// merged; without timing evidence a run may span a long silence.
fn coalesce_turns(items: &[ChatItem]) -> Vec<ChatItem> {
    let mut out: Vec<ChatItem> = Vec::with_capacity(items.len());
    for item in items {
        let turn = match item {
            ChatItem::Turn(t) => t,
            ChatItem::Separator => {
                out.push(ChatItem::Separator);
                continue;
            }
        };
        if let Some(ChatItem::Turn(prev)) = out.last_mut() {
            if prev.speaker == turn.speaker {
                let close_enough = match (
                    prev.timestamp.as_deref().and_then(parse_timestamp),
                    turn.timestamp.as_deref().and_then(parse_timestamp),
                ) {
                    (Some(a), Some(b)) => minutes_between(&a, &b) <= COALESCE_WINDOW_MIN,
                    _ => false,
                };
                if close_enough {
                    prev.text.push('\n');
                    prev.text.push_str(&turn.text);
                    continue;
                }
            }
        }
        out.push(item.clone());
    }
    out
}

/// Splits a parsed chat into fragments of roughly `target_words` words.
///
/// Each new fragment is seeded with up to `overlap_turns` turns from the
/// tail of the previous one so retrieval keeps conversational context.
/// A [`ChatItem::Separator`] or a time gap longer than
/// `boundary_gap_minutes` between adjacent turns closes the current
/// fragment with no overlap carried across the boundary.
pub fn segment_chat(items: &[ChatItem], config: &SegmentConfig) -> Vec<String> {
    let items = coalesce_turns(items);

    let mut fragments: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_words = 0usize;
    // Turns added since the last close; the overlap seed alone never
    // forms a fragment.
    let mut fresh = 0usize;
    let mut recent: VecDeque<(String, usize)> = VecDeque::new();
    let mut prev_ts: Option<NaiveDateTime> = None;

    let mut close = |current: &mut Vec<String>,
                     current_words: &mut usize,
                     fresh: &mut usize,
                     fragments: &mut Vec<String>| {
        if *fresh > 0 {
            fragments.push(current.join("\n"));
        }
        current.clear();
        *current_words = 0;
        *fresh = 0;
    };

    for item in &items {
        let turn = match item {
            ChatItem::Turn(t) => t,
            ChatItem::Separator => {
                close(&mut current, &mut current_words, &mut fresh, &mut fragments);
                recent.clear();
                prev_ts = None;
                continue;
            }
        };

        let ts = turn.timestamp.as_deref().and_then(parse_timestamp);
        if let (Some(prev), Some(now)) = (prev_ts, ts) {
            if minutes_between(&prev, &now) > config.boundary_gap_minutes {
                close(&mut current, &mut current_words, &mut fresh, &mut fragments);
                recent.clear();
            }
        }
        if ts.is_some() {
            prev_ts = ts;
        }

        let line = turn.render();
        let words = line.split_whitespace().count();

        if fresh > 0 && current_words + words > config.target_words {
            close(&mut current, &mut current_words, &mut fresh, &mut fragments);
            for (seed, seed_words) in &recent {
                current.push(seed.clone());
                current_words += seed_words;
            }
        }

        current.push(line.clone());
        current_words += words;
        fresh += 1;

        if config.overlap_turns > 0 {
            recent.push_back((line, words));
            while recent.len() > config.overlap_turns {
                recent.pop_front();
            }
        }
    }

    close(&mut current, &mut current_words, &mut fresh, &mut fragments);
    fragments
}
