//! Prose-vs-chat classification.
//!
//! Chat is recognised structurally: a majority of non-blank lines
//! matching a `timestamp? sender: message` shape. The decision is a
//! pure function returning the evidence used, so tests can assert on
//! the evidence rather than just the outcome.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use mnemo_core::Turn;

use crate::chat::ChatItem;

// WhatsApp export: "1/2/24, 12:34 - Name: message"
static WHATSAPP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d{1,2}/\d{1,2}/\d{2,4},?\s+\d{1,2}:\d{2}\s*(?:AM|PM|am|pm)?)\s*-\s+(.+?):\s+(.+)$",
    )
    .expect("whatsapp pattern")
});

// Generic chat line: "Name: message" or "[timestamp] Name: message"
static GENERIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\[([^\]]+)\]\s+)?([^:]{1,40}):\s+(.+)$").expect("generic pattern"));

// Explicit conversation separator: a line of dashes/equals/underscores
static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[-=_*]{3,}$").expect("separator pattern"));

/// Structural shape of a text source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextShape {
    Prose,
    Chat,
}

/// Which line-pattern family carried the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// WhatsApp-style `date, time - sender: message` lines
    WhatsappTimestamp,
    /// Generic `sender: message` / `[ts] sender: message` lines
    SenderColon,
}

/// The evidence a classification rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    /// Non-blank lines matching a chat pattern
    pub matched_lines: usize,
    /// Total non-blank lines inspected
    pub total_lines: usize,
    /// Dominant pattern family, if any line matched
    pub pattern: Option<PatternKind>,
}

/// A categorical classification decision plus its evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub shape: TextShape,
    pub evidence: Evidence,
}

/// Minimum non-blank lines before chat detection can fire at all.
const MIN_CHAT_LINES: usize = 3;

/// Classify raw text as prose or chat.
///
/// Chat requires a strict majority of non-blank lines to match one of
/// the chat line patterns; anything else is prose. Structured inputs
/// that already expose sender/text fields bypass this entirely.
#[must_use]
pub fn classify_text(raw: &str) -> Classification {
    let mut total = 0usize;
    let mut whatsapp = 0usize;
    let mut generic = 0usize;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        total += 1;
        if WHATSAPP_RE.is_match(line) {
            whatsapp += 1;
        } else if GENERIC_RE.is_match(line) {
            generic += 1;
        }
    }

    let matched = whatsapp + generic;
    let pattern = if whatsapp >= generic && whatsapp > 0 {
        Some(PatternKind::WhatsappTimestamp)
    } else if generic > 0 {
        Some(PatternKind::SenderColon)
    } else {
        None
    };

    let shape = if total >= MIN_CHAT_LINES && matched * 2 > total {
        TextShape::Chat
    } else {
        TextShape::Prose
    };

    Classification {
        shape,
        evidence: Evidence {
            matched_lines: matched,
            total_lines: total,
            pattern,
        },
    }
}

/// Parse chat-shaped text into turns and explicit separators.
///
/// Lines matching neither pattern are folded into the preceding turn
/// (multi-line messages); leading unmatched lines are dropped only if
/// blank, otherwise kept as an anonymous turn so no content is lost.
#[must_use]
pub fn parse_chat_lines(raw: &str) -> Vec<ChatItem> {
    let mut items: Vec<ChatItem> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if SEPARATOR_RE.is_match(line) {
            items.push(ChatItem::Separator);
            continue;
        }

        if let Some(caps) = WHATSAPP_RE.captures(line) {
            let turn = Turn::new(&caps[2], &caps[3]).with_timestamp(caps[1].trim());
            items.push(ChatItem::Turn(turn));
            continue;
        }

        if let Some(caps) = GENERIC_RE.captures(line) {
            let mut turn = Turn::new(&caps[2], &caps[3]);
            if let Some(ts) = caps.get(1) {
                turn = turn.with_timestamp(ts.as_str());
            }
            items.push(ChatItem::Turn(turn));
            continue;
        }

        // Continuation of a multi-line message, or stray preamble.
        match items.last_mut() {
            Some(ChatItem::Turn(turn)) => {
                turn.text.push('\n');
                turn.text.push_str(line);
            }
            _ => items.push(ChatItem::Turn(Turn::new("Unknown", line))),
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_prose_is_prose() {
        let c = classify_text("It was a bright cold day in April.\n\nThe clocks struck.");
        assert_eq!(c.shape, TextShape::Prose);
        assert_eq!(c.evidence.matched_lines, 0);
        assert!(c.evidence.pattern.is_none());
    }

    #[test]
    fn test_generic_chat_is_chat() {
        let c = classify_text("Alice: hi\nBob: hello\nAlice: how are you\n");
        assert_eq!(c.shape, TextShape::Chat);
        assert_eq!(c.evidence.matched_lines, 3);
        assert_eq!(c.evidence.total_lines, 3);
        assert_eq!(c.evidence.pattern, Some(PatternKind::SenderColon));
    }

    #[test]
    fn test_whatsapp_chat_evidence() {
        let text = "1/2/24, 12:34 - Anna: ciao\n1/2/24, 12:35 - Marco: ciao!\n1/2/24, 12:36 - Anna: come stai?";
        let c = classify_text(text);
        assert_eq!(c.shape, TextShape::Chat);
        assert_eq!(c.evidence.pattern, Some(PatternKind::WhatsappTimestamp));
        assert_eq!(c.evidence.matched_lines, 3);
    }

    #[test]
    fn test_two_lines_never_chat() {
        // Too short for the heuristic to be trustworthy.
        let c = classify_text("Alice: hi\nBob: hello");
        assert_eq!(c.shape, TextShape::Prose);
        assert_eq!(c.evidence.matched_lines, 2);
    }

    #[test]
    fn test_minority_of_colon_lines_is_prose() {
        let text = "Chapter one: the beginning\n\nIt was raining.\nThe streets were empty.\nNobody spoke.\nNothing moved.";
        let c = classify_text(text);
        assert_eq!(c.shape, TextShape::Prose);
        assert!(c.evidence.matched_lines < c.evidence.total_lines);
    }

    #[test]
    fn test_parse_generic_lines() {
        let items = parse_chat_lines("Alice: hi\nBob: hello\n");
        assert_eq!(items.len(), 2);
        match &items[0] {
            ChatItem::Turn(t) => {
                assert_eq!(t.speaker, "Alice");
                assert_eq!(t.text, "hi");
                assert!(t.timestamp.is_none());
            }
            ChatItem::Separator => panic!("expected turn"),
        }
    }

    #[test]
    fn test_parse_bracketed_timestamp() {
        let items = parse_chat_lines("[2023-05-01 09:12] Alice: morning\n");
        match &items[0] {
            ChatItem::Turn(t) => {
                assert_eq!(t.timestamp.as_deref(), Some("2023-05-01 09:12"));
                assert_eq!(t.speaker, "Alice");
            }
            ChatItem::Separator => panic!("expected turn"),
        }
    }

    #[test]
    fn test_parse_whatsapp_line() {
        let items = parse_chat_lines("1/2/24, 12:34 - Anna: ciao\n");
        match &items[0] {
            ChatItem::Turn(t) => {
                assert_eq!(t.speaker, "Anna");
                assert_eq!(t.text, "ciao");
                assert_eq!(t.timestamp.as_deref(), Some("1/2/24, 12:34"));
            }
            ChatItem::Separator => panic!("expected turn"),
        }
    }

    #[test]
    fn test_parse_separator_line() {
        let items = parse_chat_lines("Alice: bye\n----\nBob: new topic\n");
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1], ChatItem::Separator));
    }

    #[test]
    fn test_multiline_message_folds_into_turn() {
        let items = parse_chat_lines("Alice: first line\nsecond line with no sender\n");
        assert_eq!(items.len(), 1);
        match &items[0] {
            ChatItem::Turn(t) => {
                assert_eq!(t.text, "first line\nsecond line with no sender");
            }
            ChatItem::Separator => panic!("expected turn"),
        }
    }

    #[test]
    fn test_no_content_lost_in_preamble() {
        let items = parse_chat_lines("stray preamble line\nAlice: hi\n");
        assert_eq!(items.len(), 2);
        match &items[0] {
            ChatItem::Turn(t) => {
                assert_eq!(t.speaker, "Unknown");
                assert_eq!(t.text, "stray preamble line");
            }
            ChatItem::Separator => panic!("expected turn"),
        }
    }
}
