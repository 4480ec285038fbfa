//! Extractor for structured formats (JSON, CSV).
//!
//! Both formats get chat-export detection before falling back to a
//! plain-text rendering. Messenger exports are the common case for
//! personal archives and arrive as either a JSON array of message
//! objects or a CSV with sender and message columns.

use std::path::Path;

use async_trait::async_trait;
use mnemo_core::{ContentExtractor, ContentKind, ExtractError, ExtractedText, Turn};
use serde_json::Value;
use tokio::fs;
use tracing::debug;

const SPEAKER_KEYS: &[&str] = &["sender", "from", "speaker", "author", "user"];
const TEXT_KEYS: &[&str] = &["text", "message", "content", "body"];
const TIME_KEYS: &[&str] = &["timestamp", "date", "time", "datetime"];

/// Extractor for `.json` and `.csv` files.
pub struct StructuredExtractor;

impl StructuredExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for StructuredExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentExtractor for StructuredExtractor {
    fn kind(&self) -> ContentKind {
        ContentKind::Structured
    }

    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let raw = fs::read_to_string(path).await?;
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        if is_csv {
            Ok(extract_csv(&raw))
        } else {
            extract_json(&raw)
        }
    }
}

fn extract_json(raw: &str) -> Result<ExtractedText, ExtractError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| ExtractError::Parse(e.to_string()))?;

    if let Some(turns) = json_chat_turns(&value) {
        debug!(turns = turns.len(), "parsed json chat export");
        return Ok(ExtractedText::Turns(turns));
    }

    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| ExtractError::Parse(e.to_string()))?;
    Ok(ExtractedText::Prose(text))
}

/// A JSON array of objects is a chat export when its first element
/// carries a message-text key.
fn json_chat_turns(value: &Value) -> Option<Vec<Turn>> {
    let items = value.as_array()?;
    let first = items.first()?.as_object()?;
    if !TEXT_KEYS.iter().any(|k| first.contains_key(*k)) {
        return None;
    }

    let mut turns = Vec::with_capacity(items.len());
    for item in items {
        let Some(obj) = item.as_object() else {
            continue;
        };
        let text = first_string(obj, TEXT_KEYS).unwrap_or_default();
        if text.trim().is_empty() {
            continue;
        }
        let speaker =
            first_string(obj, SPEAKER_KEYS).unwrap_or_else(|| "Unknown".to_string());
        let mut turn = Turn::new(speaker, text);
        if let Some(ts) = first_string(obj, TIME_KEYS) {
            turn = turn.with_timestamp(ts);
        }
        turns.push(turn);
    }
    Some(turns)
}

fn first_string(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| {
        obj.get(*k).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    })
}

fn extract_csv(raw: &str) -> ExtractedText {
    let mut rows = parse_csv(raw);
    if rows.len() < 2 {
        return ExtractedText::Prose(raw.trim().to_string());
    }
    let header: Vec<String> = rows
        .remove(0)
        .into_iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let speaker_col = header.iter().position(|h| SPEAKER_KEYS.contains(&h.as_str()));
    let text_col = header.iter().position(|h| TEXT_KEYS.contains(&h.as_str()));
    let time_col = header.iter().position(|h| TIME_KEYS.contains(&h.as_str()));

    if let (Some(speaker_col), Some(text_col)) = (speaker_col, text_col) {
        let turns: Vec<Turn> = rows
            .iter()
            .filter_map(|row| {
                let speaker = row.get(speaker_col)?;
                let text = row.get(text_col)?;
                if text.trim().is_empty() {
                    return None;
                }
                let mut turn = Turn::new(speaker, text);
                if let Some(ts) = time_col.and_then(|c| row.get(c)) {
                    if !ts.is_empty() {
                        turn = turn.with_timestamp(ts);
                    }
                }
                Some(turn)
            })
            .collect();
        debug!(turns = turns.len(), "parsed csv chat export");
        return ExtractedText::Turns(turns);
    }

    // Plain tabular data: one line per row, columns labelled by header.
    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            header
                .iter()
                .zip(row.iter())
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .collect();
    ExtractedText::Prose(lines.join("\n"))
}

/// Minimal RFC 4180 row parser. Handles quoted fields and doubled
/// quotes; does not handle embedded newlines inside quoted fields by
/// row, which chat exports in practice never use.
fn parse_csv(raw: &str) -> Vec<Vec<String>> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_csv_row)
        .collect()
}

fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_json_message_array_becomes_turns() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("export.json");
        std::fs::write(
            &file_path,
            r#"[
                {"sender": "Alice", "text": "hi", "timestamp": "2023-05-01 09:00"},
                {"sender": "Bob", "text": "hello"}
            ]"#,
        )
        .unwrap();

        let text = StructuredExtractor::new().extract(&file_path).await.unwrap();
        match text {
            ExtractedText::Turns(turns) => {
                assert_eq!(turns.len(), 2);
                assert_eq!(turns[0].speaker, "Alice");
                assert_eq!(turns[0].timestamp.as_deref(), Some("2023-05-01 09:00"));
                assert_eq!(turns[1].speaker, "Bob");
                assert!(turns[1].timestamp.is_none());
            }
            ExtractedText::Prose(_) => panic!("expected turns"),
        }
    }

    #[test]
    fn test_json_alternate_keys() {
        let value: Value = serde_json::from_str(
            r#"[{"from": "Carol", "message": "ciao", "date": "1/2/24, 12:34"}]"#,
        )
        .unwrap();
        let turns = json_chat_turns(&value).unwrap();
        assert_eq!(turns[0].speaker, "Carol");
        assert_eq!(turns[0].text, "ciao");
        assert_eq!(turns[0].timestamp.as_deref(), Some("1/2/24, 12:34"));
    }

    #[test]
    fn test_json_missing_sender_is_unknown() {
        let value: Value = serde_json::from_str(r#"[{"text": "orphan line"}]"#).unwrap();
        let turns = json_chat_turns(&value).unwrap();
        assert_eq!(turns[0].speaker, "Unknown");
    }

    #[test]
    fn test_json_empty_messages_skipped() {
        let value: Value = serde_json::from_str(
            r#"[{"sender": "A", "text": "kept"}, {"sender": "B", "text": "  "}]"#,
        )
        .unwrap();
        let turns = json_chat_turns(&value).unwrap();
        assert_eq!(turns.len(), 1);
    }

    #[test]
    fn test_json_object_is_pretty_printed() {
        let text = extract_json(r#"{"name": "Alice", "age": 30}"#).unwrap();
        match text {
            ExtractedText::Prose(s) => {
                assert!(s.contains("\"name\": \"Alice\""));
            }
            ExtractedText::Turns(_) => panic!("expected prose"),
        }
    }

    #[test]
    fn test_json_invalid_is_parse_error() {
        assert!(matches!(
            extract_json("not json at all"),
            Err(ExtractError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_csv_chat_columns_become_turns() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("chat.csv");
        std::fs::write(
            &file_path,
            "sender,message,timestamp\nAlice,\"hi, there\",2023-05-01 09:00\nBob,hello,\n",
        )
        .unwrap();

        let text = StructuredExtractor::new().extract(&file_path).await.unwrap();
        match text {
            ExtractedText::Turns(turns) => {
                assert_eq!(turns.len(), 2);
                assert_eq!(turns[0].text, "hi, there");
                assert_eq!(turns[0].timestamp.as_deref(), Some("2023-05-01 09:00"));
                assert!(turns[1].timestamp.is_none());
            }
            ExtractedText::Prose(_) => panic!("expected turns"),
        }
    }

    #[test]
    fn test_csv_plain_table_becomes_labelled_lines() {
        let text = extract_csv("city,population\nRome,2800000\nMilan,1400000\n");
        match text {
            ExtractedText::Prose(s) => {
                assert_eq!(
                    s,
                    "city: Rome | population: 2800000\ncity: Milan | population: 1400000"
                );
            }
            ExtractedText::Turns(_) => panic!("expected prose"),
        }
    }

    #[test]
    fn test_csv_header_only_falls_back_to_raw() {
        let text = extract_csv("sender,message\n");
        assert_eq!(text, ExtractedText::Prose("sender,message".to_string()));
    }

    #[test]
    fn test_parse_csv_row_quoting() {
        assert_eq!(
            parse_csv_row(r#"a,"b, c","say ""hi""""#),
            vec!["a", "b, c", r#"say "hi""#]
        );
    }
}
