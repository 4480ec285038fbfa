//! Format classification and segmentation for mnemo.
//!
//! Given validated raw text, this crate decides whether it is
//! conversational or prose, and splits it into overlapping,
//! context-preserving fragments:
//!
//! - [`classify_text`] recognises chat logs structurally (never by
//!   extension) and returns the evidence behind the decision
//! - [`segment_prose`] accumulates blank-line paragraphs to a word
//!   budget and repeats whole trailing paragraphs as overlap
//! - [`segment_chat`] accumulates whole turns, carries trailing turns
//!   across size boundaries, and hard-closes at conversation
//!   boundaries so unrelated conversations never share a fragment
//!
//! Both modes emit fragments in source order with every input
//! character landing in at least one fragment.

pub mod chat;
pub mod classify;
pub mod prose;

pub use chat::{segment_chat, ChatItem};
pub use classify::{classify_text, parse_chat_lines, Classification, Evidence, PatternKind, TextShape};
pub use prose::segment_prose;
