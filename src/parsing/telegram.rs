//! Telegram Desktop export model.
//!
//! A single-chat export (`result.json`) looks like:
//!
//! ```json
//! {
//!   "name": "Rust Chat",
//!   "type": "public_supergroup",
//!   "id": 1234567,
//!   "messages": [
//!     {"id": 1, "type": "message", "date_unixtime": "1705314600",
//!      "from": "Alice", "from_id": "user1001", "text": "Hello!"}
//!   ]
//! }
//! ```
//!
//! `views`, `forwards` and `replies` are read when present (channel exports
//! and generated fixtures carry them) and default to 0.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::MessageRecord;

/// Raw exported message.
#[derive(Debug, Deserialize)]
pub struct TelegramRawMessage {
    pub id: Option<u64>,
    /// `"message"` or `"service"`
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Local time, `2024-01-15T10:30:00`
    pub date: Option<String>,
    /// Unix timestamp as string
    pub date_unixtime: Option<String>,
    /// Sender display name
    pub from: Option<String>,
    /// Sender id, `user123` or `channel123`
    pub from_id: Option<String>,
    /// String or array of strings and entity objects
    pub text: Option<Value>,
    #[serde(default)]
    pub views: Option<u64>,
    #[serde(default)]
    pub forwards: Option<u64>,
    #[serde(default)]
    pub replies: Option<u64>,
    /// One entry per reaction kind
    #[serde(default)]
    pub reactions: Vec<TelegramReaction>,
}

/// Reaction counter in an exported message.
#[derive(Debug, Deserialize)]
pub struct TelegramReaction {
    #[serde(default)]
    pub count: u64,
}

/// Export wrapper.
#[derive(Debug, Deserialize)]
pub struct TelegramExport {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub chat_type: Option<String>,
    pub id: Option<i64>,
    #[serde(default)]
    pub messages: Vec<TelegramRawMessage>,
}

/// Flattens Telegram's `text` field into one string.
///
/// ```ignore
/// use serde_json::json;
///
/// let complex = json!(["Check this: ", {"type": "link", "text": "https://example.com"}]);
/// assert_eq!(extract_telegram_text(&complex), "Check this: https://example.com");
/// ```
pub fn extract_telegram_text(text_value: &Value) -> String {
    match text_value {
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj
                    .get("text")
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string),
                _ => None,
            })
            .collect::<String>(),
        _ => String::new(),
    }
}

/// Parses a Unix timestamp string such as `"1705314600"`.
pub fn parse_unix_timestamp(ts_str: &str) -> Option<DateTime<Utc>> {
    ts_str
        .parse::<i64>()
        .ok()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}

/// Parses the `date` field, read as UTC.
fn parse_iso_date(date: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Converts a raw message into a [`MessageRecord`].
///
/// Returns `None` for service messages and for messages without an id or a
/// readable date. Media-only messages are kept with no text.
pub fn parse_telegram_message(msg: &TelegramRawMessage) -> Option<MessageRecord> {
    if msg.msg_type != "message" {
        return None;
    }

    let id = msg.id?;
    let timestamp = msg
        .date_unixtime
        .as_deref()
        .and_then(parse_unix_timestamp)
        .or_else(|| msg.date.as_deref().and_then(parse_iso_date))?;

    let mut record = MessageRecord::new(id, timestamp)
        .with_views(msg.views.unwrap_or(0))
        .with_forwards(msg.forwards.unwrap_or(0))
        .with_replies(msg.replies.unwrap_or(0))
        .with_reactions(msg.reactions.iter().map(|r| r.count).sum());

    let text = msg.text.as_ref().map(extract_telegram_text).unwrap_or_default();
    if !text.trim().is_empty() {
        record = record.with_text(text);
    }
    if let Some(sender) = msg.from_id.as_deref().or(msg.from.as_deref()) {
        record = record.with_sender(sender);
    }

    Some(record)
}
