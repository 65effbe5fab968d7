//! Parsing of exported chat history.

pub mod telegram;

pub use telegram::{TelegramExport, TelegramRawMessage, TelegramReaction, extract_telegram_text, parse_telegram_message};
