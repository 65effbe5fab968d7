//! History-fetch boundary.
//!
//! [`HistorySource`] is what the pipeline needs from a messaging client:
//! resolve a group, page its history and look up message authors. Every call
//! answers with data or one of the [`FetchError`] tags, so retry and abort
//! decisions never depend on client-specific exception types.
//!
//! [`ExportHistorySource`] is an offline implementation backed by Telegram
//! Desktop JSON exports (requires the `export-source` feature).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::sender::SenderProfile;
use crate::error::FetchError;
use crate::link::GroupTarget;
use crate::message::{MessageRecord, SenderRef};
use crate::session::Session;

#[cfg(feature = "export-source")]
mod export;

#[cfg(feature = "export-source")]
pub use export::ExportHistorySource;

/// A group or channel the session can read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Provider peer id
    pub id: i64,
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Public username, if the group has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl GroupInfo {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            title: None,
            username: None,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Public link to a message, available only for groups with a username.
    ///
    /// ```
    /// use chatgrep::source::GroupInfo;
    ///
    /// let group = GroupInfo::new(1).with_username("rustaceans");
    /// assert_eq!(group.permalink(42).as_deref(), Some("https://t.me/rustaceans/42"));
    /// assert_eq!(GroupInfo::new(2).permalink(42), None);
    /// ```
    pub fn permalink(&self, message_id: u64) -> Option<String> {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| format!("https://t.me/{}/{}", u, message_id))
    }
}

/// Read access to chat history through one session.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Resolves a parsed link to a readable group, joining via invite if needed.
    async fn resolve_group(
        &self,
        session: &Session,
        target: &GroupTarget,
    ) -> Result<GroupInfo, FetchError>;

    /// Returns up to `limit` messages older than `before_id`, newest first.
    ///
    /// `before_id == 0` means "start from the most recent message". An empty
    /// vector means the history is exhausted.
    async fn get_history(
        &self,
        session: &Session,
        group: &GroupInfo,
        before_id: u64,
        limit: usize,
    ) -> Result<Vec<MessageRecord>, FetchError>;

    /// Looks up a message author.
    async fn get_sender(
        &self,
        session: &Session,
        sender: &SenderRef,
    ) -> Result<SenderProfile, FetchError>;
}
