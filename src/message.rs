//! Message records flowing through the extraction pipeline.
//!
//! - [`MessageRecord`] is what a history provider returns for each message. It
//!   is transient: the pipeline filters it and drops it within one batch.
//! - [`MatchRecord`] is a message that passed the keyword filter, enriched with
//!   the sender's display name and a permalink. It is what gets exported.
//!
//! # Examples
//!
//! ```
//! use chatgrep::MessageRecord;
//! use chrono::{TimeZone, Utc};
//!
//! let msg = MessageRecord::new(42, Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
//!     .with_text("Selling a bike, DM me")
//!     .with_sender("user1001")
//!     .with_views(120);
//!
//! assert_eq!(msg.text(), Some("Selling a bike, DM me"));
//! assert_eq!(msg.views, 120);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque reference to a message author, as handed out by the provider.
///
/// Only the provider knows how to turn it into a profile; the pipeline just
/// passes it back through [`HistorySource::get_sender`](crate::source::HistorySource::get_sender).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SenderRef(pub String);

impl SenderRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SenderRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message fetched from a group's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Provider message id. Ids grow with time inside one chat.
    pub id: u64,

    /// When the message was sent.
    pub timestamp: DateTime<Utc>,

    /// Text content. Media-only and service messages have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Author reference. Absent for anonymous admins and channel posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<SenderRef>,

    /// View counter (channels only, 0 otherwise).
    #[serde(default)]
    pub views: u64,

    /// Forward counter.
    #[serde(default)]
    pub forwards: u64,

    /// Number of replies in the discussion thread.
    #[serde(default)]
    pub replies: u64,

    /// Reactions of all kinds, summed.
    #[serde(default)]
    pub reactions: u64,
}

impl MessageRecord {
    /// Creates a message with no text, no sender and zeroed counters.
    pub fn new(id: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            text: None,
            sender: None,
            views: 0,
            forwards: 0,
            replies: 0,
            reactions: 0,
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(SenderRef::new(sender));
        self
    }

    #[must_use]
    pub fn with_views(mut self, views: u64) -> Self {
        self.views = views;
        self
    }

    #[must_use]
    pub fn with_forwards(mut self, forwards: u64) -> Self {
        self.forwards = forwards;
        self
    }

    #[must_use]
    pub fn with_replies(mut self, replies: u64) -> Self {
        self.replies = replies;
        self
    }

    #[must_use]
    pub fn with_reactions(mut self, reactions: u64) -> Self {
        self.reactions = reactions;
        self
    }

    /// Returns the text, treating an empty string as absent.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// A message that matched the search, ready for export.
///
/// Immutable once built; owned by the aggregated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Group or channel title
    pub group: String,

    /// The link line the group was requested with
    pub group_link: String,

    /// Resolved sender display name, or the locale placeholder
    pub sender: String,

    /// Provider message id
    pub message_id: u64,

    /// When the message was sent
    pub timestamp: DateTime<Utc>,

    /// Full message text
    pub text: String,

    /// Public permalink, when the group has a username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub views: u64,

    #[serde(default)]
    pub forwards: u64,

    #[serde(default)]
    pub replies: u64,

    #[serde(default)]
    pub reactions: u64,
}
