//! Configuration types for searches, accounts and the CLI.
//!
//! This module provides plain serde structs for library usage, without any
//! CLI framework dependencies. All state a run needs is passed in through
//! these values; nothing is kept in globals between runs.
//!
//! - [`SearchConfig`] - pattern, pagination and throttling knobs
//! - [`AccountConfig`] - credentials for one account
//! - [`AppConfig`] - everything the CLI can load from a JSON file
//!
//! # Example
//!
//! ```rust
//! use chatgrep::config::{MatchMode, SearchConfig};
//!
//! let config = SearchConfig::new("selling")
//!     .with_mode(MatchMode::Regex)
//!     .with_message_cap(500)
//!     .with_batch_size(50)
//!     .with_inter_batch_delay(1.5);
//!
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::filter::DateRange;
use crate::error::{ChatgrepError, Result};

/// Messages checked per group when no cap is given.
pub const DEFAULT_MESSAGE_CAP: usize = 1000;

/// Messages requested per history call.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Pause after every non-empty batch, in seconds.
pub const DEFAULT_INTER_BATCH_DELAY: f64 = 2.0;

/// How the keyword is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Plain substring search
    #[default]
    Literal,
    /// Regular expression (`regex` crate syntax)
    Regex,
}

/// Language for placeholder strings such as the unknown-sender name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    /// Placeholder used when a sender cannot be resolved.
    pub fn unknown_sender(self) -> &'static str {
        match self {
            Locale::En => "Unknown",
            Locale::Ru => "Неизвестно",
        }
    }

    /// Placeholder used when a group has no title.
    pub fn unknown_group(self) -> &'static str {
        match self {
            Locale::En => "Unknown group",
            Locale::Ru => "Неизвестная группа",
        }
    }
}

/// Configuration for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Keyword or regular expression to search for
    pub keyword: String,

    /// How `keyword` is interpreted (default: literal)
    pub mode: MatchMode,

    /// Match case exactly (default: false)
    pub case_sensitive: bool,

    /// Messages to check per group, 0 = unbounded (default: 1000)
    pub message_cap: usize,

    /// Messages per history request (default: 100)
    pub batch_size: usize,

    /// Pause after each non-empty batch in seconds (default: 2.0)
    pub inter_batch_delay: f64,

    /// Inclusive date window applied before keyword matching
    pub date_range: DateRange,

    /// Language for placeholders (default: en)
    pub locale: Locale,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            mode: MatchMode::Literal,
            case_sensitive: false,
            message_cap: DEFAULT_MESSAGE_CAP,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            date_range: DateRange::default(),
            locale: Locale::En,
        }
    }
}

impl SearchConfig {
    /// Creates a literal, case-insensitive search with default limits.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Sets the per-group message cap. 0 means unbounded.
    #[must_use]
    pub fn with_message_cap(mut self, cap: usize) -> Self {
        self.message_cap = cap;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the pause after each non-empty batch, in seconds.
    #[must_use]
    pub fn with_inter_batch_delay(mut self, seconds: f64) -> Self {
        self.inter_batch_delay = seconds;
        self
    }

    #[must_use]
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    #[must_use]
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// The inter-batch delay as a [`Duration`].
    ///
    /// Negative and NaN delays read as zero; delays too large for a
    /// [`Duration`] saturate. [`validate`](Self::validate) rejects both.
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.inter_batch_delay.max(0.0)).unwrap_or(Duration::MAX)
    }

    /// Checks numeric limits and the date window.
    ///
    /// The pattern itself is validated when the keyword filter is compiled.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ChatgrepError::invalid_config("batch_size must be positive"));
        }
        if self.inter_batch_delay < 0.0 || Duration::try_from_secs_f64(self.inter_batch_delay).is_err() {
            return Err(ChatgrepError::invalid_config(format!(
                "inter_batch_delay must be a non-negative number of seconds, got {}",
                self.inter_batch_delay
            )));
        }
        if let (Some(from), Some(to)) = (self.date_range.from, self.date_range.to) {
            if from > to {
                return Err(ChatgrepError::invalid_config(format!(
                    "date range starts after it ends ({} > {})",
                    from.format("%Y-%m-%d"),
                    to.format("%Y-%m-%d")
                )));
            }
        }
        Ok(())
    }
}

/// Credentials for one account.
///
/// Accounts missing an API id, API hash or phone are ignored when building
/// the session pool.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Display label; falls back to the phone number
    pub label: Option<String>,
    pub api_id: String,
    pub api_hash: String,
    /// Phone number including country code
    pub phone: String,
    /// Cloud password for accounts with two-step verification
    pub password: Option<String>,
}

impl AccountConfig {
    pub fn new(
        api_id: impl Into<String>,
        api_hash: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            label: None,
            api_id: api_id.into(),
            api_hash: api_hash.into(),
            phone: phone.into(),
            password: None,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Returns `true` if every credential needed to sign in is present.
    pub fn is_complete(&self) -> bool {
        !self.api_id.trim().is_empty()
            && !self.api_hash.trim().is_empty()
            && !self.phone.trim().is_empty()
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.phone)
    }
}

/// Everything the CLI can read from a config file.
///
/// ```json
/// {
///   "accounts": [{"api_id": "1", "api_hash": "abc", "phone": "+100"}],
///   "links": ["@rustaceans", "https://t.me/+AbCd"],
///   "search": {"keyword": "hiring", "message_cap": 0},
///   "export_dir": "exports"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub accounts: Vec<AccountConfig>,
    pub links: Vec<String>,
    pub search: SearchConfig,
    pub export_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Accounts with complete credentials, in file order.
    pub fn active_accounts(&self) -> Vec<&AccountConfig> {
        self.accounts.iter().filter(|a| a.is_complete()).collect()
    }

    /// Reads a JSON config file.
    #[cfg(any(feature = "json-output", feature = "export-source"))]
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}
