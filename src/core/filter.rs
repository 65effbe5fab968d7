//! Keyword and date filters.
//!
//! This module provides [`KeywordFilter`] for matching message text and
//! [`DateRange`] for the optional inclusive date window.
//!
//! # Filter Types
//!
//! | Filter | Constructor | Description |
//! |--------|-------------|-------------|
//! | Literal | [`KeywordFilter::literal`] | Substring, case-insensitive by default |
//! | Regex | [`KeywordFilter::regex`] | `regex` crate syntax, case-insensitive by default |
//! | Date from | [`DateRange::with_date_from`] | Messages on or after date |
//! | Date to | [`DateRange::with_date_to`] | Messages on or before date |
//!
//! # Examples
//!
//! ```
//! use chatgrep::core::filter::KeywordFilter;
//!
//! let filter = KeywordFilter::literal("Hello", false)?;
//! assert!(filter.is_match(Some("say HELLO world")));
//! assert!(!filter.is_match(None));
//! # Ok::<(), chatgrep::ChatgrepError>(())
//! ```
//!
//! # Behavior Notes
//!
//! - Absent or empty text never matches
//! - Invalid patterns are rejected at construction, before any fetching
//! - The date window is applied before keyword matching

use chrono::{DateTime, NaiveDate, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::MessageRecord;
use crate::config::{MatchMode, SearchConfig};
use crate::error::ChatgrepError;

/// Compiled keyword or regular-expression matcher.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    pattern: String,
    mode: MatchMode,
    regex: Regex,
}

impl KeywordFilter {
    /// Builds a substring matcher.
    ///
    /// # Errors
    ///
    /// Returns [`ChatgrepError::EmptyKeyword`] for blank keywords.
    pub fn literal(keyword: &str, case_sensitive: bool) -> Result<Self, ChatgrepError> {
        Self::build(keyword, MatchMode::Literal, case_sensitive)
    }

    /// Builds a regular-expression matcher.
    ///
    /// # Errors
    ///
    /// Returns [`ChatgrepError::InvalidPattern`] if the pattern does not compile.
    pub fn regex(pattern: &str, case_sensitive: bool) -> Result<Self, ChatgrepError> {
        Self::build(pattern, MatchMode::Regex, case_sensitive)
    }

    /// Builds the matcher described by a search configuration.
    pub fn from_config(config: &SearchConfig) -> Result<Self, ChatgrepError> {
        Self::build(&config.keyword, config.mode, config.case_sensitive)
    }

    fn build(pattern: &str, mode: MatchMode, case_sensitive: bool) -> Result<Self, ChatgrepError> {
        if pattern.trim().is_empty() {
            return Err(ChatgrepError::EmptyKeyword);
        }

        let source = match mode {
            MatchMode::Literal => regex::escape(pattern),
            MatchMode::Regex => pattern.to_string(),
        };
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| ChatgrepError::invalid_pattern(pattern, e))?;

        Ok(Self {
            pattern: pattern.to_string(),
            mode,
            regex,
        })
    }

    /// The pattern as supplied.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Returns `true` if `text` is present, non-empty and matches.
    pub fn is_match(&self, text: Option<&str>) -> bool {
        match text {
            Some(t) if !t.is_empty() => self.regex.is_match(t),
            _ => false,
        }
    }

    /// Matches a message's text.
    pub fn matches(&self, msg: &MessageRecord) -> bool {
        self.is_match(msg.text())
    }
}

/// Inclusive date window. No bounds means every message passes.
///
/// # Examples
///
/// ```
/// use chatgrep::core::filter::DateRange;
/// use chrono::{TimeZone, Utc};
///
/// # fn main() -> chatgrep::Result<()> {
/// let range = DateRange::new()
///     .with_date_from("2024-06-01")?
///     .with_date_to("2024-06-30")?;
///
/// assert!(range.contains(Utc.with_ymd_and_hms(2024, 6, 30, 23, 0, 0).unwrap()));
/// assert!(!range.contains(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Include only messages on or after this timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<DateTime<Utc>>,

    /// Include only messages on or before this timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Creates an empty (inactive) range.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the start date (inclusive, start of day UTC).
    ///
    /// # Errors
    ///
    /// Returns [`ChatgrepError::InvalidDate`] if the format is not `YYYY-MM-DD`.
    pub fn with_date_from(mut self, date_str: &str) -> Result<Self, ChatgrepError> {
        let start = parse_date(date_str)?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ChatgrepError::invalid_date(date_str))?;
        self.from = Some(start.and_utc());
        Ok(self)
    }

    /// Sets the end date (inclusive, end of day UTC).
    ///
    /// # Errors
    ///
    /// Returns [`ChatgrepError::InvalidDate`] if the format is not `YYYY-MM-DD`.
    pub fn with_date_to(mut self, date_str: &str) -> Result<Self, ChatgrepError> {
        // End of the day to include the full day
        let end = parse_date(date_str)?
            .and_hms_opt(23, 59, 59)
            .ok_or_else(|| ChatgrepError::invalid_date(date_str))?;
        self.to = Some(end.and_utc());
        Ok(self)
    }

    /// Sets the start timestamp directly.
    #[must_use]
    pub fn with_from(mut self, dt: DateTime<Utc>) -> Self {
        self.from = Some(dt);
        self
    }

    /// Sets the end timestamp directly.
    #[must_use]
    pub fn with_to(mut self, dt: DateTime<Utc>) -> Self {
        self.to = Some(dt);
        self
    }

    /// Returns `true` if any bound is set.
    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Returns `true` if `ts` lies inside the window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        if self.from.is_some_and(|from| ts < from) {
            return false;
        }
        if self.to.is_some_and(|to| ts > to) {
            return false;
        }
        true
    }

    /// Returns `true` if `ts` is older than the window start.
    ///
    /// History is paged newest-first, so once a batch reaches this point
    /// nothing further can match.
    pub fn is_before(&self, ts: DateTime<Utc>) -> bool {
        self.from.is_some_and(|from| ts < from)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate, ChatgrepError> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .map_err(|_| ChatgrepError::invalid_date(date_str))
}
