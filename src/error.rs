//! Unified error types for chatgrep.
//!
//! Two enums live here:
//!
//! - [`ChatgrepError`] covers everything that aborts a whole run or a whole
//!   export: invalid patterns, bad configuration, missing sessions, I/O.
//! - [`FetchError`] is the closed set of outcomes a history provider may
//!   signal. The pager's retry/abort decision is a pure function of its tag.
//!
//! # Error Handling Philosophy
//!
//! - **Fatal** errors are returned before any network activity where possible
//! - **Per-group** failures never abort sibling groups; they are collected as
//!   [`GroupFailure`] warnings next to the partial result
//! - **Rate limits** are always absorbed by waiting, never surfaced

use std::io;

use serde::Serialize;
use thiserror::Error;

/// A specialized [`Result`] type for chatgrep operations.
///
/// # Example
///
/// ```rust
/// use chatgrep::error::Result;
/// use chatgrep::MatchRecord;
///
/// fn my_function() -> Result<Vec<MatchRecord>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, ChatgrepError>;

/// The error type for all fatal chatgrep operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ChatgrepError {
    /// An I/O error occurred (reading links, configs, exports; writing output).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The search pattern is not a valid regular expression.
    ///
    /// Reported before any group is fetched.
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as supplied by the caller
        pattern: String,
        /// The underlying regex compilation error
        #[source]
        source: regex::Error,
    },

    /// The keyword is empty or whitespace-only.
    #[error("Search keyword is empty")]
    EmptyKeyword,

    /// Invalid date in a date-range filter.
    ///
    /// Date filters expect YYYY-MM-DD format.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// None of the supplied group links could be parsed.
    #[error("No valid group links were supplied")]
    NoTargets,

    /// No session reached the authorized state.
    #[error("No active accounts: at least one authorized session is required")]
    NoActiveSessions,

    /// Authentication failed for an account.
    #[error("Authentication failed for {account}: {reason}")]
    Auth {
        /// Account label
        account: String,
        /// What went wrong
        reason: String,
    },

    /// The file or output format doesn't match the expected structure.
    #[error("Invalid {format} format: {message}")]
    InvalidFormat {
        /// The format that was expected
        format: &'static str,
        /// Description of what's wrong
        message: String,
    },

    /// CSV writing error.
    #[cfg(feature = "csv-output")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Excel workbook writing error.
    #[cfg(feature = "xlsx-output")]
    #[error("Excel error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// JSON parsing/serialization error.
    #[cfg(any(feature = "json-output", feature = "export-source"))]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error in {context}: {source}")]
    Utf8 {
        /// Description of where the error occurred
        context: String,
        /// The underlying UTF-8 error
        #[source]
        source: std::string::FromUtf8Error,
    },
}

impl From<std::string::FromUtf8Error> for ChatgrepError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        ChatgrepError::Utf8 {
            context: "output conversion".to_string(),
            source: err,
        }
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ChatgrepError {
    /// Creates an invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        ChatgrepError::InvalidPattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        ChatgrepError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        ChatgrepError::InvalidConfig(message.into())
    }

    /// Creates an invalid format error.
    pub fn invalid_format(format: &'static str, message: impl Into<String>) -> Self {
        ChatgrepError::InvalidFormat {
            format,
            message: message.into(),
        }
    }

    /// Creates an authentication error.
    pub fn auth(account: impl Into<String>, reason: impl Into<String>) -> Self {
        ChatgrepError::Auth {
            account: account.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this is an I/O error.
    pub fn is_io(&self) -> bool {
        matches!(self, ChatgrepError::Io(_))
    }

    /// Returns `true` if the search pattern was rejected.
    pub fn is_invalid_pattern(&self) -> bool {
        matches!(
            self,
            ChatgrepError::InvalidPattern { .. } | ChatgrepError::EmptyKeyword
        )
    }

    /// Returns `true` if this is a date parsing error.
    pub fn is_invalid_date(&self) -> bool {
        matches!(self, ChatgrepError::InvalidDate { .. })
    }

    /// Returns `true` if the run could not start for lack of sessions.
    pub fn is_no_active_sessions(&self) -> bool {
        matches!(self, ChatgrepError::NoActiveSessions)
    }
}

/// Outcome tags a history provider may return instead of data.
///
/// ```rust
/// use chatgrep::error::FetchError;
///
/// let err = FetchError::RateLimited { seconds: 30 };
/// assert!(err.is_retryable());
/// assert!(!FetchError::unavailable("private channel").is_retryable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The provider asked us to slow down for `seconds`.
    #[error("rate limited, retry after {seconds}s")]
    RateLimited {
        /// Mandated wait in seconds
        seconds: u64,
    },

    /// The group cannot be read: invalid username, private, banned, fake.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Anything else the provider could not recover from.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl FetchError {
    /// Creates an [`Unavailable`](FetchError::Unavailable) error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        FetchError::Unavailable(reason.into())
    }

    /// Creates a [`Fatal`](FetchError::Fatal) error.
    pub fn fatal(reason: impl Into<String>) -> Self {
        FetchError::Fatal(reason.into())
    }

    /// Returns `true` if the request should be reissued after waiting.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::RateLimited { .. })
    }
}

/// A group that could not be processed, reported alongside partial results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupFailure {
    /// The raw link line the group came from
    pub link: String,
    /// Label of the session that tried to process it
    pub session: String,
    /// Human-readable reason
    pub reason: String,
}

impl std::fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (via {}): {}", self.link, self.session, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let regex_err = regex::Regex::new("(unclosed").unwrap_err();
        let err = ChatgrepError::invalid_pattern("(unclosed", regex_err);
        let display = err.to_string();
        assert!(display.contains("(unclosed"));
        assert!(err.is_invalid_pattern());
    }

    #[test]
    fn test_invalid_date_display() {
        let err = ChatgrepError::invalid_date("not-a-date");
        let display = err.to_string();
        assert!(display.contains("not-a-date"));
        assert!(display.contains("YYYY-MM-DD"));
        assert!(err.is_invalid_date());
    }

    #[test]
    fn test_no_active_sessions() {
        let err = ChatgrepError::NoActiveSessions;
        assert!(err.is_no_active_sessions());
        assert!(err.to_string().contains("No active accounts"));
    }

    #[test]
    fn test_auth_display() {
        let err = ChatgrepError::auth("+100200300", "2FA password required");
        let display = err.to_string();
        assert!(display.contains("+100200300"));
        assert!(display.contains("2FA"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err = ChatgrepError::from(io_err);
        assert!(err.is_io());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_utf8_error() {
        let utf8_err = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err: ChatgrepError = utf8_err.into();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[cfg(feature = "csv-output")]
    #[test]
    fn test_from_csv_error() {
        let csv_err = csv::Error::from(io::Error::other("test"));
        let err: ChatgrepError = csv_err.into();
        assert!(err.to_string().contains("CSV error"));
    }

    #[cfg(any(feature = "json-output", feature = "export-source"))]
    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: ChatgrepError = json_err.into();
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_fetch_error_tags() {
        assert!(FetchError::RateLimited { seconds: 1 }.is_retryable());
        assert!(!FetchError::unavailable("gone").is_retryable());
        assert!(!FetchError::fatal("boom").is_retryable());
        assert_eq!(
            FetchError::RateLimited { seconds: 42 }.to_string(),
            "rate limited, retry after 42s"
        );
    }

    #[test]
    fn test_group_failure_display() {
        let failure = GroupFailure {
            link: "https://t.me/closed".into(),
            session: "account-1".into(),
            reason: "unavailable: private".into(),
        };
        let display = failure.to_string();
        assert!(display.contains("t.me/closed"));
        assert!(display.contains("account-1"));
    }
}
