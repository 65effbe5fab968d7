//! # Chatgrep
//!
//! Search Telegram groups and channels for messages matching a keyword or a
//! regular expression, spreading the work over several accounts and
//! respecting the server's flood-wait limits.
//!
//! ## Overview
//!
//! A run takes a list of group links, a [`SearchConfig`](config::SearchConfig)
//! and a set of authorized sessions:
//!
//! - links are normalized by [`link::parse_link`] (`@name`, `t.me/name`,
//!   `t.me/+hash`, `t.me/joinchat/hash`, bare names)
//! - groups are assigned round-robin to sessions
//! - each session pages its groups' history newest-first through a
//!   [`RateLimitedPager`](core::pager::RateLimitedPager), waiting out flood
//!   waits and pausing between batches
//! - messages pass the date window, then the [`KeywordFilter`](core::filter::KeywordFilter)
//! - matches get a sender name and a permalink, and are merged newest-first
//!
//! The messaging client itself sits behind two traits,
//! [`HistorySource`](source::HistorySource) and
//! [`SessionLifecycle`](session::SessionLifecycle).
//! [`ExportHistorySource`](source::ExportHistorySource) implements both over
//! Telegram Desktop JSON exports.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "export-source", feature = "xlsx-output"))]
//! # async fn example() -> chatgrep::Result<()> {
//! use chatgrep::prelude::*;
//!
//! let provider = ExportHistorySource::new("exports");
//! let accounts = vec![AccountConfig::new("12345", "0123abcd", "+15550100")];
//! let auth = authorize_accounts(&provider, &accounts, &NoCodes).await;
//!
//! let search = SearchConfig::new("hiring").with_message_cap(500);
//! let request = ExtractionRequest::new("@rust_jobs\nhttps://t.me/+AbCdEf", search);
//!
//! let progress = ProgressEstimator::new();
//! let report = run_extraction(&provider, &request, auth.sessions, &progress).await?;
//!
//! write_to_format(&report.matches, "matches.xlsx", OutputFormat::Excel)?;
//! for failure in &report.failures {
//!     eprintln!("skipped {}", failure);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - [`extract`] - [`run_extraction`](extract::run_extraction), the pipeline entry point
//! - [`link`] - group link parsing
//! - [`config`] - [`SearchConfig`](config::SearchConfig), accounts, JSON config files
//! - [`session`] - session lifecycle boundary and [`authorize_accounts`](session::authorize_accounts)
//! - [`source`] - history-fetch boundary and the export-backed provider
//! - [`core`] - filtering, pagination, sender resolution, distribution,
//!   aggregation, statistics and export writers
//! - [`progress`] - completion fraction and remaining-time estimate
//! - [`format`] - [`OutputFormat`](format::OutputFormat) and format dispatch
//! - [`error`] - [`ChatgrepError`], [`FetchError`](error::FetchError), [`Result`]
//! - [`prelude`] - convenient re-exports

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod format;
pub mod link;
pub mod message;
#[cfg(feature = "export-source")]
pub mod parsing;
pub mod progress;
pub mod session;
pub mod source;

pub use error::{ChatgrepError, Result};
pub use message::{MatchRecord, MessageRecord};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatgrep::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{MatchRecord, MessageRecord};

    pub use crate::error::{ChatgrepError, FetchError, GroupFailure, Result};

    pub use crate::config::{AccountConfig, AppConfig, Locale, MatchMode, SearchConfig};

    pub use crate::link::{GroupRef, GroupTarget, parse_link, parse_links};

    pub use crate::session::{
        AuthOutcome, AuthState, CodeSource, NoCodes, Session, SessionLifecycle, authorize_accounts,
    };

    pub use crate::source::{GroupInfo, HistorySource};
    #[cfg(feature = "export-source")]
    pub use crate::source::ExportHistorySource;

    pub use crate::core::{
        ActivityStats, DateRange, KeywordFilter, RateLimitedPager, SenderProfile, aggregate,
        distribute,
    };

    pub use crate::extract::{ExtractionReport, ExtractionRequest, Provider, RunStats, run_extraction};

    pub use crate::progress::{ProgressEstimator, ProgressSnapshot};

    pub use crate::format::{OutputFormat, to_format_string, write_to_format};
}
