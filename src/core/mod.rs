//! Search engine internals.
//!
//! - [`filter`] - keyword and date-range predicates
//! - [`pager`] - rate-limited history pagination
//! - [`sender`] - sender name resolution
//! - [`distribute`] - round-robin group assignment
//! - [`aggregate`] - merging and ordering of results
//! - [`stats`] - activity statistics
//! - [`output`] - export writers (CSV, Excel, JSON, JSONL)

pub mod aggregate;
pub mod distribute;
pub mod filter;
pub mod output;
pub mod pager;
pub mod sender;
pub mod stats;

pub use aggregate::{ResultAggregator, aggregate};
pub use distribute::distribute;
pub use filter::{DateRange, KeywordFilter};
pub use pager::{FetchCursor, RateLimitedPager};
pub use sender::{SenderProfile, SenderResolver};
pub use stats::{ActivityStats, DailyActivity, SenderActivity};

#[cfg(feature = "csv-output")]
pub use output::{to_csv, write_csv};
#[cfg(feature = "json-output")]
pub use output::{to_json, to_jsonl, write_json, write_jsonl};
#[cfg(feature = "xlsx-output")]
pub use output::{to_xlsx_bytes, write_xlsx};
