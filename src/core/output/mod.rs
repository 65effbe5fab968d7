//! Export writers for match sets.
//!
//! - [`write_csv`] / [`to_csv`] - comma-separated CSV (`csv-output` feature)
//! - [`write_xlsx`] / [`to_xlsx_bytes`] - Excel workbook (`xlsx-output` feature)
//! - [`write_json`] / [`to_json`] - JSON array (`json-output` feature)
//! - [`write_jsonl`] / [`to_jsonl`] - JSON Lines (`json-output` feature)
//!
//! The tabular writers share the column layout in [`HEADER`]:
//! Group, Group link, Sender, Date, Text, Message link, Views, Forwards, Replies.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "xlsx-output", feature = "json-output"))]
//! # fn main() -> chatgrep::Result<()> {
//! use chatgrep::core::output::{write_jsonl, write_xlsx};
//! use chatgrep::MatchRecord;
//!
//! let matches: Vec<MatchRecord> = Vec::new();
//!
//! write_xlsx(&matches, "results.xlsx")?;
//! write_jsonl(&matches, "results.jsonl")?;
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "xlsx-output", feature = "json-output")))]
//! # fn main() {}
//! ```

#[cfg(feature = "csv-output")]
mod csv_writer;
#[cfg(feature = "json-output")]
mod json_writer;
#[cfg(feature = "json-output")]
mod jsonl_writer;
#[cfg(feature = "xlsx-output")]
mod xlsx_writer;

#[cfg(feature = "csv-output")]
pub use csv_writer::{to_csv, write_csv};
#[cfg(feature = "json-output")]
pub use json_writer::{to_json, write_json};
#[cfg(feature = "json-output")]
pub use jsonl_writer::{to_jsonl, write_jsonl};
#[cfg(feature = "xlsx-output")]
pub use xlsx_writer::{SHEET_NAME, to_xlsx_bytes, write_xlsx};

/// Column titles, in output order.
pub const HEADER: [&str; 9] = [
    "Group",
    "Group link",
    "Sender",
    "Date",
    "Text",
    "Message link",
    "Views",
    "Forwards",
    "Replies",
];

/// Date column format.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
