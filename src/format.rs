//! Export format selection.
//!
//! # Example
//!
//! ```rust
//! # #[cfg(all(feature = "csv-output", feature = "json-output"))]
//! # fn example() -> chatgrep::Result<()> {
//! use chatgrep::format::{OutputFormat, to_format_string};
//! use chatgrep::MatchRecord;
//!
//! let matches: Vec<MatchRecord> = Vec::new();
//! let csv = to_format_string(&matches, OutputFormat::Csv)?;
//! assert!(csv.starts_with("Group,"));
//!
//! let format = OutputFormat::from_path("results.jsonl")?;
//! assert_eq!(format, OutputFormat::Jsonl);
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::MatchRecord;
use crate::error::ChatgrepError;

/// Output format for match exports.
///
/// - [`Csv`](OutputFormat::Csv) - comma-separated, UTF-8
/// - [`Excel`](OutputFormat::Excel) - `.xlsx` workbook
/// - [`Json`](OutputFormat::Json) - a JSON array
/// - [`Jsonl`](OutputFormat::Jsonl) - one JSON object per line
///
/// ```rust
/// use chatgrep::format::OutputFormat;
/// use std::str::FromStr;
///
/// let format = OutputFormat::from_str("xlsx").unwrap();
/// assert_eq!(format, OutputFormat::Excel);
/// assert_eq!(format.extension(), "xlsx");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum OutputFormat {
    #[default]
    Csv,
    Excel,
    Json,
    Jsonl,
}

impl OutputFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Excel => "xlsx",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }

    pub fn all_names() -> &'static [&'static str] {
        &["csv", "excel", "json", "jsonl"]
    }

    /// Detects the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ChatgrepError> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" => Ok(OutputFormat::Excel),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(ChatgrepError::invalid_format(
                "output",
                format!("Unknown file extension: '.{}'. Expected one of: csv, xlsx, json, jsonl", ext),
            )),
        }
    }

    #[cfg(not(all(feature = "csv-output", feature = "json-output", feature = "xlsx-output")))]
    fn required_feature(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv-output",
            OutputFormat::Excel => "xlsx-output",
            OutputFormat::Json | OutputFormat::Jsonl => "json-output",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "CSV"),
            OutputFormat::Excel => write!(f, "Excel"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Jsonl => write!(f, "JSONL"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "excel" | "xlsx" => Ok(OutputFormat::Excel),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(format!(
                "Unknown format: '{}'. Expected one of: {}",
                s,
                OutputFormat::all_names().join(", ")
            )),
        }
    }
}

/// Writes matches to `path` in the given format.
///
/// # Errors
///
/// Fails when the format's feature is disabled or the file cannot be written.
#[cfg_attr(
    not(all(feature = "csv-output", feature = "json-output", feature = "xlsx-output")),
    allow(unused_variables)
)]
pub fn write_to_format(
    matches: &[MatchRecord],
    path: impl AsRef<Path>,
    format: OutputFormat,
) -> Result<(), ChatgrepError> {
    match format {
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::core::output::write_csv(matches, path),
        #[cfg(feature = "xlsx-output")]
        OutputFormat::Excel => crate::core::output::write_xlsx(matches, path),
        #[cfg(feature = "json-output")]
        OutputFormat::Json => crate::core::output::write_json(matches, path),
        #[cfg(feature = "json-output")]
        OutputFormat::Jsonl => crate::core::output::write_jsonl(matches, path),
        #[cfg(not(all(feature = "csv-output", feature = "json-output", feature = "xlsx-output")))]
        _ => Err(feature_disabled(format)),
    }
}

/// Renders matches to a string in the given format.
///
/// # Errors
///
/// Fails for binary formats, which have no text rendering, and when the
/// format's feature is disabled.
#[cfg_attr(
    not(all(feature = "csv-output", feature = "json-output")),
    allow(unused_variables)
)]
pub fn to_format_string(matches: &[MatchRecord], format: OutputFormat) -> Result<String, ChatgrepError> {
    match format {
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::core::output::to_csv(matches),
        OutputFormat::Excel => Err(ChatgrepError::invalid_format(
            "output",
            "Excel output is a binary workbook and can only be written to a file",
        )),
        #[cfg(feature = "json-output")]
        OutputFormat::Json => crate::core::output::to_json(matches),
        #[cfg(feature = "json-output")]
        OutputFormat::Jsonl => crate::core::output::to_jsonl(matches),
        #[cfg(not(all(feature = "csv-output", feature = "json-output")))]
        _ => Err(feature_disabled(format)),
    }
}

#[cfg(not(all(feature = "csv-output", feature = "json-output", feature = "xlsx-output")))]
fn feature_disabled(format: OutputFormat) -> ChatgrepError {
    ChatgrepError::invalid_format(
        "output",
        format!(
            "Output format {:?} requires the '{}' feature to be enabled",
            format,
            format.required_feature()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_from_str() {
        assert_eq!(OutputFormat::from_str("csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_str("Excel").unwrap(), OutputFormat::Excel);
        assert_eq!(OutputFormat::from_str("ndjson").unwrap(), OutputFormat::Jsonl);
        assert!(OutputFormat::from_str("pdf").is_err());
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(OutputFormat::from_path("out.csv").unwrap(), OutputFormat::Csv);
        assert_eq!(OutputFormat::from_path("/tmp/x/out.JSON").unwrap(), OutputFormat::Json);
        assert_eq!(OutputFormat::from_path("out.ndjson").unwrap(), OutputFormat::Jsonl);
        assert_eq!(OutputFormat::from_path("report.XLSX").unwrap(), OutputFormat::Excel);
        assert!(OutputFormat::from_path("out.txt").is_err());
        assert!(OutputFormat::from_path("no_extension").is_err());
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(OutputFormat::Excel.extension(), "xlsx");
        assert_eq!(OutputFormat::Jsonl.extension(), "jsonl");
        assert_eq!(OutputFormat::Excel.to_string(), "Excel");
    }

    #[test]
    fn test_format_serde() {
        assert_eq!(serde_json::to_string(&OutputFormat::Excel).unwrap(), "\"excel\"");
        let parsed: OutputFormat = serde_json::from_str("\"jsonl\"").unwrap();
        assert_eq!(parsed, OutputFormat::Jsonl);
    }

    #[cfg(all(feature = "csv-output", feature = "json-output"))]
    #[test]
    fn test_to_format_string_dispatch() {
        assert!(to_format_string(&[], OutputFormat::Csv).unwrap().starts_with("Group,"));
        let err = to_format_string(&[], OutputFormat::Excel).unwrap_err();
        assert!(matches!(err, ChatgrepError::InvalidFormat { .. }));
        assert_eq!(to_format_string(&[], OutputFormat::Json).unwrap(), "[]");
        assert_eq!(to_format_string(&[], OutputFormat::Jsonl).unwrap(), "");
    }
}
