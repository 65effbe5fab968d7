//! JSON output writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::MatchRecord;
use crate::error::Result;

/// Writes matches to a pretty-printed JSON array.
///
/// # Format
/// ```json
/// [
///   {"group": "Rust Chat", "sender": "Unknown", "message_id": 42, ...}
/// ]
/// ```
pub fn write_json(matches: &[MatchRecord], output_path: impl AsRef<Path>) -> Result<()> {
    let mut file = BufWriter::new(File::create(output_path)?);
    serde_json::to_writer_pretty(&mut file, matches)?;
    file.write_all(b"\n")?;
    file.flush()?;
    Ok(())
}

/// Converts matches to a pretty-printed JSON array.
pub fn to_json(matches: &[MatchRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(matches)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_to_json_roundtrips_fields() {
        let record = MatchRecord {
            group: "g".into(),
            group_link: "@g".into(),
            sender: "Unknown".into(),
            message_id: 7,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            text: "needle".into(),
            url: None,
            views: 0,
            forwards: 0,
            replies: 0,
            reactions: 0,
        };

        let json = to_json(std::slice::from_ref(&record)).unwrap();
        assert!(!json.contains("\"url\""));

        let parsed: Vec<MatchRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![record]);
    }

    #[test]
    fn test_empty_array() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }
}
