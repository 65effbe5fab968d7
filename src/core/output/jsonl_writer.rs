//! JSON Lines output writer.
//!
//! One match per line, convenient for `jq`, log shippers and incremental
//! ingestion.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::MatchRecord;
use crate::error::Result;

/// Writes matches as JSON Lines.
pub fn write_jsonl(matches: &[MatchRecord], output_path: impl AsRef<Path>) -> Result<()> {
    let mut writer = BufWriter::new(File::create(output_path)?);
    write_lines(&mut writer, matches)?;
    writer.flush()?;
    Ok(())
}

/// Converts matches to a JSON Lines string.
pub fn to_jsonl(matches: &[MatchRecord]) -> Result<String> {
    let mut buf = Vec::new();
    write_lines(&mut buf, matches)?;
    Ok(String::from_utf8(buf)?)
}

fn write_lines<W: Write>(writer: &mut W, matches: &[MatchRecord]) -> Result<()> {
    for m in matches {
        serde_json::to_writer(&mut *writer, m)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn record(id: u64) -> MatchRecord {
        MatchRecord {
            group: "g".into(),
            group_link: "@g".into(),
            sender: "Unknown".into(),
            message_id: id,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            text: "line one\nline two".into(),
            url: Some(format!("https://t.me/g/{}", id)),
            views: 3,
            forwards: 0,
            replies: 0,
            reactions: 0,
        }
    }

    #[test]
    fn test_one_object_per_line() {
        let jsonl = to_jsonl(&[record(1), record(2)]).unwrap();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: MatchRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.message_id, 2);
        assert_eq!(second.text, "line one\nline two");
    }

    #[test]
    fn test_write_jsonl_file() {
        let temp = NamedTempFile::new().unwrap();
        write_jsonl(&[record(1)], temp.path()).unwrap();
        let content = std::fs::read_to_string(temp.path()).unwrap();
        assert!(content.ends_with('\n'));
        assert!(content.contains("\"views\":3"));
    }
}
