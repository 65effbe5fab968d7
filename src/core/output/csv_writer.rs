//! CSV output writer: `,` delimiter, UTF-8.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{DATE_FORMAT, HEADER};
use crate::MatchRecord;
use crate::error::{ChatgrepError, Result};

/// Writes matches as comma-separated CSV.
pub fn write_csv(matches: &[MatchRecord], output_path: impl AsRef<Path>) -> Result<()> {
    let file = BufWriter::new(File::create(output_path)?);
    write_records(file, matches)
}

/// Same as [`write_csv`], returned as a string.
pub fn to_csv(matches: &[MatchRecord]) -> Result<String> {
    let mut buf = Vec::new();
    write_records(&mut buf, matches)?;
    Ok(String::from_utf8(buf)?)
}

fn write_records<W: Write>(out: W, matches: &[MatchRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(HEADER)?;
    for m in matches {
        writer.write_record(build_record(m))?;
    }

    let mut out = writer.into_inner().map_err(|e| ChatgrepError::Io(e.into_error()))?;
    out.flush()?;
    Ok(())
}

fn build_record(m: &MatchRecord) -> [String; 9] {
    [
        m.group.clone(),
        m.group_link.clone(),
        m.sender.clone(),
        m.timestamp.format(DATE_FORMAT).to_string(),
        m.text.clone(),
        m.url.clone().unwrap_or_default(),
        m.views.to_string(),
        m.forwards.to_string(),
        m.replies.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn sample() -> MatchRecord {
        MatchRecord {
            group: "Rust Chat".into(),
            group_link: "https://t.me/rustchat".into(),
            sender: "Ivan Petrov (@ivan)".into(),
            message_id: 42,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap(),
            text: "hello, rust".into(),
            url: Some("https://t.me/rustchat/42".into()),
            views: 10,
            forwards: 2,
            replies: 1,
            reactions: 0,
        }
    }

    #[test]
    fn test_to_csv_layout() {
        let csv = to_csv(&[sample()]).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("Group,Group link,Sender,Date,Text,Message link,Views,Forwards,Replies")
        );
        assert_eq!(
            lines.next(),
            Some(
                "Rust Chat,https://t.me/rustchat,Ivan Petrov (@ivan),2024-06-15 12:30:00,\"hello, rust\",https://t.me/rustchat/42,10,2,1"
            )
        );
    }

    #[test]
    fn test_missing_url_is_empty_cell() {
        let mut record = sample();
        record.url = None;
        let csv = to_csv(&[record]).unwrap();
        assert!(csv.contains(",\"hello, rust\",,10,2,1"));
    }

    #[test]
    fn test_write_csv_file() {
        let temp = NamedTempFile::new().unwrap();
        write_csv(&[sample(), sample()], temp.path()).unwrap();

        let content = std::fs::read_to_string(temp.path()).unwrap();
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_empty_has_header_only() {
        let csv = to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
