//! Excel workbook writer.
//!
//! One "Results" sheet with the shared [`HEADER`] in bold, a frozen header
//! row and one row per match. Counters are numeric cells, dates are text in
//! [`DATE_FORMAT`] so they read the same as in the CSV export.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::{DATE_FORMAT, HEADER};
use crate::MatchRecord;
use crate::error::Result;

/// Name of the worksheet holding the matches.
pub const SHEET_NAME: &str = "Results";

/// Longest string a cell accepts.
const MAX_CELL_CHARS: usize = 32_767;

const COLUMN_WIDTHS: [f64; 9] = [24.0, 28.0, 24.0, 20.0, 80.0, 36.0, 10.0, 10.0, 10.0];

/// Writes matches as an `.xlsx` workbook.
pub fn write_xlsx(matches: &[MatchRecord], output_path: impl AsRef<Path>) -> Result<()> {
    let mut workbook = build_workbook(matches)?;
    workbook.save(output_path.as_ref())?;
    Ok(())
}

/// Same as [`write_xlsx`], returned as the workbook's bytes.
pub fn to_xlsx_bytes(matches: &[MatchRecord]) -> Result<Vec<u8>> {
    let mut workbook = build_workbook(matches)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(matches: &[MatchRecord]) -> std::result::Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for ((col, title), width) in (0u16..).zip(HEADER).zip(COLUMN_WIDTHS) {
        sheet.write_string_with_format(0, col, title, &bold)?;
        sheet.set_column_width(col, width)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    for (row, m) in (1u32..).zip(matches) {
        write_row(sheet, row, m)?;
    }

    Ok(workbook)
}

fn write_row(sheet: &mut Worksheet, row: u32, m: &MatchRecord) -> std::result::Result<(), XlsxError> {
    sheet.write_string(row, 0, &cell_text(&m.group))?;
    sheet.write_string(row, 1, &cell_text(&m.group_link))?;
    sheet.write_string(row, 2, &cell_text(&m.sender))?;
    sheet.write_string(row, 3, &m.timestamp.format(DATE_FORMAT).to_string())?;
    sheet.write_string(row, 4, &cell_text(&m.text))?;
    if let Some(url) = &m.url {
        sheet.write_string(row, 5, &cell_text(url))?;
    }
    sheet.write_number(row, 6, m.views as f64)?;
    sheet.write_number(row, 7, m.forwards as f64)?;
    sheet.write_number(row, 8, m.replies as f64)?;
    Ok(())
}

/// Cuts text to what a cell can hold.
fn cell_text(text: &str) -> String {
    if text.chars().count() <= MAX_CELL_CHARS {
        text.to_string()
    } else {
        text.chars().take(MAX_CELL_CHARS).collect()
    }
}
