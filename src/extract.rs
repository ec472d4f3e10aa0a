use std::io::Cursor;

use calamine::{Data, Reader, Xls};

use crate::config::{END_MARKER, HEADER_ROWS, SENTINEL, START_MARKER};
use crate::error::ExtractError;
use crate::types::ExtractedTable;

/// Cut the trading-results region out of a raw `.xls` report.
///
/// The document is header-less and loosely structured; the region is located
/// purely by the literal start/end markers. Re-extracting the same bytes
/// yields the same table.
pub fn extract(bytes: &[u8]) -> Result<ExtractedTable, ExtractError> {
    let mut workbook = Xls::new(Cursor::new(bytes)).map_err(calamine::Error::from)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ExtractError::NoSheet)?
        .map_err(calamine::Error::from)?;

    // The used range only reaches back to the document's first column when
    // something in it has a value; skip the leading index column either way.
    let leading_cols = match range.start() {
        Some((_, 0)) => 1,
        _ => 0,
    };
    let rows = range
        .rows()
        .map(|row| row.iter().skip(leading_cols).map(cell_to_string).collect())
        .collect();

    extract_rows(rows)
}

/// Region slicing on already-parsed rows (leading index column dropped).
///
/// The first row containing the start marker opens the region; the data
/// itself begins `HEADER_ROWS` rows further down, past the column sub-header.
/// The region ends at the first end-marker row strictly below the first data
/// row. Rows whose last cell is the sentinel mean "not traded" and are
/// removed; a region that is empty after filtering is a layout failure.
pub fn extract_rows(rows: Vec<Vec<String>>) -> Result<ExtractedTable, ExtractError> {
    let marker_idx = rows
        .iter()
        .position(|row| row.iter().any(|cell| cell == START_MARKER))
        .ok_or(ExtractError::StartMarkerNotFound)?;
    let data_start = marker_idx + HEADER_ROWS;

    let end_idx = rows
        .iter()
        .enumerate()
        .skip(data_start + 1)
        .find(|(_, row)| row.iter().any(|cell| cell == END_MARKER))
        .map(|(i, _)| i)
        .ok_or(ExtractError::EndMarkerNotFound)?;

    let kept: Vec<Vec<String>> = rows[data_start..end_idx]
        .iter()
        .filter(|row| row.last().map(String::as_str) != Some(SENTINEL))
        .cloned()
        .collect();

    if kept.is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(ExtractedTable { rows: kept })
}

/// Integral floats render without a fractional part so numeric cells survive
/// the round trip into integer parsing.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
