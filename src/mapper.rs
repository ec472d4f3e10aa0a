use chrono::NaiveDate;
use tracing::warn;

use crate::error::MapError;
use crate::types::{ExtractedTable, TradingRecord};

/// Map one extracted row to a record.
///
/// Column layout (index column already dropped): product code, product name,
/// delivery basis name, volume, total; the contract count sits in the last
/// column. The code's sub-fields are cut by character so a malformed
/// multi-byte id cannot split mid-character.
pub fn map_row(row: &[String], date: NaiveDate) -> Result<TradingRecord, MapError> {
    let exchange_product_id = column(row, 0)?.to_string();
    let chars: Vec<char> = exchange_product_id.chars().collect();
    if chars.len() < 7 {
        return Err(MapError::MalformedProductId(exchange_product_id));
    }

    let exchange_product_name = column(row, 1)?.to_string();
    let delivery_basis_name = column(row, 2)?.to_string();
    let volume = parse_int(row, 3)?;
    let total = parse_int(row, 4)?;
    let count = parse_int(row, row.len() - 1)?;

    Ok(TradingRecord {
        oil_id: chars[..4].iter().collect(),
        delivery_basis_id: chars[4..7].iter().collect(),
        delivery_type_id: chars[chars.len() - 1].to_string(),
        exchange_product_id,
        exchange_product_name,
        delivery_basis_name,
        volume,
        total,
        count,
        date,
    })
}

/// Map a whole report's table, dropping rows that fail validation. The
/// surviving rows still form the report's batch (partial success).
pub fn map_table(table: &ExtractedTable, date: NaiveDate) -> Vec<TradingRecord> {
    table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| match map_row(row, date) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Dropping row {idx} of report {date}: {e}");
                None
            }
        })
        .collect()
}

fn column(row: &[String], idx: usize) -> Result<&str, MapError> {
    row.get(idx)
        .map(String::as_str)
        .ok_or(MapError::MissingColumn(idx))
}

fn parse_int(row: &[String], idx: usize) -> Result<i64, MapError> {
    let value = column(row, idx)?.trim();
    value.parse::<i64>().map_err(|_| MapError::NumericField {
        column: idx,
        value: value.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
