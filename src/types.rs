use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Raw report
// ---------------------------------------------------------------------------

/// One downloaded report file: the spreadsheet bytes plus the calendar date
/// the report was published for. Lives only between fetch and extraction.
#[derive(Debug, Clone)]
pub struct RawReport {
    pub date: NaiveDate,
    pub bytes: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Extracted table
// ---------------------------------------------------------------------------

/// The data region cut out of a report: only the rows between the unit-of-
/// measure marker and the totals row, with the leading index column dropped
/// and "not traded" sentinel rows removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTable {
    pub rows: Vec<Vec<String>>,
}

impl ExtractedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Trading record
// ---------------------------------------------------------------------------

/// One persisted trading result. The `oil_id` / `delivery_basis_id` /
/// `delivery_type_id` fields are derived from the composite
/// `exchange_product_id`, which is guaranteed to be at least 7 characters.
/// `created_at` / `updated_at` are assigned by the database on insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingRecord {
    pub exchange_product_id: String,
    pub exchange_product_name: String,
    pub oil_id: String,
    pub delivery_basis_id: String,
    pub delivery_basis_name: String,
    pub delivery_type_id: String,
    pub volume: i64,
    pub total: i64,
    pub count: i64,
    pub date: NaiveDate,
}
