use thiserror::Error;

/// Top-level error for startup and plumbing failures. Anything here that
/// occurs before processing begins (config, pool connect, schema creation)
/// aborts the run; everything downstream is handled per report date.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch gave up. A missing report (non-200 on the final attempt) is not an
/// error at all — the fetcher returns `Ok(None)` for that — so this only
/// covers transport failures that survived every retry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: usize,
        source: reqwest::Error,
    },
}

/// The report body did not match the expected layout.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("spreadsheet error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("workbook has no sheets")]
    NoSheet,

    #[error("start marker not found")]
    StartMarkerNotFound,

    #[error("no end marker after the start marker")]
    EndMarkerNotFound,

    #[error("data region is empty after filtering")]
    Empty,
}

/// A single row failed validation. The row is dropped; the rest of the
/// report's batch still persists.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("product code {0:?} is shorter than 7 characters")]
    MalformedProductId(String),

    #[error("row is missing column {0}")]
    MissingColumn(usize),

    #[error("column {column} value {value:?} is not an integer")]
    NumericField { column: usize, value: String },
}

/// Saving a report's batch failed; the whole transaction was rolled back.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The batch collided with the `(exchange_product_id, date)` uniqueness
    /// constraint — this date was already loaded by an earlier run.
    #[error("batch already persisted")]
    Duplicate,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
