use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{AppError, Result};

pub const BASE_URL: &str = "https://spimex.com";

/// Path template for daily oil trading reports; the date slots in as YYYYMMDD.
pub const REPORT_PATH: &str = "/upload/reports/oil_xls/oil_xls_{date}162000.xls";

/// Cell that opens the data region. The region itself starts 3 rows below it,
/// past a fixed-size sub-header.
pub const START_MARKER: &str = "Единица измерения: Метрическая тонна";

/// Number of sub-header rows between the start marker and the first data row.
pub const HEADER_ROWS: usize = 3;

/// Cell that closes the data region (the totals row).
pub const END_MARKER: &str = "Итого:";

/// Last-cell placeholder marking a "no trade occurred" row.
pub const SENTINEL: &str = "-";

/// Maximum fetch attempts per report before giving up on the date.
pub const MAX_FETCH_ATTEMPTS: usize = 5;

/// Fixed delay between fetch attempts. No backoff.
pub const FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Per-request timeout on the shared HTTP client.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub base_url: String,
    /// Walk report dates backward from today down to this date, exclusive.
    pub cutoff: NaiveDate,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            db_host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            db_port: std::env::var("DB_PORT")
                .unwrap_or_else(|_| "5432".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("DB_PORT must be a valid port number".to_string()))?,
            db_user: std::env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            db_password: std::env::var("DB_PASS").unwrap_or_default(),
            db_name: std::env::var("DB_NAME").unwrap_or_else(|_| "spimex".to_string()),
            base_url: std::env::var("BASE_URL").unwrap_or_else(|_| BASE_URL.to_string()),
            cutoff: std::env::var("CUTOFF_DATE")
                .unwrap_or_else(|_| "2024-01-01".to_string())
                .parse::<NaiveDate>()
                .map_err(|_| {
                    AppError::Config("CUTOFF_DATE must be a YYYY-MM-DD date".to_string())
                })?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}
