mod config;
mod dates;
mod db;
mod error;
mod extract;
mod fetcher;
mod mapper;
mod orchestrator;
mod types;

use std::time::Instant;

use chrono::Local;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::{PgTradingStore, TradingStore};
use crate::error::Result;
use crate::fetcher::{http_client, Fetcher};

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let started = Instant::now();

    // Unreachable storage is the one failure that aborts before processing.
    let pool = PgPoolOptions::new().connect(&cfg.database_url()).await?;
    let store = PgTradingStore::new(pool);
    store.create_schema().await?;
    info!(
        "Database ready at {}:{}/{}",
        cfg.db_host, cfg.db_port, cfg.db_name
    );

    let fetcher = Fetcher::new(http_client()?);
    let today = Local::now().date_naive();
    let stats = orchestrator::run(&fetcher, &store, &cfg.base_url, today, cfg.cutoff).await;

    info!(
        dates = stats.dates_considered,
        fetched = stats.fetched,
        no_report = stats.no_report,
        fetch_failed = stats.fetch_failed,
        extract_failed = stats.extract_failed,
        reports = stats.reports_persisted,
        records = stats.records_persisted,
        duplicates = stats.duplicate_reports,
        persist_failed = stats.persist_failed,
        rows_dropped = stats.rows_dropped,
        "Run complete in {:.1}s",
        started.elapsed().as_secs_f64(),
    );

    Ok(())
}
