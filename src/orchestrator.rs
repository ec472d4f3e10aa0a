use chrono::NaiveDate;
use futures_util::future::join_all;
use tracing::{error, info, warn};

use crate::dates::ReportDates;
use crate::db::TradingStore;
use crate::error::PersistError;
use crate::extract;
use crate::fetcher::Fetcher;
use crate::mapper;
use crate::types::TradingRecord;

/// Aggregate counters for one run, logged as the final summary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub dates_considered: usize,
    pub fetched: usize,
    pub no_report: usize,
    pub fetch_failed: usize,
    pub extract_failed: usize,
    pub reports_persisted: usize,
    pub records_persisted: u64,
    pub duplicate_reports: usize,
    pub persist_failed: usize,
    pub rows_dropped: usize,
}

enum DateOutcome {
    /// Fetched, extracted and mapped; `usize` counts rows dropped by mapping.
    Batch(NaiveDate, Vec<TradingRecord>, usize),
    NoReport,
    FetchFailed,
    ExtractFailed,
}

/// Drive the whole pipeline: enumerate candidate dates, launch every date's
/// fetch→extract→map future at once, await them as a batch, then save each
/// report's records. No date's failure touches any other date.
pub async fn run<S: TradingStore>(
    fetcher: &Fetcher,
    store: &S,
    base_url: &str,
    start: NaiveDate,
    cutoff: NaiveDate,
) -> RunStats {
    let mut stats = RunStats::default();

    let work: Vec<_> = ReportDates::new(base_url, start, cutoff).collect();
    stats.dates_considered = work.len();
    info!("Enumerated {} candidate report dates", work.len());

    let outcomes = join_all(
        work.into_iter()
            .map(|(url, date)| process_report(fetcher, url, date)),
    )
    .await;

    for outcome in outcomes {
        match outcome {
            DateOutcome::Batch(date, records, dropped) => {
                stats.fetched += 1;
                stats.rows_dropped += dropped;
                persist_batch(store, &mut stats, date, &records).await;
            }
            DateOutcome::NoReport => stats.no_report += 1,
            DateOutcome::FetchFailed => stats.fetch_failed += 1,
            DateOutcome::ExtractFailed => {
                stats.fetched += 1;
                stats.extract_failed += 1;
            }
        }
    }

    stats
}

/// One date's fetch→extract→map pipeline. Skips are reported as outcomes,
/// never as panics or early exits for the whole run.
async fn process_report(fetcher: &Fetcher, url: String, date: NaiveDate) -> DateOutcome {
    let raw = match fetcher.fetch(&url, date).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return DateOutcome::NoReport,
        Err(e) => {
            warn!("Giving up on report for {date}: {e}");
            return DateOutcome::FetchFailed;
        }
    };

    let table = match extract::extract(&raw.bytes) {
        Ok(table) => table,
        Err(e) => {
            warn!("Extraction failed for report {date}: {e}");
            return DateOutcome::ExtractFailed;
        }
    };
    info!("Processed report for {date}: {} rows", table.len());

    let records = mapper::map_table(&table, date);
    let dropped = table.len() - records.len();
    DateOutcome::Batch(date, records, dropped)
}

async fn persist_batch<S: TradingStore>(
    store: &S,
    stats: &mut RunStats,
    date: NaiveDate,
    records: &[TradingRecord],
) {
    match store.save_batch(records).await {
        Ok(n) => {
            stats.reports_persisted += 1;
            stats.records_persisted += n;
            info!("Saved {n} records for report {date}");
        }
        Err(PersistError::Duplicate) => {
            stats.duplicate_reports += 1;
            info!("Report {date} already persisted, skipping");
        }
        Err(e) => {
            stats.persist_failed += 1;
            error!("Failed to save batch for {date}: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
