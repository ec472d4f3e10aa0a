use chrono::{Days, NaiveDate};

use crate::config::REPORT_PATH;

/// Lazy walk over candidate report dates, newest first: `start` down to
/// `cutoff`, exclusive. Each step yields the report URL together with the
/// date it encodes. Pure — building the sequence does no I/O, and cloning
/// restarts it.
#[derive(Debug, Clone)]
pub struct ReportDates {
    base_url: String,
    next: NaiveDate,
    cutoff: NaiveDate,
}

impl ReportDates {
    pub fn new(base_url: &str, start: NaiveDate, cutoff: NaiveDate) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            next: start,
            cutoff,
        }
    }
}

impl Iterator for ReportDates {
    type Item = (String, NaiveDate);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next <= self.cutoff {
            return None;
        }
        let date = self.next;
        self.next = date.checked_sub_days(Days::new(1))?;
        Some((report_url(&self.base_url, date), date))
    }
}

pub fn report_url(base_url: &str, date: NaiveDate) -> String {
    let path = REPORT_PATH.replace("{date}", &date.format("%Y%m%d").to_string());
    format!("{base_url}{path}")
}
