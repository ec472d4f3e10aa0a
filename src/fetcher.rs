use std::time::Duration;

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use reqwest::header::USER_AGENT;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::config::{FETCH_RETRY_DELAY, HTTP_TIMEOUT, MAX_FETCH_ATTEMPTS};
use crate::error::FetchError;
use crate::types::RawReport;

/// Browser identities rotated per attempt. The archive serves plain GET
/// requests but throttles clients that look like scripts.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:126.0) Gecko/20100101 Firefox/126.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
];

/// Build the HTTP client shared by every fetch future.
pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()
}

/// Downloads one report file per call. Retries with a fixed delay; the retry
/// policy is injected so tests can shrink it.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_attempts: usize,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_policy(client, MAX_FETCH_ATTEMPTS, FETCH_RETRY_DELAY)
    }

    pub fn with_policy(client: reqwest::Client, max_attempts: usize, retry_delay: Duration) -> Self {
        Self {
            client,
            max_attempts,
            retry_delay,
        }
    }

    /// Fetch the report published for `date`.
    ///
    /// `Ok(Some(_))` — downloaded; `Ok(None)` — the archive answered but has
    /// no report for this date (non-200 on the final attempt); `Err(_)` — a
    /// transport failure survived every retry. Both non-`Some` outcomes mean
    /// the date is skipped; the caller only logs them differently.
    pub async fn fetch(&self, url: &str, date: NaiveDate) -> Result<Option<RawReport>, FetchError> {
        let mut last_transport: Option<reqwest::Error> = None;

        for attempt in 1..=self.max_attempts {
            let ua = USER_AGENTS
                .choose(&mut rand::thread_rng())
                .copied()
                .unwrap_or(USER_AGENTS[0]);

            match self.client.get(url).header(USER_AGENT, ua).send().await {
                Ok(resp) if resp.status() == StatusCode::OK => match resp.bytes().await {
                    Ok(bytes) => {
                        info!(
                            "Downloaded report for {date} ({} bytes, attempt {attempt}/{})",
                            bytes.len(),
                            self.max_attempts,
                        );
                        return Ok(Some(RawReport {
                            date,
                            bytes: bytes.to_vec(),
                        }));
                    }
                    Err(e) => {
                        warn!(
                            "Attempt {attempt}/{} failed reading body for {date}: {e}",
                            self.max_attempts,
                        );
                        last_transport = Some(e);
                    }
                },
                Ok(resp) => {
                    debug!(
                        "Attempt {attempt}/{} for {date}: status {}",
                        self.max_attempts,
                        resp.status(),
                    );
                    last_transport = None;
                }
                Err(e) => {
                    warn!("Attempt {attempt}/{} failed for {date}: {e}", self.max_attempts);
                    last_transport = Some(e);
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        match last_transport {
            Some(source) => Err(FetchError::Exhausted {
                attempts: self.max_attempts,
                source,
            }),
            None => {
                debug!("No report published for {date}");
                Ok(None)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
    const SERVER_ERROR: &str =
        "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";
    const OK_BODY: &str = "HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\nxls!";

    /// Serves one canned response per accepted connection, counting hits.
    async fn spawn_stub(responses: Vec<&'static str>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = sock.read(&mut buf).await;
                let _ = sock.write_all(response.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });
        (format!("http://{addr}/report.xls"), hits)
    }

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 7).unwrap()
    }

    fn fetcher(max_attempts: usize) -> Fetcher {
        Fetcher::with_policy(
            reqwest::Client::new(),
            max_attempts,
            Duration::from_millis(50),
        )
    }

    #[tokio::test]
    async fn fails_twice_then_succeeds_in_exactly_three_attempts() {
        let (url, hits) = spawn_stub(vec![SERVER_ERROR, SERVER_ERROR, OK_BODY]).await;
        let started = Instant::now();

        let report = fetcher(5).fetch(&url, test_date()).await.unwrap().unwrap();

        assert_eq!(report.bytes, b"xls!");
        assert_eq!(report.date, test_date());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        // two inter-attempt delays of 50ms must have elapsed
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn missing_report_yields_none_after_all_attempts() {
        let (url, hits) = spawn_stub(vec![NOT_FOUND, NOT_FOUND]).await;

        let outcome = fetcher(2).fetch(&url, test_date()).await.unwrap();

        assert!(outcome.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_failure_exhausts_into_error() {
        // Bind then drop so the port refuses connections.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/report.xls", listener.local_addr().unwrap());
        drop(listener);

        let err = fetcher(3).fetch(&url, test_date()).await.unwrap_err();

        let FetchError::Exhausted { attempts, .. } = err;
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn final_non_200_wins_over_earlier_transport_failure() {
        // First connection dies without a response, second answers 404:
        // the date counts as "no report", not as a transport failure.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((sock, _)) = listener.accept().await {
                drop(sock);
            }
            if let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = sock.read(&mut buf).await;
                let _ = sock.write_all(NOT_FOUND.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });

        let url = format!("http://{addr}/report.xls");
        let outcome = fetcher(2).fetch(&url, test_date()).await.unwrap();
        assert!(outcome.is_none());
    }
}
