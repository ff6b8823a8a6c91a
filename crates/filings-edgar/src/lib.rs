#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR retrieval collaborators.
//!
//! This crate provides:
//!
//! - [`EdgarClient`] - HTTP page retrieval and ticker to CIK lookup against EDGAR
//! - [`ReplaySource`] - recorded pages served from memory
//!
//! # Example
//!
//! ```no_run
//! use filings_core::{CikResolver, Ticker};
//! use filings_edgar::EdgarClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EdgarClient::new("MyApp/1.0 (contact@example.com)")?;
//!     let cik = client.lookup_cik(&Ticker::new("MSFT")).await?;
//!     println!("MSFT has CIK {cik}");
//!     Ok(())
//! }
//! ```

/// In-memory replay of recorded pages.
pub mod replay;

pub use replay::ReplaySource;

use async_trait::async_trait;
use filings_core::{CikResolver, FilingError, FilingSource, PageSource, Result, Ticker};
use filings_parser::{cik_query_path, parse_cik_page};
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, warn};

/// SEC EDGAR base URL
pub const EDGAR_BASE_URL: &str = "https://www.sec.gov";

/// SEC company tickers file, relative to the base URL
const COMPANY_TICKERS_PATH: &str = "/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement)
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// SEC EDGAR page source.
///
/// Fetches EDGAR pages and resolves tickers to CIKs. Requests are spaced at
/// least 100 ms apart per SEC requirements (max 10 requests/second).
#[derive(Debug)]
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    user_agent: String,
    base_url: String,
    tickers: OnceCell<HashMap<String, String>>,
}

impl EdgarClient {
    /// Create a new EDGAR client with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Example
    /// ```
    /// use filings_edgar::EdgarClient;
    ///
    /// let client = EdgarClient::new("MyApp/1.0 (contact@example.com)").unwrap();
    /// ```
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FilingError::Fetch(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, user_agent))
    }

    /// Create a new EDGAR client with a custom HTTP client.
    ///
    /// `user_agent` is sent on every request, overriding the client's own.
    ///
    /// # Example
    /// ```
    /// use filings_edgar::EdgarClient;
    /// use std::time::Duration;
    ///
    /// let client = reqwest::Client::builder()
    ///     .timeout(Duration::from_secs(60))
    ///     .build()
    ///     .unwrap();
    ///
    /// let edgar = EdgarClient::with_client(client, "MyApp/1.0 (contact@example.com)");
    /// ```
    pub fn with_client(client: reqwest::Client, user_agent: &str) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT))),
            user_agent: user_agent.to_string(),
            base_url: EDGAR_BASE_URL.to_string(),
            tickers: OnceCell::new(),
        }
    }

    /// Point the client at another host, e.g. a mirror or a local test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// The base URL relative paths are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a page path to a full URL.
    ///
    /// Paths starting with `/` are joined to the base URL; anything else is
    /// taken as an absolute URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            path.to_string()
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        self.rate_limiter.lock().await.wait().await;

        debug!(url, "Fetching EDGAR page");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| FilingError::Fetch(format!("{url}: {e}")))?;

        if !response.status().is_success() {
            return Err(FilingError::Fetch(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }
        Ok(response)
    }

    /// Ticker to zero-padded CIK table from the SEC tickers file, fetched once.
    async fn company_tickers(&self) -> Result<&HashMap<String, String>> {
        self.tickers
            .get_or_try_init(|| async {
                let url = self.url(COMPANY_TICKERS_PATH);
                let data: HashMap<String, CompanyTickerInfo> = self
                    .get(&url)
                    .await?
                    .json()
                    .await
                    .map_err(|e| {
                        FilingError::Parse(format!("Failed to parse company tickers: {e}"))
                    })?;
                Ok::<_, FilingError>(index_tickers(data.into_values()))
            })
            .await
    }
}

impl FilingSource for EdgarClient {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }
}

#[async_trait]
impl PageSource for EdgarClient {
    async fn fetch_page(&self, path: &str) -> Result<String> {
        let url = self.url(path);
        self.get(&url)
            .await?
            .text()
            .await
            .map_err(|e| FilingError::Fetch(format!("{url}: {e}")))
    }
}

#[async_trait]
impl CikResolver for EdgarClient {
    /// Looks the ticker up in the SEC tickers file, falling back to the XML
    /// company page for tickers the file does not list.
    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn lookup_cik(&self, ticker: &Ticker) -> Result<String> {
        if ticker.as_str().is_empty() {
            return Err(FilingError::InvalidParameter("Empty ticker".to_string()));
        }

        match self.company_tickers().await {
            Ok(tickers) => {
                if let Some(cik) = tickers.get(ticker.as_str()) {
                    debug!(cik = %cik, "Found CIK in company tickers");
                    return Ok(cik.clone());
                }
            }
            Err(e) => warn!(error = %e, "Company tickers unavailable"),
        }

        let page = self.fetch_page(&cik_query_path(ticker)).await?;
        parse_cik_page(&page).map_err(|_| FilingError::CikNotFound(ticker.to_string()))
    }
}

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    ticker: String,
}

fn index_tickers(entries: impl IntoIterator<Item = CompanyTickerInfo>) -> HashMap<String, String> {
    entries
        .into_iter()
        .map(|info| (info.ticker.to_uppercase(), format!("{:0>10}", info.cik_str)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_name_and_urls() {
        let client = EdgarClient::new("Test/1.0 (test@example.com)").unwrap();
        assert_eq!(client.name(), "SEC EDGAR");
        assert_eq!(client.base_url(), EDGAR_BASE_URL);
        assert_eq!(
            client.url("/cgi-bin/browse-edgar?action=getcompany&output=xml&CIK=AAPL"),
            "https://www.sec.gov/cgi-bin/browse-edgar?action=getcompany&output=xml&CIK=AAPL"
        );
        assert_eq!(
            client.url("https://example.com/R2.htm"),
            "https://example.com/R2.htm"
        );
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let client = EdgarClient::new("Test/1.0 (test@example.com)")
            .unwrap()
            .with_base_url("http://localhost:8080/");
        assert_eq!(client.url("/R1.htm"), "http://localhost:8080/R1.htm");
    }

    #[test]
    fn test_index_tickers_pads_cik() {
        let json = r#"{
            "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
            "1": {"cik_str": 789019, "ticker": "msft", "title": "MICROSOFT CORP"}
        }"#;
        let data: HashMap<String, CompanyTickerInfo> = serde_json::from_str(json).unwrap();
        let tickers = index_tickers(data.into_values());
        assert_eq!(tickers["AAPL"], "0000320193");
        assert_eq!(tickers["MSFT"], "0000789019");
    }

    #[tokio::test]
    async fn test_empty_ticker_rejected() {
        let client = EdgarClient::new("Test/1.0 (test@example.com)").unwrap();
        let result = client.lookup_cik(&Ticker::new("")).await;
        assert!(matches!(result, Err(FilingError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let mut limiter = RateLimiter::new(Duration::from_millis(20));
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
