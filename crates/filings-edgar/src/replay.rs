//! Recorded pages served from memory.
//!
//! A [`ReplaySource`] answers [`PageSource`] and [`CikResolver`] requests from
//! pages registered up front, so extraction can run against fixtures or a
//! previously saved crawl without touching the network.

use async_trait::async_trait;
use filings_core::{CikResolver, FilingError, FilingSource, PageSource, Result, Ticker};
use filings_parser::{cik_query_path, parse_cik_page};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Page source backed by an in-memory map of path to body.
#[derive(Debug, Default)]
pub struct ReplaySource {
    pages: HashMap<String, String>,
    ciks: HashMap<Ticker, String>,
    requests: AtomicUsize,
}

impl ReplaySource {
    /// An empty source; every request fails until pages are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page body under the exact path it will be requested by.
    #[must_use]
    pub fn with_page(mut self, path: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert_page(path, body);
        self
    }

    /// Registers a ticker's CIK directly.
    #[must_use]
    pub fn with_cik(mut self, ticker: impl Into<Ticker>, cik: impl Into<String>) -> Self {
        self.ciks.insert(ticker.into(), cik.into());
        self
    }

    /// Registers a page body in place.
    pub fn insert_page(&mut self, path: impl Into<String>, body: impl Into<String>) {
        self.pages.insert(path.into(), body.into());
    }

    /// Number of page fetches served or refused so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl FilingSource for ReplaySource {
    fn name(&self) -> &str {
        "Replay"
    }
}

#[async_trait]
impl PageSource for ReplaySource {
    async fn fetch_page(&self, path: &str) -> Result<String> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        trace!(path, "Replaying page");
        self.pages
            .get(path)
            .cloned()
            .ok_or_else(|| FilingError::Fetch(format!("no recorded page for {path}")))
    }
}

#[async_trait]
impl CikResolver for ReplaySource {
    /// Uses a registered CIK, else a recorded XML company page.
    async fn lookup_cik(&self, ticker: &Ticker) -> Result<String> {
        if let Some(cik) = self.ciks.get(ticker) {
            return Ok(cik.clone());
        }
        let page = self
            .fetch_page(&cik_query_path(ticker))
            .await
            .map_err(|_| FilingError::CikNotFound(ticker.to_string()))?;
        parse_cik_page(&page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_recorded_pages() {
        let source = ReplaySource::new().with_page("/R1.htm", "<html></html>");
        assert_eq!(source.fetch_page("/R1.htm").await.unwrap(), "<html></html>");
        assert!(matches!(
            source.fetch_page("/R2.htm").await,
            Err(FilingError::Fetch(_))
        ));
        assert_eq!(source.request_count(), 2);
        assert_eq!(source.name(), "Replay");
    }

    #[tokio::test]
    async fn test_cik_from_registration_or_company_page() {
        let ticker = Ticker::new("AAPL");
        let source = ReplaySource::new().with_page(
            cik_query_path(&ticker),
            "<companyInfo><CIK>0000320193</CIK></companyInfo>",
        );
        assert_eq!(source.lookup_cik(&ticker).await.unwrap(), "0000320193");

        let source = ReplaySource::new().with_cik("msft", "0000789019");
        assert_eq!(
            source.lookup_cik(&Ticker::new("MSFT")).await.unwrap(),
            "0000789019"
        );
        assert!(matches!(
            source.lookup_cik(&Ticker::new("GE")).await,
            Err(FilingError::CikNotFound(_))
        ));
    }
}
