//! No-op cache implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use filings_core::{Filing, FilingCache, FilingType, Result, Ticker};
use std::time::Duration;
use tracing::trace;

/// A no-op cache that doesn't store anything.
///
/// `get_filing` always returns `Ok(None)` and `put_filing` returns `Ok(())`.
/// Useful for disabling caching or testing code paths without cache hits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FilingCache for NoopCache {
    async fn get_filing(
        &self,
        _ticker: &Ticker,
        _filing_type: FilingType,
        _date: NaiveDate,
    ) -> Result<Option<Filing>> {
        trace!("NoopCache: get_filing called, returning None");
        Ok(None)
    }

    async fn put_filing(&self, _filing: &Filing) -> Result<()> {
        trace!("NoopCache: put_filing called, doing nothing");
        Ok(())
    }

    async fn filings(&self, _ticker: &Ticker, _filing_type: FilingType) -> Result<Vec<Filing>> {
        trace!("NoopCache: filings called, returning nothing");
        Ok(Vec::new())
    }

    async fn invalidate_stale(&self, _max_age: Duration) -> Result<usize> {
        trace!("NoopCache: invalidate_stale called, returning 0");
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        trace!("NoopCache: clear called, doing nothing");
        Ok(())
    }
}
