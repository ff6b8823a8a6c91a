//! Cache trait for storing extracted filings.
//!
//! This module defines the [`FilingCache`] trait that persists parsed
//! [`Filing`]s so repeated requests skip fetching and parsing.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use crate::{
    error::Result,
    filing::Filing,
    types::{FilingType, Ticker},
};

/// Trait for caching extracted filings.
///
/// Implementations can store data in various backends (SQLite, in-memory, etc.).
/// Entries are keyed by ticker, filing type and reporting date.
#[async_trait]
pub trait FilingCache: Send + Sync {
    /// Retrieves a cached filing.
    ///
    /// Returns `Ok(Some(filing))` if cached, `Ok(None)` if not cached.
    async fn get_filing(
        &self,
        ticker: &Ticker,
        filing_type: FilingType,
        date: NaiveDate,
    ) -> Result<Option<Filing>>;

    /// Stores a filing, replacing any previous entry with the same key.
    async fn put_filing(&self, filing: &Filing) -> Result<()>;

    /// All cached filings of one type for a ticker, oldest first.
    async fn filings(&self, ticker: &Ticker, filing_type: FilingType) -> Result<Vec<Filing>>;

    /// Invalidates cached entries older than the specified duration.
    ///
    /// Returns the number of entries removed.
    async fn invalidate_stale(&self, max_age: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
