//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use filings_core::{Filing, FilingCache, FilingType, Result, Ticker};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Cache entry with timestamp for TTL-based invalidation.
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    cached_at: chrono::DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > chrono::TimeDelta::from_std(ttl).unwrap_or(chrono::TimeDelta::MAX)
    }
}

/// Key for filing cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FilingKey {
    ticker: Ticker,
    filing_type: FilingType,
    date: NaiveDate,
}

impl FilingKey {
    fn of(filing: &Filing) -> Self {
        Self {
            ticker: filing.ticker().clone(),
            filing_type: filing.filing_type(),
            date: filing.date(),
        }
    }
}

/// Simple in-memory cache for testing and development.
///
/// Filings are stored in a `RwLock`-protected `HashMap` and are lost when the
/// cache is dropped. Filings are cloned on get/put operations.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    filings: RwLock<HashMap<FilingKey, CacheEntry<Filing>>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached filings.
    pub async fn len(&self) -> usize {
        self.filings.read().await.len()
    }

    /// Whether nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.filings.read().await.is_empty()
    }
}

#[async_trait]
impl FilingCache for InMemoryCache {
    #[instrument(skip(self), fields(ticker = %ticker, filing_type = %filing_type, date = %date))]
    async fn get_filing(
        &self,
        ticker: &Ticker,
        filing_type: FilingType,
        date: NaiveDate,
    ) -> Result<Option<Filing>> {
        let key = FilingKey {
            ticker: ticker.clone(),
            filing_type,
            date,
        };

        let cache = self.filings.read().await;
        match cache.get(&key) {
            Some(entry) => {
                debug!("Cache hit for filing");
                Ok(Some(entry.data.clone()))
            }
            None => {
                debug!("Cache miss for filing");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, filing), fields(ticker = %filing.ticker(), date = %filing.date()))]
    async fn put_filing(&self, filing: &Filing) -> Result<()> {
        let mut cache = self.filings.write().await;
        cache.insert(FilingKey::of(filing), CacheEntry::new(filing.clone()));
        debug!("Cached filing");
        Ok(())
    }

    #[instrument(skip(self), fields(ticker = %ticker, filing_type = %filing_type))]
    async fn filings(&self, ticker: &Ticker, filing_type: FilingType) -> Result<Vec<Filing>> {
        let cache = self.filings.read().await;
        let mut filings: Vec<Filing> = cache
            .iter()
            .filter(|(key, _)| &key.ticker == ticker && key.filing_type == filing_type)
            .map(|(_, entry)| entry.data.clone())
            .collect();
        filings.sort_by_key(Filing::date);
        debug!("Found {} cached filings", filings.len());
        Ok(filings)
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut cache = self.filings.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - cache.len();

        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.filings.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::{FinancialDataItem, FinancialReport};

    fn filing(ticker: &str, filing_type: FilingType, date: NaiveDate, revenue: f64) -> Filing {
        let mut report = FinancialReport::new(filing_type);
        report.set(FinancialDataItem::Revenue, revenue).unwrap();
        Filing::new(Ticker::new(ticker), date, report)
    }

    #[tokio::test]
    async fn test_memory_cache_filing() {
        let cache = InMemoryCache::new();
        let ticker = Ticker::new("AAPL");
        let date = NaiveDate::from_ymd_opt(2018, 8, 1).unwrap();

        // Initially no data
        let result = cache
            .get_filing(&ticker, FilingType::Quarterly, date)
            .await
            .unwrap();
        assert!(result.is_none());

        cache
            .put_filing(&filing("AAPL", FilingType::Quarterly, date, 53_265e6))
            .await
            .unwrap();

        let retrieved = cache
            .get_filing(&ticker, FilingType::Quarterly, date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved.revenue(), Some(53_265e6));

        // Same date, other filing type
        assert!(
            cache
                .get_filing(&ticker, FilingType::Annual, date)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_memory_cache_lists_oldest_first() {
        let cache = InMemoryCache::new();
        let dates = [
            NaiveDate::from_ymd_opt(2018, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2018, 2, 2).unwrap(),
            NaiveDate::from_ymd_opt(2018, 5, 2).unwrap(),
        ];
        for date in dates {
            cache
                .put_filing(&filing("AAPL", FilingType::Quarterly, date, 1.0))
                .await
                .unwrap();
        }
        cache
            .put_filing(&filing("MSFT", FilingType::Quarterly, dates[0], 1.0))
            .await
            .unwrap();

        let filings = cache
            .filings(&Ticker::new("AAPL"), FilingType::Quarterly)
            .await
            .unwrap();
        let listed: Vec<NaiveDate> = filings.iter().map(Filing::date).collect();
        assert_eq!(listed, vec![dates[1], dates[2], dates[0]]);
        assert_eq!(cache.len().await, 4);
    }

    #[tokio::test]
    async fn test_memory_cache_invalidate_and_clear() {
        let cache = InMemoryCache::new();
        let date = NaiveDate::from_ymd_opt(2018, 8, 1).unwrap();
        cache
            .put_filing(&filing("AAPL", FilingType::Annual, date, 1.0))
            .await
            .unwrap();

        assert_eq!(cache.invalidate_stale(Duration::from_secs(3600)).await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.invalidate_stale(Duration::ZERO).await.unwrap(), 1);

        cache
            .put_filing(&filing("AAPL", FilingType::Annual, date, 1.0))
            .await
            .unwrap();
        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }
}
