//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use filings_core::{Filing, FilingCache, FilingError, FilingType, Result, Ticker};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, instrument};

/// SQLite-based cache for extracted filings.
///
/// This cache stores each filing as a JSON document in a SQLite database file,
/// providing persistence across application restarts.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Create a new SQLite cache at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| FilingError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    /// Create an in-memory SQLite cache.
    ///
    /// Useful for testing; data is lost when the cache is dropped.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| FilingError::Cache(e.to_string()))?;
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS filings_cache (
                ticker TEXT NOT NULL,
                filing_type TEXT NOT NULL,
                report_date TEXT NOT NULL,
                complete INTEGER NOT NULL,
                data_json TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (ticker, filing_type, report_date)
            )",
            [],
        )
        .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_filings_ticker_type
             ON filings_cache(ticker, filing_type)",
            [],
        )
        .map_err(|e| FilingError::Cache(e.to_string()))?;

        debug!("SQLite cache schema initialized");
        Ok(())
    }
}

#[async_trait]
impl FilingCache for SqliteCache {
    #[instrument(skip(self), fields(ticker = %ticker, filing_type = %filing_type, date = %date))]
    async fn get_filing(
        &self,
        ticker: &Ticker,
        filing_type: FilingType,
        date: NaiveDate,
    ) -> Result<Option<Filing>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let result = conn
            .query_row(
                "SELECT data_json FROM filings_cache
                 WHERE ticker = ?1 AND filing_type = ?2 AND report_date = ?3",
                params![ticker.as_str(), filing_type.form(), date.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        match result {
            Some(json) => {
                let filing: Filing = serde_json::from_str(&json)?;
                debug!("Found cached filing");
                Ok(Some(filing))
            }
            None => {
                debug!("No cached filing found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, filing), fields(ticker = %filing.ticker(), date = %filing.date()))]
    async fn put_filing(&self, filing: &Filing) -> Result<()> {
        let cached_at = Utc::now().to_rfc3339();
        let data_json = serde_json::to_string(filing)?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute(
            "INSERT OR REPLACE INTO filings_cache
             (ticker, filing_type, report_date, complete, data_json, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                filing.ticker().as_str(),
                filing.filing_type().form(),
                filing.date().to_string(),
                filing.is_complete(),
                data_json,
                cached_at
            ],
        )
        .map_err(|e| FilingError::Cache(e.to_string()))?;

        debug!("Cached filing");
        Ok(())
    }

    #[instrument(skip(self), fields(ticker = %ticker, filing_type = %filing_type))]
    async fn filings(&self, ticker: &Ticker, filing_type: FilingType) -> Result<Vec<Filing>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let mut stmt = conn
            .prepare(
                "SELECT data_json FROM filings_cache
                 WHERE ticker = ?1 AND filing_type = ?2
                 ORDER BY report_date ASC",
            )
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let rows = stmt
            .query_map(params![ticker.as_str(), filing_type.form()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let mut filings = Vec::new();
        for row in rows {
            let json = row.map_err(|e| FilingError::Cache(e.to_string()))?;
            filings.push(serde_json::from_str::<Filing>(&json)?);
        }

        debug!("Found {} cached filings", filings.len());
        Ok(filings)
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl)
                .map_err(|e| FilingError::Cache(format!("Invalid TTL duration: {e}")))?;
        let cutoff_str = cutoff.to_rfc3339();

        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        let deleted = conn
            .execute(
                "DELETE FROM filings_cache WHERE cached_at < ?1",
                params![cutoff_str],
            )
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        if deleted > 0 {
            debug!("Invalidated {} stale cache entries", deleted);
        }
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        conn.execute("DELETE FROM filings_cache", [])
            .map_err(|e| FilingError::Cache(e.to_string()))?;

        debug!("Cleared all cache entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::{FinancialDataItem, FinancialReport};

    fn sample_filing(date: NaiveDate) -> Filing {
        let mut report = FinancialReport::new(FilingType::Quarterly);
        report.set(FinancialDataItem::Revenue, 53_265e6).unwrap();
        report.set(FinancialDataItem::CostOfRevenue, 32_844e6).unwrap();
        report.set(FinancialDataItem::SharesOutstanding, 4_829_926_000.0).unwrap();
        Filing::new(Ticker::new("AAPL"), date, report)
    }

    #[tokio::test]
    async fn test_sqlite_cache_initialization() {
        let cache = SqliteCache::in_memory();
        assert!(cache.is_ok());
    }

    #[tokio::test]
    async fn test_filing_round_trips_through_json() {
        let cache = SqliteCache::in_memory().unwrap();
        let ticker = Ticker::new("AAPL");
        let date = NaiveDate::from_ymd_opt(2018, 8, 1).unwrap();

        // Initially no data
        let result = cache
            .get_filing(&ticker, FilingType::Quarterly, date)
            .await
            .unwrap();
        assert!(result.is_none());

        let filing = sample_filing(date);
        cache.put_filing(&filing).await.unwrap();

        let retrieved = cache
            .get_filing(&ticker, FilingType::Quarterly, date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retrieved, filing);
        assert_eq!(retrieved.share_count(), Some(4_829_926_000.0));
        assert_eq!(retrieved.gross_margin(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_existing_entry() {
        let cache = SqliteCache::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 8, 1).unwrap();
        cache.put_filing(&sample_filing(date)).await.unwrap();

        let mut report = FinancialReport::new(FilingType::Quarterly);
        report.set(FinancialDataItem::Revenue, 1.0).unwrap();
        cache
            .put_filing(&Filing::new(Ticker::new("AAPL"), date, report))
            .await
            .unwrap();

        let filings = cache
            .filings(&Ticker::new("AAPL"), FilingType::Quarterly)
            .await
            .unwrap();
        assert_eq!(filings.len(), 1);
        assert_eq!(filings[0].revenue(), Some(1.0));
    }

    #[tokio::test]
    async fn test_filings_ordered_by_date() {
        let cache = SqliteCache::in_memory().unwrap();
        let later = NaiveDate::from_ymd_opt(2018, 8, 1).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2017, 11, 3).unwrap();
        cache.put_filing(&sample_filing(later)).await.unwrap();
        cache.put_filing(&sample_filing(earlier)).await.unwrap();

        let filings = cache
            .filings(&Ticker::new("AAPL"), FilingType::Quarterly)
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = filings.iter().map(Filing::date).collect();
        assert_eq!(dates, vec![earlier, later]);
        assert!(
            cache
                .filings(&Ticker::new("AAPL"), FilingType::Annual)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = SqliteCache::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2018, 8, 1).unwrap();
        cache.put_filing(&sample_filing(date)).await.unwrap();

        assert_eq!(cache.invalidate_stale(Duration::from_secs(3600)).await.unwrap(), 0);

        cache.clear().await.unwrap();
        assert!(
            cache
                .get_filing(&Ticker::new("AAPL"), FilingType::Quarterly, date)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_persists_across_connections() {
        let dir = std::env::temp_dir().join(format!("filings-cache-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("filings.db");
        let date = NaiveDate::from_ymd_opt(2018, 8, 1).unwrap();

        {
            let cache = SqliteCache::new(&path).unwrap();
            cache.put_filing(&sample_filing(date)).await.unwrap();
        }
        let cache = SqliteCache::new(&path).unwrap();
        let filing = cache
            .get_filing(&Ticker::new("AAPL"), FilingType::Quarterly, date)
            .await
            .unwrap();
        assert!(filing.is_some());

        drop(cache);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
