//! Entry point: resolves companies and keeps their folders.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, instrument};

use filings_core::{
    CikResolver, FilingCache, FilingSource, FilingType, PageSource, Result, Ticker,
};

use crate::company::{Company, CompanyArchive};
use crate::config::FetcherConfig;

/// Opens company folders against a page source, a CIK resolver and an
/// optional persistent cache.
///
/// Folders are kept per ticker, so asking for the same company twice returns
/// the same [`Company`] and its already parsed filings.
///
/// # Example
///
/// ```rust,ignore
/// use filings::{FetcherConfig, FilingFetcher, FilingType, SqliteCache};
/// use std::sync::Arc;
///
/// let fetcher = FilingFetcher::edgar("MyApp/1.0 (contact@example.com)", FetcherConfig::default())?
///     .with_cache(Arc::new(SqliteCache::new("filings.db")?));
///
/// let company = fetcher.company_folder("MSFT", &[FilingType::Quarterly]).await?;
/// let dates = company.available_filings(FilingType::Quarterly).await;
/// let batch = company.filings(FilingType::Quarterly, &dates[..4]).await;
/// ```
pub struct FilingFetcher {
    pages: Arc<dyn PageSource>,
    ciks: Arc<dyn CikResolver>,
    cache: Option<Arc<dyn FilingCache>>,
    config: FetcherConfig,
    folders: Mutex<HashMap<Ticker, Arc<Company>>>,
}

impl std::fmt::Debug for FilingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilingFetcher")
            .field("pages", &self.pages.name())
            .field("ciks", &self.ciks.name())
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FilingFetcher {
    /// Create a fetcher from separate page and CIK collaborators.
    pub fn new(pages: Arc<dyn PageSource>, ciks: Arc<dyn CikResolver>) -> Self {
        Self {
            pages,
            ciks,
            cache: None,
            config: FetcherConfig::default(),
            folders: Mutex::new(HashMap::new()),
        }
    }

    /// Create a fetcher from one source that serves both pages and CIKs.
    pub fn from_source<S>(source: S) -> Self
    where
        S: PageSource + CikResolver + 'static,
    {
        let source = Arc::new(source);
        Self::new(source.clone(), source)
    }

    /// Create a fetcher backed by SEC EDGAR.
    ///
    /// The configured base URL, if any, replaces the EDGAR host.
    #[cfg(feature = "edgar")]
    pub fn edgar(user_agent: &str, config: FetcherConfig) -> Result<Self> {
        let mut client = filings_edgar::EdgarClient::new(user_agent)?;
        if let Some(base_url) = config.base_url() {
            client = client.with_base_url(base_url);
        }
        Ok(Self::from_source(client).with_config(config))
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: FetcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the persistent cache companies read from and write to.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn FilingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// The active configuration.
    pub const fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Returns the folder of a company, creating it on first request.
    ///
    /// A new folder requires the ticker's CIK. Filing links are loaded for
    /// every listed type the folder does not know yet.
    ///
    /// # Errors
    ///
    /// - [`FilingError::CikNotFound`](filings_core::FilingError::CikNotFound) if the ticker is unknown
    /// - [`FilingError::Fetch`](filings_core::FilingError::Fetch) if a filing list cannot be retrieved
    pub async fn company_folder(
        &self,
        ticker: impl Into<Ticker>,
        filing_types: &[FilingType],
    ) -> Result<Arc<Company>> {
        self.open_folder(ticker.into(), filing_types).await
    }

    /// Rebuilds a folder from [`Company::to_json`] output.
    ///
    /// The saved filings are served without fetching; links are loaded for
    /// `filing_types` so newer filings remain reachable. Replaces any folder
    /// already open for the same ticker.
    #[instrument(skip(self, json))]
    pub async fn restore_folder(
        &self,
        json: &str,
        filing_types: &[FilingType],
    ) -> Result<Arc<Company>> {
        let archive: CompanyArchive = serde_json::from_str(json)?;
        let company = Arc::new(self.create(archive.company).await?);
        company.restore(archive.reports).await;
        self.load_links(&company, filing_types).await?;

        self.folders
            .lock()
            .await
            .insert(company.ticker().clone(), Arc::clone(&company));
        debug!(ticker = %company.ticker(), "Restored company folder");
        Ok(company)
    }

    /// The open folder of a company, if any.
    pub async fn folder(&self, ticker: &Ticker) -> Option<Arc<Company>> {
        self.folders.lock().await.get(ticker).cloned()
    }

    #[instrument(skip(self, filing_types), fields(ticker = %ticker))]
    async fn open_folder(
        &self,
        ticker: Ticker,
        filing_types: &[FilingType],
    ) -> Result<Arc<Company>> {
        let existing = self.folder(&ticker).await;
        let company = match existing {
            Some(company) => company,
            None => {
                let created = Arc::new(self.create(ticker).await?);
                let mut folders = self.folders.lock().await;
                Arc::clone(folders.entry(created.ticker().clone()).or_insert(created))
            }
        };
        self.load_links(&company, filing_types).await?;
        Ok(company)
    }

    async fn create(&self, ticker: Ticker) -> Result<Company> {
        let cik = self.ciks.lookup_cik(&ticker).await?;
        debug!(ticker = %ticker, cik = %cik, "Opening company folder");
        let cache = if self.config.persistent_cache() {
            self.cache.clone()
        } else {
            None
        };
        Ok(Company::new(
            ticker,
            cik,
            self.config.min_year(),
            Arc::clone(&self.pages),
            cache,
        ))
    }

    async fn load_links(&self, company: &Company, filing_types: &[FilingType]) -> Result<()> {
        for &filing_type in filing_types {
            if !company.has_links(filing_type).await {
                company.load_filing_links(filing_type).await?;
            }
        }
        Ok(())
    }
}
