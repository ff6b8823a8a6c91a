//! Fetcher configuration.

/// Earliest reporting year kept from a company's filing list.
///
/// Older filings predate the interactive data viewer layout the parser reads.
pub const DEFAULT_MIN_YEAR: i32 = 2011;

/// Settings for a [`FilingFetcher`](crate::FilingFetcher).
///
/// # Example
///
/// ```
/// use filings::FetcherConfig;
///
/// let config = FetcherConfig::default()
///     .with_min_year(2015)
///     .with_persistent_cache(false);
/// assert_eq!(config.min_year(), 2015);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetcherConfig {
    min_year: i32,
    base_url: Option<String>,
    persistent_cache: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
            base_url: None,
            persistent_cache: true,
        }
    }
}

impl FetcherConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only filings dated in `year` or later.
    #[must_use]
    pub const fn with_min_year(mut self, year: i32) -> Self {
        self.min_year = year;
        self
    }

    /// Fetch EDGAR pages from another host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Whether companies read from and write to the fetcher's persistent cache.
    #[must_use]
    pub const fn with_persistent_cache(mut self, enabled: bool) -> Self {
        self.persistent_cache = enabled;
        self
    }

    /// Earliest reporting year kept.
    pub const fn min_year(&self) -> i32 {
        self.min_year
    }

    /// EDGAR host override, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Whether the persistent cache is consulted.
    pub const fn persistent_cache(&self) -> bool {
        self.persistent_cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FetcherConfig::new();
        assert_eq!(config.min_year(), DEFAULT_MIN_YEAR);
        assert_eq!(config.base_url(), None);
        assert!(config.persistent_cache());
    }

    #[test]
    fn test_builder() {
        let config = FetcherConfig::default()
            .with_min_year(2018)
            .with_base_url("http://localhost:9000")
            .with_persistent_cache(false);
        assert_eq!(config.min_year(), 2018);
        assert_eq!(config.base_url(), Some("http://localhost:9000"));
        assert!(!config.persistent_cache());
    }
}
