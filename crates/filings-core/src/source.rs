//! Collaborator traits for retrieving filing pages.
//!
//! - [`FilingSource`] - Base trait for all page sources
//! - [`PageSource`] - Retrieves the body of an EDGAR page
//! - [`CikResolver`] - Maps a ticker to its EDGAR CIK

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::Result;
use crate::types::Ticker;

/// Base trait for all filing sources.
pub trait FilingSource: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "SEC EDGAR").
    fn name(&self) -> &str;
}

/// Retrieves raw pages.
///
/// Paths starting with `/` are relative to the source's base URL; anything else
/// is treated as an absolute URL.
#[async_trait]
pub trait PageSource: FilingSource {
    /// Fetches the body of a page.
    async fn fetch_page(&self, path: &str) -> Result<String>;
}

/// Looks up the Central Index Key of a company.
#[async_trait]
pub trait CikResolver: FilingSource {
    /// Returns the CIK for a ticker, or [`CikNotFound`](crate::FilingError::CikNotFound).
    async fn lookup_cik(&self, ticker: &Ticker) -> Result<String>;
}
