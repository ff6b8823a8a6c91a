#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial statement extraction from SEC EDGAR filings.
//!
//! This crate ties the filings crates together. It re-exports the core types,
//! the cache backends and the EDGAR collaborators, and provides a
//! [`FilingFetcher`] that opens per-company [`Company`] folders.
//!
//! # Features
//!
//! - `edgar` - HTTP access to SEC EDGAR
//! - `cache-sqlite` - SQLite-based filing cache
//!
//! # Example
//!
//! ```rust,ignore
//! use filings::{FetcherConfig, FilingFetcher, FilingType};
//!
//! #[tokio::main]
//! async fn main() -> filings::Result<()> {
//!     let fetcher = FilingFetcher::edgar(
//!         "MyApp/1.0 (contact@example.com)",
//!         FetcherConfig::default().with_min_year(2015),
//!     )?;
//!
//!     let company = fetcher.company_folder("AAPL", &[FilingType::Quarterly]).await?;
//!     let dates = company.available_filings(FilingType::Quarterly).await;
//!     let (filings, error) = company.filings(FilingType::Quarterly, &dates).await.into_parts();
//!     println!("{} complete filings, {:?}", filings.len(), error);
//!     println!("{}", company.to_frame(FilingType::Quarterly).await?);
//!     Ok(())
//! }
//! ```

// Re-export core types
pub use filings_core::*;

// Re-export the page parsers
pub use filings_parser as parser;

// Re-export cache implementations
pub use filings_cache::{InMemoryCache, NoopCache};

#[cfg(feature = "cache-sqlite")]
pub use filings_cache::SqliteCache;

// Re-export EDGAR collaborators
#[cfg(feature = "edgar")]
pub use filings_edgar::{EdgarClient, ReplaySource};

mod company;
mod config;
mod fetcher;

pub use company::{Company, FilingBatch};
pub use config::{DEFAULT_MIN_YEAR, FetcherConfig};
pub use fetcher::FilingFetcher;
