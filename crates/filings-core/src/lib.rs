#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core data model for EDGAR filing extraction.
//!
//! This crate provides the types every other filings crate shares:
//!
//! - [`FinancialDataItem`](item::FinancialDataItem) - Canonical line items and their units
//! - [`FinancialReport`](report::FinancialReport) - The four sub-reports of a filing
//! - [`Filing`](filing::Filing) - A report tied to a company and date
//! - [`PageSource`](source::PageSource) / [`CikResolver`](source::CikResolver) - Retrieval collaborators
//! - [`FilingCache`](cache::FilingCache) - Caching abstraction

/// Cache trait for storing extracted filings.
pub mod cache;
/// Error types for filing extraction.
pub mod error;
/// A single extracted filing.
pub mod filing;
/// Canonical line items, units and scales.
pub mod item;
/// Sub-report records and the aggregate report.
pub mod report;
/// Collaborator traits for retrieving pages.
pub mod source;
/// Identifier types (Ticker, FilingType, DocumentType).
pub mod types;
/// Validation and derivation of required items.
pub mod validate;

// Re-export commonly used items at crate root
pub use cache::FilingCache;
pub use error::{FilingError, Result};
pub use filing::Filing;
pub use item::{Derivation, FinancialDataItem, ScaleEntity, ScaleFactor, ScaleMap};
pub use report::{
    BsData, CfData, EntityData, FinancialReport, OpsData, StatementData, SubReport,
};
pub use source::{CikResolver, FilingSource, PageSource};
pub use types::{DocumentType, FilingType, SubReportKind, Ticker};
pub use validate::MissingFields;
