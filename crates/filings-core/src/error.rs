//! Error types for filing extraction.
//!
//! This module defines [`FilingError`] which covers every failure that can occur
//! while fetching, classifying, parsing, validating or caching a filing.

use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

use crate::filing::Filing;
use crate::item::FinancialDataItem;
use crate::types::SubReportKind;
use crate::validate::MissingFields;

/// Errors that can occur during filing extraction.
#[derive(Error, Debug)]
pub enum FilingError {
    /// A cell could not be converted to a number.
    #[error("Cannot normalize {0:?} to a number")]
    Normalization(String),

    /// A resolved item has no field in the target sub-report.
    #[error("No field for {item} in {report}")]
    FieldNotFound {
        /// The item that was being stored.
        item: FinancialDataItem,
        /// The sub-report that lacks it.
        report: SubReportKind,
    },

    /// Required items that were neither parsed nor derivable.
    #[error("Missing required fields: {0}")]
    MissingRequiredFields(MissingFields),

    /// No filing link exists for a requested date, or a required document link is absent.
    #[error("Link resolution failed: {0}")]
    LinkResolution(String),

    /// Retrieving a page failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The ticker has no CIK on EDGAR.
    #[error("CIK not found for ticker {0}")]
    CikNotFound(String),

    /// A filing index page matched none of the known layouts.
    #[error("Unrecognized filing index structure: {0}")]
    IndexStructure(String),

    /// A page could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The filing was parsed but is missing required items.
    ///
    /// The partially populated filing is still cached and returned here.
    #[error("{} filing of {} dated {} is incomplete: {missing}", .filing.filing_type(), .filing.ticker(), .filing.date())]
    Incomplete {
        /// The partially populated filing.
        filing: Arc<Filing>,
        /// What is missing from it.
        missing: MissingFields,
    },

    /// Some dates of a multi-date request failed.
    #[error("{} of the requested filings failed: {}", .0.len(), summarize(.0))]
    Batch(Vec<(NaiveDate, FilingError)>),
}

fn summarize(failures: &[(NaiveDate, FilingError)]) -> String {
    failures
        .iter()
        .map(|(date, err)| format!("{date}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<serde_json::Error> for FilingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using [`FilingError`].
pub type Result<T> = std::result::Result<T, FilingError>;
