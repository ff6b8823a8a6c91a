//! Identifier types for companies, filings and the documents inside them.
//!
//! - [`Ticker`] - Company ticker
//! - [`FilingType`] - Annual or quarterly statement
//! - [`DocumentType`] - Canonical kind of a filing sub-document
//! - [`SubReportKind`] - Which section of a financial report a value lands in

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FilingError;

/// A company ticker.
///
/// Tickers are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// The kind of periodic statement a filing is.
///
/// Selects the form label used on the EDGAR query page and the set of documents
/// a complete filing must contain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilingType {
    /// Annual report (10-K).
    #[default]
    #[serde(rename = "10-K")]
    Annual,
    /// Quarterly report (10-Q).
    #[serde(rename = "10-Q")]
    Quarterly,
}

impl FilingType {
    /// Both filing types, annual first.
    pub const ALL: [Self; 2] = [Self::Annual, Self::Quarterly];

    /// The EDGAR form label, e.g. `10-K`.
    #[must_use]
    pub const fn form(&self) -> &'static str {
        match self {
            Self::Annual => "10-K",
            Self::Quarterly => "10-Q",
        }
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form())
    }
}

impl FromStr for FilingType {
    type Err = FilingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "10-K" | "10K" | "ANNUAL" => Ok(Self::Annual),
            "10-Q" | "10Q" | "QUARTERLY" => Ok(Self::Quarterly),
            other => Err(FilingError::InvalidParameter(format!(
                "Unknown filing type: {other}"
            ))),
        }
    }
}

/// The section of a [`FinancialReport`](crate::report::FinancialReport) a value belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubReportKind {
    /// Cover page / entity information.
    Entity,
    /// Statement of operations (income statement).
    Operations,
    /// Balance sheet.
    BalanceSheet,
    /// Cash flow statement.
    CashFlow,
}

impl SubReportKind {
    /// All sub-report kinds in report order.
    pub const ALL: [Self; 4] = [
        Self::Entity,
        Self::Operations,
        Self::BalanceSheet,
        Self::CashFlow,
    ];

    /// Human-readable section name, also used as the archive JSON key.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Entity => "Entity Information",
            Self::Operations => "Operational Information",
            Self::BalanceSheet => "Balance Sheet Information",
            Self::CashFlow => "Cash Flow Information",
        }
    }
}

impl fmt::Display for SubReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Canonical type of a sub-document listed on a filing's report index page.
///
/// `Operations` and `Income` are interchangeable: filers title their income
/// statement either way, and both feed the operations sub-report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentType {
    /// Document and entity information (cover page).
    EntityInfo,
    /// Statement of operations / earnings.
    Operations,
    /// Statement of income or comprehensive income.
    Income,
    /// Balance sheet / statement of financial position.
    BalanceSheet,
    /// Statement of cash flows.
    CashFlow,
    /// Earnings-per-share note.
    NotesEps,
    /// Shareholders' equity note.
    NotesEquity,
    /// Debt note.
    NotesDebt,
    /// Anything not of interest.
    Ignore,
}

impl DocumentType {
    /// Documents a filing needs for a complete report.
    ///
    /// `Operations` stands for either `Operations` or `Income`.
    pub const REQUIRED: [Self; 4] = [
        Self::Operations,
        Self::BalanceSheet,
        Self::CashFlow,
        Self::EntityInfo,
    ];

    /// The sub-report this document's rows are mapped into.
    #[must_use]
    pub const fn sub_report(&self) -> Option<SubReportKind> {
        match self {
            Self::EntityInfo => Some(SubReportKind::Entity),
            Self::Operations | Self::Income | Self::NotesEps => Some(SubReportKind::Operations),
            Self::BalanceSheet | Self::NotesEquity | Self::NotesDebt => {
                Some(SubReportKind::BalanceSheet)
            }
            Self::CashFlow => Some(SubReportKind::CashFlow),
            Self::Ignore => None,
        }
    }

    /// Merge order within a sub-report; lower merges first and wins conflicts.
    #[must_use]
    pub const fn merge_priority(&self) -> u8 {
        match self {
            Self::EntityInfo | Self::Operations | Self::BalanceSheet | Self::CashFlow => 0,
            Self::Income => 1,
            Self::NotesEps | Self::NotesEquity | Self::NotesDebt => 2,
            Self::Ignore => u8::MAX,
        }
    }

    /// Display name used in diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EntityInfo => "Entity Info",
            Self::Operations => "Operations",
            Self::Income => "Income",
            Self::BalanceSheet => "Balance Sheet",
            Self::CashFlow => "Cash Flow",
            Self::NotesEps => "Earnings Per Share Notes",
            Self::NotesEquity => "Equity Notes",
            Self::NotesDebt => "Debt Notes",
            Self::Ignore => "Ignore",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
