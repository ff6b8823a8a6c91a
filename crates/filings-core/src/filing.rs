//! A single extracted filing.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{FilingError, Result};
use crate::item::FinancialDataItem;
use crate::report::FinancialReport;
use crate::types::{FilingType, Ticker};

/// One company's financial report for one reporting date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    #[serde(rename = "Company")]
    ticker: Ticker,
    #[serde(rename = "Report date")]
    date: NaiveDate,
    #[serde(rename = "Financial Data")]
    report: FinancialReport,
}

impl Filing {
    /// Wraps a parsed report.
    #[must_use]
    pub const fn new(ticker: Ticker, date: NaiveDate, report: FinancialReport) -> Self {
        Self {
            ticker,
            date,
            report,
        }
    }

    /// The filing company.
    #[must_use]
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Reporting date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    /// Annual or quarterly.
    #[must_use]
    pub const fn filing_type(&self) -> FilingType {
        self.report.filing_type()
    }

    /// The extracted report.
    #[must_use]
    pub const fn report(&self) -> &FinancialReport {
        &self.report
    }

    /// The collected value of any item.
    #[must_use]
    pub fn value(&self, item: FinancialDataItem) -> Option<f64> {
        self.report.value(item)
    }

    /// Whether every required item is present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.report.is_complete()
    }

    /// `Ok` if complete, otherwise the missing-fields error.
    pub fn status(&self) -> Result<()> {
        let missing = self.report.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FilingError::MissingRequiredFields(missing))
        }
    }

    /// Common shares outstanding.
    #[must_use]
    pub fn share_count(&self) -> Option<f64> {
        self.value(FinancialDataItem::SharesOutstanding)
    }

    /// Revenue.
    #[must_use]
    pub fn revenue(&self) -> Option<f64> {
        self.value(FinancialDataItem::Revenue)
    }

    /// Cost of revenue.
    #[must_use]
    pub fn cost_of_revenue(&self) -> Option<f64> {
        self.value(FinancialDataItem::CostOfRevenue)
    }

    /// Gross margin.
    #[must_use]
    pub fn gross_margin(&self) -> Option<f64> {
        self.value(FinancialDataItem::GrossMargin)
    }

    /// Operating income.
    #[must_use]
    pub fn operating_income(&self) -> Option<f64> {
        self.value(FinancialDataItem::OperatingIncome)
    }

    /// Operating expense.
    #[must_use]
    pub fn operating_expense(&self) -> Option<f64> {
        self.value(FinancialDataItem::OperatingExpense)
    }

    /// Net income.
    #[must_use]
    pub fn net_income(&self) -> Option<f64> {
        self.value(FinancialDataItem::NetIncome)
    }

    /// Weighted average share count.
    #[must_use]
    pub fn weighted_average_shares(&self) -> Option<f64> {
        self.value(FinancialDataItem::WeightedAverageShares)
    }

    /// Dividend per share.
    #[must_use]
    pub fn dividend_per_share(&self) -> Option<f64> {
        self.value(FinancialDataItem::DividendPerShare)
    }

    /// Operating cash flow.
    #[must_use]
    pub fn operating_cash_flow(&self) -> Option<f64> {
        self.value(FinancialDataItem::OperatingCashFlow)
    }

    /// Capital expenditure.
    #[must_use]
    pub fn capital_expenditure(&self) -> Option<f64> {
        self.value(FinancialDataItem::CapitalExpenditure)
    }

    /// Dividends paid.
    #[must_use]
    pub fn dividends(&self) -> Option<f64> {
        self.value(FinancialDataItem::Dividends)
    }

    /// Interest paid.
    #[must_use]
    pub fn interest_paid(&self) -> Option<f64> {
        self.value(FinancialDataItem::InterestPaid)
    }

    /// Long-term debt.
    #[must_use]
    pub fn long_term_debt(&self) -> Option<f64> {
        self.value(FinancialDataItem::LongTermDebt)
    }

    /// Short-term debt.
    #[must_use]
    pub fn short_term_debt(&self) -> Option<f64> {
        self.value(FinancialDataItem::ShortTermDebt)
    }

    /// Current liabilities.
    #[must_use]
    pub fn current_liabilities(&self) -> Option<f64> {
        self.value(FinancialDataItem::CurrentLiabilities)
    }

    /// Deferred revenue.
    #[must_use]
    pub fn deferred_revenue(&self) -> Option<f64> {
        self.value(FinancialDataItem::DeferredRevenue)
    }

    /// Retained earnings.
    #[must_use]
    pub fn retained_earnings(&self) -> Option<f64> {
        self.value(FinancialDataItem::RetainedEarnings)
    }

    /// Total shareholder equity.
    #[must_use]
    pub fn total_equity(&self) -> Option<f64> {
        self.value(FinancialDataItem::TotalEquity)
    }

    /// Current assets.
    #[must_use]
    pub fn current_assets(&self) -> Option<f64> {
        self.value(FinancialDataItem::CurrentAssets)
    }

    /// Cash and equivalents.
    #[must_use]
    pub fn cash(&self) -> Option<f64> {
        self.value(FinancialDataItem::Cash)
    }

    /// Goodwill.
    #[must_use]
    pub fn goodwill(&self) -> Option<f64> {
        self.value(FinancialDataItem::Goodwill)
    }

    /// Intangible assets.
    #[must_use]
    pub fn intangibles(&self) -> Option<f64> {
        self.value(FinancialDataItem::Intangibles)
    }

    /// Total assets.
    #[must_use]
    pub fn total_assets(&self) -> Option<f64> {
        self.value(FinancialDataItem::TotalAssets)
    }

    /// Total liabilities.
    #[must_use]
    pub fn total_liabilities(&self) -> Option<f64> {
        self.value(FinancialDataItem::TotalLiabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Filing {
        let mut report = FinancialReport::new(FilingType::Quarterly);
        report.set(FinancialDataItem::Revenue, 1_000.0).unwrap();
        report.set(FinancialDataItem::Cash, 0.0).unwrap();
        Filing::new(
            Ticker::new("aapl"),
            NaiveDate::from_ymd_opt(2020, 3, 28).unwrap(),
            report,
        )
    }

    #[test]
    fn test_accessors_distinguish_missing() {
        let filing = sample();
        assert_eq!(filing.revenue(), Some(1_000.0));
        assert_eq!(filing.cash(), Some(0.0));
        assert_eq!(filing.net_income(), None);
        assert_eq!(filing.filing_type(), FilingType::Quarterly);
        assert!(!filing.is_complete());
        assert!(matches!(
            filing.status(),
            Err(FilingError::MissingRequiredFields(_))
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_collected_set() {
        let filing = sample();
        let json = serde_json::to_string(&filing).unwrap();
        assert!(json.contains("\"Company\":\"AAPL\""));
        assert!(json.contains("\"Report date\":\"2020-03-28\""));
        let restored: Filing = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, filing);
        assert_eq!(restored.net_income(), None);
    }
}
