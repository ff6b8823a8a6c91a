//! Canonical financial line items and the units they are reported in.
//!
//! Every [`FinancialDataItem`] belongs to exactly one [`SubReportKind`], has a
//! unit class ([`ScaleEntity`]) that selects which factor of a document's
//! [`ScaleMap`] applies to it, and may be required or derivable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{DocumentType, SubReportKind};

/// A canonical financial line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FinancialDataItem {
    /// Common shares outstanding (cover page).
    #[serde(rename = "Shares Outstanding")]
    SharesOutstanding,
    /// Total revenue / net sales.
    #[serde(rename = "Revenue")]
    Revenue,
    /// Cost of revenue / cost of goods sold.
    #[serde(rename = "Cost Of Revenue")]
    CostOfRevenue,
    /// Revenue less cost of revenue.
    #[serde(rename = "Gross Margin")]
    GrossMargin,
    /// Operating income (loss).
    #[serde(rename = "Operational Income")]
    OperatingIncome,
    /// Operating expenses.
    #[serde(rename = "Operational Expense")]
    OperatingExpense,
    /// Net income (loss).
    #[serde(rename = "Net Income")]
    NetIncome,
    /// Weighted average diluted share count.
    #[serde(rename = "Weighted Average Share Count", alias = "Weighted Average Shares")]
    WeightedAverageShares,
    /// Dividends declared per common share.
    #[serde(rename = "Dividend Per Share")]
    DividendPerShare,
    /// Net cash from operating activities.
    #[serde(rename = "Operating Cash Flow")]
    OperatingCashFlow,
    /// Payments for property, plant and equipment.
    #[serde(rename = "Capital Expenditure")]
    CapitalExpenditure,
    /// Dividends paid (cash flow, usually negative).
    #[serde(rename = "Dividends paid", alias = "Dividends Paid")]
    Dividends,
    /// Interest paid.
    #[serde(rename = "Interest paid", alias = "Interest Paid")]
    InterestPaid,
    /// Long-term debt, noncurrent.
    #[serde(rename = "Long-Term debt")]
    LongTermDebt,
    /// Current portion of long-term debt.
    #[serde(rename = "Short-Term debt")]
    ShortTermDebt,
    /// Total current liabilities.
    #[serde(rename = "Current Liabilities")]
    CurrentLiabilities,
    /// Deferred revenue.
    #[serde(rename = "Deferred revenue")]
    DeferredRevenue,
    /// Retained earnings (accumulated deficit).
    #[serde(rename = "Retained Earnings")]
    RetainedEarnings,
    /// Total stockholders' equity.
    #[serde(rename = "Total Shareholder Equity")]
    TotalEquity,
    /// Total current assets.
    #[serde(rename = "Current Assets")]
    CurrentAssets,
    /// Cash and cash equivalents.
    #[serde(rename = "Cash")]
    Cash,
    /// Goodwill.
    #[serde(rename = "Goodwill")]
    Goodwill,
    /// Intangible assets excluding goodwill.
    #[serde(rename = "Intangible Assets")]
    Intangibles,
    /// Total assets.
    #[serde(rename = "Total Assets")]
    TotalAssets,
    /// Total liabilities.
    #[serde(rename = "Total Liabilities")]
    TotalLiabilities,
    /// A tag or label that maps to nothing of interest.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl FinancialDataItem {
    /// Every canonical item except [`Unknown`](Self::Unknown), in report order.
    pub const ALL: [Self; 25] = [
        Self::SharesOutstanding,
        Self::Revenue,
        Self::CostOfRevenue,
        Self::GrossMargin,
        Self::OperatingIncome,
        Self::OperatingExpense,
        Self::NetIncome,
        Self::WeightedAverageShares,
        Self::DividendPerShare,
        Self::CurrentLiabilities,
        Self::RetainedEarnings,
        Self::TotalEquity,
        Self::LongTermDebt,
        Self::ShortTermDebt,
        Self::DeferredRevenue,
        Self::CurrentAssets,
        Self::Cash,
        Self::Goodwill,
        Self::Intangibles,
        Self::TotalAssets,
        Self::TotalLiabilities,
        Self::OperatingCashFlow,
        Self::CapitalExpenditure,
        Self::Dividends,
        Self::InterestPaid,
    ];

    /// The sub-report this item is stored in, `None` for `Unknown`.
    #[must_use]
    pub const fn sub_report(&self) -> Option<SubReportKind> {
        match self {
            Self::SharesOutstanding => Some(SubReportKind::Entity),
            Self::Revenue
            | Self::CostOfRevenue
            | Self::GrossMargin
            | Self::OperatingIncome
            | Self::OperatingExpense
            | Self::NetIncome
            | Self::WeightedAverageShares
            | Self::DividendPerShare => Some(SubReportKind::Operations),
            Self::OperatingCashFlow
            | Self::CapitalExpenditure
            | Self::Dividends
            | Self::InterestPaid => Some(SubReportKind::CashFlow),
            Self::LongTermDebt
            | Self::ShortTermDebt
            | Self::CurrentLiabilities
            | Self::DeferredRevenue
            | Self::RetainedEarnings
            | Self::TotalEquity
            | Self::CurrentAssets
            | Self::Cash
            | Self::Goodwill
            | Self::Intangibles
            | Self::TotalAssets
            | Self::TotalLiabilities => Some(SubReportKind::BalanceSheet),
            Self::Unknown => None,
        }
    }

    /// Unit class used to pick a scale factor.
    #[must_use]
    pub const fn unit(&self) -> ScaleEntity {
        match self {
            Self::SharesOutstanding | Self::WeightedAverageShares => ScaleEntity::Shares,
            Self::DividendPerShare => ScaleEntity::PerShare,
            _ => ScaleEntity::Money,
        }
    }

    /// Whether a complete report must carry this item.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(
            self,
            Self::SharesOutstanding
                | Self::Revenue
                | Self::CostOfRevenue
                | Self::GrossMargin
                | Self::OperatingIncome
                | Self::OperatingExpense
                | Self::NetIncome
                | Self::WeightedAverageShares
                | Self::DividendPerShare
                | Self::OperatingCashFlow
                | Self::CapitalExpenditure
                | Self::CurrentLiabilities
                | Self::RetainedEarnings
                | Self::TotalEquity
        )
    }

    /// The rule that can synthesize this item from others, if any.
    #[must_use]
    pub const fn derivation(&self) -> Option<Derivation> {
        match self {
            Self::GrossMargin => Some(Derivation::GrossMargin),
            Self::OperatingExpense => Some(Derivation::OperatingExpense),
            Self::DividendPerShare => Some(Derivation::DividendPerShare),
            _ => None,
        }
    }

    /// Human-readable label, identical to the archive JSON key.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::SharesOutstanding => "Shares Outstanding",
            Self::Revenue => "Revenue",
            Self::CostOfRevenue => "Cost Of Revenue",
            Self::GrossMargin => "Gross Margin",
            Self::OperatingIncome => "Operational Income",
            Self::OperatingExpense => "Operational Expense",
            Self::NetIncome => "Net Income",
            Self::WeightedAverageShares => "Weighted Average Share Count",
            Self::DividendPerShare => "Dividend Per Share",
            Self::OperatingCashFlow => "Operating Cash Flow",
            Self::CapitalExpenditure => "Capital Expenditure",
            Self::Dividends => "Dividends paid",
            Self::InterestPaid => "Interest paid",
            Self::LongTermDebt => "Long-Term debt",
            Self::ShortTermDebt => "Short-Term debt",
            Self::CurrentLiabilities => "Current Liabilities",
            Self::DeferredRevenue => "Deferred revenue",
            Self::RetainedEarnings => "Retained Earnings",
            Self::TotalEquity => "Total Shareholder Equity",
            Self::CurrentAssets => "Current Assets",
            Self::Cash => "Cash",
            Self::Goodwill => "Goodwill",
            Self::Intangibles => "Intangible Assets",
            Self::TotalAssets => "Total Assets",
            Self::TotalLiabilities => "Total Liabilities",
            Self::Unknown => "Unknown",
        }
    }

    /// Snake-case column name used for tabular export.
    #[must_use]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::SharesOutstanding => "shares_outstanding",
            Self::Revenue => "revenue",
            Self::CostOfRevenue => "cost_of_revenue",
            Self::GrossMargin => "gross_margin",
            Self::OperatingIncome => "operating_income",
            Self::OperatingExpense => "operating_expense",
            Self::NetIncome => "net_income",
            Self::WeightedAverageShares => "weighted_average_shares",
            Self::DividendPerShare => "dividend_per_share",
            Self::OperatingCashFlow => "operating_cash_flow",
            Self::CapitalExpenditure => "capital_expenditure",
            Self::Dividends => "dividends",
            Self::InterestPaid => "interest_paid",
            Self::LongTermDebt => "long_term_debt",
            Self::ShortTermDebt => "short_term_debt",
            Self::CurrentLiabilities => "current_liabilities",
            Self::DeferredRevenue => "deferred_revenue",
            Self::RetainedEarnings => "retained_earnings",
            Self::TotalEquity => "total_equity",
            Self::CurrentAssets => "current_assets",
            Self::Cash => "cash",
            Self::Goodwill => "goodwill",
            Self::Intangibles => "intangibles",
            Self::TotalAssets => "total_assets",
            Self::TotalLiabilities => "total_liabilities",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FinancialDataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rules that synthesize a required item from already-collected ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Derivation {
    /// `Revenue - CostOfRevenue`.
    GrossMargin,
    /// `Revenue - CostOfRevenue - OperatingIncome`.
    OperatingExpense,
    /// `-Dividends / WeightedAverageShares`, falling back to `SharesOutstanding`.
    DividendPerShare,
}

impl Derivation {
    /// Computes the derived value, `None` when an input is missing or the divisor is zero.
    ///
    /// `value` returns a collected value for an item, or `None` if it was never observed.
    pub fn compute(&self, value: impl Fn(FinancialDataItem) -> Option<f64>) -> Option<f64> {
        use FinancialDataItem as I;
        match self {
            Self::GrossMargin => Some(value(I::Revenue)? - value(I::CostOfRevenue)?),
            Self::OperatingExpense => Some(
                value(I::Revenue)? - value(I::CostOfRevenue)? - value(I::OperatingIncome)?,
            ),
            Self::DividendPerShare => {
                let dividends = value(I::Dividends)?;
                let shares = value(I::WeightedAverageShares).or_else(|| value(I::SharesOutstanding))?;
                if shares == 0.0 {
                    return None;
                }
                Some(-dividends / shares)
            }
        }
    }
}

/// Unit class of a line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleEntity {
    /// Share counts.
    Shares,
    /// Currency amounts.
    Money,
    /// Per-share currency amounts.
    PerShare,
}

/// Multiplier declared in a statement heading ("in thousands", "in millions").
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleFactor {
    /// No scaling.
    #[default]
    One,
    /// Thousands.
    Thousand,
    /// Millions.
    Million,
    /// Billions.
    Billion,
}

impl ScaleFactor {
    /// Numeric multiplier.
    #[must_use]
    pub const fn value(&self) -> f64 {
        match self {
            Self::One => 1.0,
            Self::Thousand => 1e3,
            Self::Million => 1e6,
            Self::Billion => 1e9,
        }
    }
}

/// Per-document scale factors, one for each [`ScaleEntity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaleMap {
    /// Factor for share counts.
    pub shares: ScaleFactor,
    /// Factor for currency amounts.
    pub money: ScaleFactor,
    /// Factor for per-share amounts.
    pub per_share: ScaleFactor,
}

impl ScaleMap {
    /// Default scales before any heading is read.
    ///
    /// Cover pages report share counts unscaled; statements default to millions.
    #[must_use]
    pub const fn defaults_for(doc_type: DocumentType) -> Self {
        let shares = match doc_type {
            DocumentType::EntityInfo => ScaleFactor::One,
            _ => ScaleFactor::Million,
        };
        Self {
            shares,
            money: ScaleFactor::Million,
            per_share: ScaleFactor::One,
        }
    }

    /// The factor for a unit class.
    #[must_use]
    pub const fn factor(&self, entity: ScaleEntity) -> ScaleFactor {
        match entity {
            ScaleEntity::Shares => self.shares,
            ScaleEntity::Money => self.money,
            ScaleEntity::PerShare => self.per_share,
        }
    }

    /// Overrides the factor for a unit class.
    pub fn set(&mut self, entity: ScaleEntity, factor: ScaleFactor) {
        match entity {
            ScaleEntity::Shares => self.shares = factor,
            ScaleEntity::Money => self.money = factor,
            ScaleEntity::PerShare => self.per_share = factor,
        }
    }

    /// Scales a normalized value by the factor of `item`'s unit class.
    #[must_use]
    pub fn apply(&self, item: FinancialDataItem, value: f64) -> f64 {
        value * self.factor(item.unit()).value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_every_item_has_a_sub_report() {
        for item in FinancialDataItem::ALL {
            assert!(item.sub_report().is_some(), "{item} has no sub-report");
        }
        assert_eq!(FinancialDataItem::Unknown.sub_report(), None);
    }

    #[test]
    fn test_derivable_items_are_required() {
        for item in FinancialDataItem::ALL {
            if item.derivation().is_some() {
                assert!(item.is_required());
            }
        }
    }

    #[test]
    fn test_dividend_per_share_falls_back_to_outstanding() {
        let values: HashMap<_, _> = [
            (FinancialDataItem::Dividends, -500.0),
            (FinancialDataItem::SharesOutstanding, 250.0),
        ]
        .into_iter()
        .collect();
        let dps = Derivation::DividendPerShare.compute(|i| values.get(&i).copied());
        assert_eq!(dps, Some(2.0));
    }

    #[test]
    fn test_derivation_needs_all_inputs() {
        let dps = Derivation::GrossMargin.compute(|i| match i {
            FinancialDataItem::Revenue => Some(10.0),
            _ => None,
        });
        assert_eq!(dps, None);
    }

    #[test]
    fn test_scale_defaults() {
        let entity = ScaleMap::defaults_for(DocumentType::EntityInfo);
        assert_eq!(entity.shares, ScaleFactor::One);
        let ops = ScaleMap::defaults_for(DocumentType::Operations);
        assert_eq!(ops.shares, ScaleFactor::Million);
        assert_eq!(ops.money, ScaleFactor::Million);
        assert_eq!(ops.per_share, ScaleFactor::One);
        assert_eq!(ops.apply(FinancialDataItem::DividendPerShare, 0.5), 0.5);
        assert_eq!(ops.apply(FinancialDataItem::Revenue, 2.0), 2e6);
    }
}
