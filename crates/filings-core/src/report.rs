//! Sub-report records and the aggregate [`FinancialReport`].
//!
//! Each sub-report is a flat record of `f64` fields plus the set of items that
//! have actually been observed, so a legitimate zero is distinguishable from a
//! value that was never reported. Fields are reached through an explicit
//! `FinancialDataItem -> field` match per record type.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;

use crate::error::{FilingError, Result};
use crate::item::FinancialDataItem;
use crate::types::{FilingType, SubReportKind};

/// Common behaviour of the four sub-report records.
pub trait SubReport: Default + Clone + Debug + Send + Sync + 'static {
    /// Which section of the report this record is.
    const KIND: SubReportKind;

    /// Items declared by this record, in field order.
    const ITEMS: &'static [FinancialDataItem];

    /// Stored value for a declared item, collected or not.
    fn slot(&self, item: FinancialDataItem) -> Option<f64>;

    /// Mutable storage for a declared item.
    fn slot_mut(&mut self, item: FinancialDataItem) -> Option<&mut f64>;

    /// Items observed so far.
    fn collected(&self) -> &BTreeSet<FinancialDataItem>;

    /// Mutable access to the observed set.
    fn collected_mut(&mut self) -> &mut BTreeSet<FinancialDataItem>;

    /// Whether `item` is a field of this record.
    fn declares(item: FinancialDataItem) -> bool {
        Self::ITEMS.contains(&item)
    }

    /// Whether `item` has been observed.
    fn is_collected(&self, item: FinancialDataItem) -> bool {
        self.collected().contains(&item)
    }

    /// The value of `item` if it has been observed.
    fn get(&self, item: FinancialDataItem) -> Option<f64> {
        if self.is_collected(item) {
            self.slot(item)
        } else {
            None
        }
    }

    /// Stores `value` for `item` and marks it collected, overwriting any previous value.
    fn set(&mut self, item: FinancialDataItem, value: f64) -> Result<()> {
        let slot = self
            .slot_mut(item)
            .ok_or(FilingError::FieldNotFound {
                item,
                report: Self::KIND,
            })?;
        *slot = value;
        self.collected_mut().insert(item);
        Ok(())
    }

    /// Required items not yet observed, in field order.
    fn missing_required(&self) -> Vec<FinancialDataItem> {
        Self::ITEMS
            .iter()
            .copied()
            .filter(|item| item.is_required() && !self.is_collected(*item))
            .collect()
    }

    /// Copies every item collected in `other` that is not yet collected here.
    ///
    /// Returns the number of items taken from `other`.
    fn merge_from(&mut self, other: &Self) -> usize {
        let mut taken = 0;
        for item in other.collected().iter().copied() {
            if self.is_collected(item) {
                continue;
            }
            let Some(value) = other.slot(item) else {
                continue;
            };
            if self.set(item, value).is_ok() {
                taken += 1;
            }
        }
        taken
    }
}

/// `Collected Data` as stored in an archive: a list of item labels, or a
/// bitmask over the record's fields in declaration order.
#[derive(Deserialize)]
#[serde(untagged)]
enum CollectedRepr {
    Items(BTreeSet<FinancialDataItem>),
    Bits(u64),
}

fn collected<'de, R, D>(
    deserializer: D,
) -> std::result::Result<BTreeSet<FinancialDataItem>, D::Error>
where
    R: SubReport,
    D: Deserializer<'de>,
{
    Ok(match CollectedRepr::deserialize(deserializer)? {
        CollectedRepr::Items(items) => items,
        CollectedRepr::Bits(bits) => R::ITEMS
            .iter()
            .enumerate()
            .filter(|(bit, _)| (bits >> bit) & 1 == 1)
            .map(|(_, item)| *item)
            .collect(),
    })
}

/// Cover page data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    #[serde(rename = "Shares Outstanding")]
    share_count: f64,
    #[serde(
        rename = "Collected Data",
        default,
        deserialize_with = "collected::<EntityData, _>"
    )]
    collected: BTreeSet<FinancialDataItem>,
}

impl SubReport for EntityData {
    const KIND: SubReportKind = SubReportKind::Entity;
    const ITEMS: &'static [FinancialDataItem] = &[FinancialDataItem::SharesOutstanding];

    fn slot(&self, item: FinancialDataItem) -> Option<f64> {
        match item {
            FinancialDataItem::SharesOutstanding => Some(self.share_count),
            _ => None,
        }
    }

    fn slot_mut(&mut self, item: FinancialDataItem) -> Option<&mut f64> {
        match item {
            FinancialDataItem::SharesOutstanding => Some(&mut self.share_count),
            _ => None,
        }
    }

    fn collected(&self) -> &BTreeSet<FinancialDataItem> {
        &self.collected
    }

    fn collected_mut(&mut self) -> &mut BTreeSet<FinancialDataItem> {
        &mut self.collected
    }
}

/// Statement of operations data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OpsData {
    #[serde(rename = "Revenue")]
    revenue: f64,
    #[serde(rename = "Cost Of Revenue")]
    cost_of_revenue: f64,
    #[serde(rename = "Gross Margin")]
    gross_margin: f64,
    #[serde(rename = "Operational Income")]
    operating_income: f64,
    #[serde(rename = "Operational Expense")]
    operating_expense: f64,
    #[serde(rename = "Net Income")]
    net_income: f64,
    #[serde(rename = "Weighted Average Share Count", alias = "Weighted Average Shares")]
    weighted_average_shares: f64,
    #[serde(rename = "Dividend Per Share")]
    dividend_per_share: f64,
    #[serde(
        rename = "Collected Data",
        default,
        deserialize_with = "collected::<OpsData, _>"
    )]
    collected: BTreeSet<FinancialDataItem>,
}

impl SubReport for OpsData {
    const KIND: SubReportKind = SubReportKind::Operations;
    const ITEMS: &'static [FinancialDataItem] = &[
        FinancialDataItem::Revenue,
        FinancialDataItem::CostOfRevenue,
        FinancialDataItem::GrossMargin,
        FinancialDataItem::OperatingIncome,
        FinancialDataItem::OperatingExpense,
        FinancialDataItem::NetIncome,
        FinancialDataItem::WeightedAverageShares,
        FinancialDataItem::DividendPerShare,
    ];

    fn slot(&self, item: FinancialDataItem) -> Option<f64> {
        use FinancialDataItem as I;
        match item {
            I::Revenue => Some(self.revenue),
            I::CostOfRevenue => Some(self.cost_of_revenue),
            I::GrossMargin => Some(self.gross_margin),
            I::OperatingIncome => Some(self.operating_income),
            I::OperatingExpense => Some(self.operating_expense),
            I::NetIncome => Some(self.net_income),
            I::WeightedAverageShares => Some(self.weighted_average_shares),
            I::DividendPerShare => Some(self.dividend_per_share),
            _ => None,
        }
    }

    fn slot_mut(&mut self, item: FinancialDataItem) -> Option<&mut f64> {
        use FinancialDataItem as I;
        match item {
            I::Revenue => Some(&mut self.revenue),
            I::CostOfRevenue => Some(&mut self.cost_of_revenue),
            I::GrossMargin => Some(&mut self.gross_margin),
            I::OperatingIncome => Some(&mut self.operating_income),
            I::OperatingExpense => Some(&mut self.operating_expense),
            I::NetIncome => Some(&mut self.net_income),
            I::WeightedAverageShares => Some(&mut self.weighted_average_shares),
            I::DividendPerShare => Some(&mut self.dividend_per_share),
            _ => None,
        }
    }

    fn collected(&self) -> &BTreeSet<FinancialDataItem> {
        &self.collected
    }

    fn collected_mut(&mut self) -> &mut BTreeSet<FinancialDataItem> {
        &mut self.collected
    }
}

/// Balance sheet data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BsData {
    #[serde(rename = "Long-Term debt")]
    long_term_debt: f64,
    #[serde(rename = "Short-Term debt")]
    short_term_debt: f64,
    #[serde(rename = "Current Liabilities")]
    current_liabilities: f64,
    #[serde(rename = "Deferred revenue")]
    deferred_revenue: f64,
    #[serde(rename = "Retained Earnings")]
    retained_earnings: f64,
    #[serde(rename = "Total Shareholder Equity")]
    total_equity: f64,
    #[serde(rename = "Current Assets", default)]
    current_assets: f64,
    #[serde(rename = "Cash", default)]
    cash: f64,
    #[serde(rename = "Goodwill", default)]
    goodwill: f64,
    #[serde(rename = "Intangible Assets", default)]
    intangibles: f64,
    #[serde(rename = "Total Assets", default)]
    total_assets: f64,
    #[serde(rename = "Total Liabilities", default)]
    total_liabilities: f64,
    #[serde(
        rename = "Collected Data",
        default,
        deserialize_with = "collected::<BsData, _>"
    )]
    collected: BTreeSet<FinancialDataItem>,
}

impl SubReport for BsData {
    const KIND: SubReportKind = SubReportKind::BalanceSheet;
    const ITEMS: &'static [FinancialDataItem] = &[
        FinancialDataItem::LongTermDebt,
        FinancialDataItem::ShortTermDebt,
        FinancialDataItem::CurrentLiabilities,
        FinancialDataItem::DeferredRevenue,
        FinancialDataItem::RetainedEarnings,
        FinancialDataItem::TotalEquity,
        FinancialDataItem::CurrentAssets,
        FinancialDataItem::Cash,
        FinancialDataItem::Goodwill,
        FinancialDataItem::Intangibles,
        FinancialDataItem::TotalAssets,
        FinancialDataItem::TotalLiabilities,
    ];

    fn slot(&self, item: FinancialDataItem) -> Option<f64> {
        use FinancialDataItem as I;
        match item {
            I::LongTermDebt => Some(self.long_term_debt),
            I::ShortTermDebt => Some(self.short_term_debt),
            I::CurrentLiabilities => Some(self.current_liabilities),
            I::DeferredRevenue => Some(self.deferred_revenue),
            I::RetainedEarnings => Some(self.retained_earnings),
            I::TotalEquity => Some(self.total_equity),
            I::CurrentAssets => Some(self.current_assets),
            I::Cash => Some(self.cash),
            I::Goodwill => Some(self.goodwill),
            I::Intangibles => Some(self.intangibles),
            I::TotalAssets => Some(self.total_assets),
            I::TotalLiabilities => Some(self.total_liabilities),
            _ => None,
        }
    }

    fn slot_mut(&mut self, item: FinancialDataItem) -> Option<&mut f64> {
        use FinancialDataItem as I;
        match item {
            I::LongTermDebt => Some(&mut self.long_term_debt),
            I::ShortTermDebt => Some(&mut self.short_term_debt),
            I::CurrentLiabilities => Some(&mut self.current_liabilities),
            I::DeferredRevenue => Some(&mut self.deferred_revenue),
            I::RetainedEarnings => Some(&mut self.retained_earnings),
            I::TotalEquity => Some(&mut self.total_equity),
            I::CurrentAssets => Some(&mut self.current_assets),
            I::Cash => Some(&mut self.cash),
            I::Goodwill => Some(&mut self.goodwill),
            I::Intangibles => Some(&mut self.intangibles),
            I::TotalAssets => Some(&mut self.total_assets),
            I::TotalLiabilities => Some(&mut self.total_liabilities),
            _ => None,
        }
    }

    fn collected(&self) -> &BTreeSet<FinancialDataItem> {
        &self.collected
    }

    fn collected_mut(&mut self) -> &mut BTreeSet<FinancialDataItem> {
        &mut self.collected
    }
}

/// Cash flow statement data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CfData {
    #[serde(rename = "Operating Cash Flow")]
    operating_cash_flow: f64,
    #[serde(rename = "Capital Expenditure")]
    capital_expenditure: f64,
    #[serde(rename = "Dividends paid", alias = "Dividends Paid", default)]
    dividends: f64,
    #[serde(rename = "Interest paid", alias = "Interest Paid", default)]
    interest_paid: f64,
    #[serde(
        rename = "Collected Data",
        default,
        deserialize_with = "collected::<CfData, _>"
    )]
    collected: BTreeSet<FinancialDataItem>,
}

impl SubReport for CfData {
    const KIND: SubReportKind = SubReportKind::CashFlow;
    const ITEMS: &'static [FinancialDataItem] = &[
        FinancialDataItem::OperatingCashFlow,
        FinancialDataItem::CapitalExpenditure,
        FinancialDataItem::Dividends,
        FinancialDataItem::InterestPaid,
    ];

    fn slot(&self, item: FinancialDataItem) -> Option<f64> {
        use FinancialDataItem as I;
        match item {
            I::OperatingCashFlow => Some(self.operating_cash_flow),
            I::CapitalExpenditure => Some(self.capital_expenditure),
            I::Dividends => Some(self.dividends),
            I::InterestPaid => Some(self.interest_paid),
            _ => None,
        }
    }

    fn slot_mut(&mut self, item: FinancialDataItem) -> Option<&mut f64> {
        use FinancialDataItem as I;
        match item {
            I::OperatingCashFlow => Some(&mut self.operating_cash_flow),
            I::CapitalExpenditure => Some(&mut self.capital_expenditure),
            I::Dividends => Some(&mut self.dividends),
            I::InterestPaid => Some(&mut self.interest_paid),
            _ => None,
        }
    }

    fn collected(&self) -> &BTreeSet<FinancialDataItem> {
        &self.collected
    }

    fn collected_mut(&mut self) -> &mut BTreeSet<FinancialDataItem> {
        &mut self.collected
    }
}

/// The output of parsing one sub-document: a fresh record of the matching kind.
#[derive(Clone, Debug, PartialEq)]
pub enum StatementData {
    /// Parsed from the cover page.
    Entity(EntityData),
    /// Parsed from an operations, income or EPS-note document.
    Operations(OpsData),
    /// Parsed from a balance sheet, equity-note or debt-note document.
    BalanceSheet(BsData),
    /// Parsed from a cash flow statement.
    CashFlow(CfData),
}

impl StatementData {
    /// An empty record for the given sub-report kind.
    #[must_use]
    pub fn empty(kind: SubReportKind) -> Self {
        match kind {
            SubReportKind::Entity => Self::Entity(EntityData::default()),
            SubReportKind::Operations => Self::Operations(OpsData::default()),
            SubReportKind::BalanceSheet => Self::BalanceSheet(BsData::default()),
            SubReportKind::CashFlow => Self::CashFlow(CfData::default()),
        }
    }

    /// Which sub-report this record feeds.
    #[must_use]
    pub const fn kind(&self) -> SubReportKind {
        match self {
            Self::Entity(_) => SubReportKind::Entity,
            Self::Operations(_) => SubReportKind::Operations,
            Self::BalanceSheet(_) => SubReportKind::BalanceSheet,
            Self::CashFlow(_) => SubReportKind::CashFlow,
        }
    }

    /// Number of items collected in this record.
    #[must_use]
    pub fn collected_count(&self) -> usize {
        match self {
            Self::Entity(d) => d.collected().len(),
            Self::Operations(d) => d.collected().len(),
            Self::BalanceSheet(d) => d.collected().len(),
            Self::CashFlow(d) => d.collected().len(),
        }
    }
}

/// All four sub-reports of one filing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    #[serde(rename = "Filing Type")]
    filing_type: FilingType,
    #[serde(rename = "Entity Information")]
    pub(crate) entity: EntityData,
    #[serde(rename = "Operational Information")]
    pub(crate) ops: OpsData,
    #[serde(rename = "Balance Sheet Information")]
    pub(crate) bs: BsData,
    #[serde(rename = "Cash Flow Information")]
    pub(crate) cf: CfData,
}

impl FinancialReport {
    /// An empty report for a filing type.
    #[must_use]
    pub fn new(filing_type: FilingType) -> Self {
        Self {
            filing_type,
            ..Self::default()
        }
    }

    /// The filing type this report was extracted from.
    #[must_use]
    pub const fn filing_type(&self) -> FilingType {
        self.filing_type
    }

    /// Cover page record.
    #[must_use]
    pub const fn entity(&self) -> &EntityData {
        &self.entity
    }

    /// Operations record.
    #[must_use]
    pub const fn ops(&self) -> &OpsData {
        &self.ops
    }

    /// Balance sheet record.
    #[must_use]
    pub const fn balance_sheet(&self) -> &BsData {
        &self.bs
    }

    /// Cash flow record.
    #[must_use]
    pub const fn cash_flow(&self) -> &CfData {
        &self.cf
    }

    /// The collected value of any item, routed to its sub-report.
    #[must_use]
    pub fn value(&self, item: FinancialDataItem) -> Option<f64> {
        match item.sub_report()? {
            SubReportKind::Entity => self.entity.get(item),
            SubReportKind::Operations => self.ops.get(item),
            SubReportKind::BalanceSheet => self.bs.get(item),
            SubReportKind::CashFlow => self.cf.get(item),
        }
    }

    /// Whether an item has been collected.
    #[must_use]
    pub fn is_collected(&self, item: FinancialDataItem) -> bool {
        self.value(item).is_some()
    }

    /// Stores an item in its sub-report, marking it collected.
    pub fn set(&mut self, item: FinancialDataItem, value: f64) -> Result<()> {
        match item.sub_report() {
            Some(SubReportKind::Entity) => self.entity.set(item, value),
            Some(SubReportKind::Operations) => self.ops.set(item, value),
            Some(SubReportKind::BalanceSheet) => self.bs.set(item, value),
            Some(SubReportKind::CashFlow) => self.cf.set(item, value),
            None => Err(FilingError::FieldNotFound {
                item,
                report: SubReportKind::Entity,
            }),
        }
    }

    /// Merges a parsed record into the matching sub-report; already-collected items win.
    ///
    /// Returns the number of items taken from `data`.
    pub fn merge(&mut self, data: &StatementData) -> usize {
        match data {
            StatementData::Entity(d) => self.entity.merge_from(d),
            StatementData::Operations(d) => self.ops.merge_from(d),
            StatementData::BalanceSheet(d) => self.bs.merge_from(d),
            StatementData::CashFlow(d) => self.cf.merge_from(d),
        }
    }

    /// Required items not yet collected, grouped by sub-report.
    #[must_use]
    pub fn missing_required(&self) -> Vec<(SubReportKind, Vec<FinancialDataItem>)> {
        [
            (SubReportKind::Entity, self.entity.missing_required()),
            (SubReportKind::Operations, self.ops.missing_required()),
            (SubReportKind::BalanceSheet, self.bs.missing_required()),
            (SubReportKind::CashFlow, self.cf.missing_required()),
        ]
        .into_iter()
        .filter(|(_, items)| !items.is_empty())
        .collect()
    }

    /// Whether every required item across all sub-reports is collected.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }
}
