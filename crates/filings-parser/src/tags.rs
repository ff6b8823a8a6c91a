//! Concept tag and label resolution to canonical line items.
//!
//! Statement rows name their line item with an XBRL concept reference such as
//! `defref_us-gaap_Revenues`. Filers also emit the bare concept (`Revenues`)
//! or namespace it under their own prefix (`defref_msft_Revenues`); all three
//! resolve to the same [`FinancialDataItem`].

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use filings_core::{DocumentType, FinancialDataItem};

use FinancialDataItem as I;

/// Known concepts as `(namespace, concept, item)`.
const CONCEPTS: &[(&str, &str, FinancialDataItem)] = &[
    // Balance sheet
    ("us-gaap", "StockholdersEquity", I::TotalEquity),
    ("us-gaap", "RetainedEarningsAccumulatedDeficit", I::RetainedEarnings),
    (
        "us-gaap",
        "RetainedEarningsAccumulatedDeficitAndAccumulatedOtherComprehensiveIncomeLossNetOfTax",
        I::RetainedEarnings,
    ),
    ("us-gaap", "LiabilitiesCurrent", I::CurrentLiabilities),
    ("us-gaap", "AssetsCurrent", I::CurrentAssets),
    ("us-gaap", "Assets", I::TotalAssets),
    ("us-gaap", "Liabilities", I::TotalLiabilities),
    ("us-gaap", "CashAndCashEquivalentsAtCarryingValue", I::Cash),
    ("us-gaap", "Goodwill", I::Goodwill),
    ("us-gaap", "IntangibleAssetsNetExcludingGoodwill", I::Intangibles),
    ("us-gaap", "LongTermDebtNoncurrent", I::LongTermDebt),
    ("us-gaap", "LongTermDebtAndCapitalLeaseObligations", I::LongTermDebt),
    ("us-gaap", "ShortTermBorrowings", I::ShortTermDebt),
    ("us-gaap", "DebtCurrent", I::ShortTermDebt),
    ("us-gaap", "LongTermDebtAndCapitalLeaseObligationsCurrent", I::ShortTermDebt),
    ("us-gaap", "LongTermDebtCurrent", I::ShortTermDebt),
    ("us-gaap", "DeferredRevenueCurrent", I::DeferredRevenue),
    ("us-gaap", "ContractWithCustomerLiabilityCurrent", I::DeferredRevenue),
    // Operations
    ("us-gaap", "SalesRevenueNet", I::Revenue),
    ("us-gaap", "Revenues", I::Revenue),
    ("us-gaap", "RevenueFromContractWithCustomerExcludingAssessedTax", I::Revenue),
    ("us-gaap", "CostOfRevenue", I::CostOfRevenue),
    ("us-gaap", "CostOfGoodsAndServicesSold", I::CostOfRevenue),
    ("us-gaap", "CostOfPurchasedOilAndGas", I::CostOfRevenue),
    ("us-gaap", "CostOfGoodsSold", I::CostOfRevenue),
    (
        "us-gaap",
        "CostOfGoodsSoldExcludingAmortizationOfAcquiredIntangibleAssets",
        I::CostOfRevenue,
    ),
    ("us-gaap", "GrossProfit", I::GrossMargin),
    ("us-gaap", "OperatingExpenses", I::OperatingExpense),
    ("us-gaap", "CostsAndExpenses", I::OperatingExpense),
    ("us-gaap", "OtherCostAndExpenseOperating", I::OperatingExpense),
    ("us-gaap", "OperatingIncomeLoss", I::OperatingIncome),
    (
        "us-gaap",
        "IncomeLossIncludingPortionAttributableToNoncontrollingInterest",
        I::OperatingIncome,
    ),
    (
        "us-gaap",
        "IncomeLossFromContinuingOperationsIncludingPortionAttributableToNoncontrollingInterest",
        I::OperatingIncome,
    ),
    (
        "us-gaap",
        "IncomeLossFromContinuingOperationsBeforeIncomeTaxesMinorityInterestAndIncomeLossFromEquityMethodInvestments",
        I::OperatingIncome,
    ),
    (
        "us-gaap",
        "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
        I::OperatingIncome,
    ),
    ("us-gaap", "NetIncomeLoss", I::NetIncome),
    ("us-gaap", "ProfitLoss", I::NetIncome),
    ("us-gaap", "NetIncomeLossAvailableToCommonStockholdersBasic", I::NetIncome),
    (
        "us-gaap",
        "WeightedAverageNumberOfDilutedSharesOutstanding",
        I::WeightedAverageShares,
    ),
    ("us-gaap", "CommonStockDividendsPerShareDeclared", I::DividendPerShare),
    // Cash flow
    ("us-gaap", "NetCashProvidedByUsedInOperatingActivities", I::OperatingCashFlow),
    (
        "us-gaap",
        "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
        I::OperatingCashFlow,
    ),
    ("us-gaap", "PaymentsToAcquirePropertyPlantAndEquipment", I::CapitalExpenditure),
    ("us-gaap", "PaymentsToAcquireProductiveAssets", I::CapitalExpenditure),
    ("us-gaap", "CapitalExpendituresAndInvestments", I::CapitalExpenditure),
    ("us-gaap", "PaymentsOfDividends", I::Dividends),
    ("us-gaap", "PaymentsOfDividendsCommonStock", I::Dividends),
    ("us-gaap", "InterestPaidNet", I::InterestPaid),
    ("us-gaap", "InterestPaid", I::InterestPaid),
    ("us-gaap", "InterestAndDebtExpense", I::InterestPaid),
    ("us-gaap", "InterestIncomeExpenseNet", I::InterestPaid),
    // Cover page
    ("dei", "EntityCommonStockSharesOutstanding", I::SharesOutstanding),
];

static TAGS: LazyLock<HashMap<String, FinancialDataItem>> = LazyLock::new(|| {
    let mut tags = HashMap::with_capacity(CONCEPTS.len() * 2);
    for (namespace, concept, item) in CONCEPTS {
        tags.insert(format!("defref_{namespace}_{concept}"), *item);
        tags.insert((*concept).to_string(), *item);
    }
    tags
});

/// Label patterns per document kind, tried in order; the first match wins.
const LABEL_PATTERNS: &[(DocumentType, &str, FinancialDataItem)] = &[
    (DocumentType::Operations, r"net.*revenue", I::Revenue),
    (DocumentType::Operations, r"net.*sales", I::Revenue),
    (DocumentType::Operations, r"total.*revenue", I::Revenue),
    (DocumentType::Operations, r"total.*sales", I::Revenue),
    (DocumentType::Operations, r"cost.*sales", I::CostOfRevenue),
    (DocumentType::Operations, r"cost.*revenue", I::CostOfRevenue),
    (DocumentType::Operations, r"gross.*margin", I::GrossMargin),
    (DocumentType::Operations, r"operating.*expenses", I::OperatingExpense),
    (DocumentType::Operations, r"operating.*income", I::OperatingIncome),
    (DocumentType::Operations, r"operating.*loss", I::OperatingIncome),
    (DocumentType::Operations, r"net.*income", I::NetIncome),
    (DocumentType::CashFlow, r"operating.*activities", I::OperatingCashFlow),
    (DocumentType::CashFlow, r"plant.*equipment", I::CapitalExpenditure),
    (DocumentType::CashFlow, r"capital.*expense", I::CapitalExpenditure),
    (DocumentType::BalanceSheet, r"current portion.*long-term debt", I::ShortTermDebt),
    (DocumentType::BalanceSheet, r"long-term debt", I::LongTermDebt),
    (DocumentType::BalanceSheet, r"total.*current.*liabilities", I::CurrentLiabilities),
    (DocumentType::BalanceSheet, r"deferred.*revenue", I::DeferredRevenue),
    (DocumentType::BalanceSheet, r"retained.*earnings", I::RetainedEarnings),
    (DocumentType::EntityInfo, r"shares outstanding", I::SharesOutstanding),
];

static LABELS: LazyLock<Vec<(DocumentType, Regex, FinancialDataItem)>> = LazyLock::new(|| {
    LABEL_PATTERNS
        .iter()
        .map(|(doc, pattern, item)| {
            let regex = Regex::new(&format!("(?s){pattern}")).expect("valid label pattern");
            (*doc, regex, *item)
        })
        .collect()
});

/// Resolves a concept tag to a canonical item.
///
/// Tries the tag as given, then the concept part of a three-segment
/// `prefix_filer_Concept` tag. Returns [`FinancialDataItem::Unknown`] when
/// neither is known.
#[must_use]
pub fn resolve(tag: &str) -> FinancialDataItem {
    if let Some(item) = TAGS.get(tag) {
        return *item;
    }
    let segments: Vec<&str> = tag.split('_').collect();
    match segments.as_slice() {
        [_, _, concept] => TAGS
            .get(*concept)
            .copied()
            .unwrap_or(FinancialDataItem::Unknown),
        _ => FinancialDataItem::Unknown,
    }
}

/// Resolves a free-text row label using the patterns of the document's kind.
///
/// Income statements share the operations patterns; notes have none.
#[must_use]
pub fn resolve_label(label: &str, doc_type: DocumentType) -> FinancialDataItem {
    let doc_type = match doc_type {
        DocumentType::Income => DocumentType::Operations,
        other => other,
    };
    let label = label.to_lowercase();
    LABELS
        .iter()
        .find(|(doc, regex, _)| *doc == doc_type && regex.is_match(&label))
        .map_or(FinancialDataItem::Unknown, |(_, _, item)| *item)
}

/// Whether a row's first cell is a concept reference rather than a label.
#[must_use]
pub fn is_concept_tag(cell: &str) -> bool {
    cell.starts_with("defref_")
}
