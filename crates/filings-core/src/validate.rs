//! Post-parse validation and generation of derivable items.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::{FilingError, Result};
use crate::item::FinancialDataItem;
use crate::report::FinancialReport;
use crate::types::SubReportKind;

/// Largest tolerated ratio between the cover page share count and the
/// weighted average share count before the latter is considered mis-scaled.
const SHARE_RATIO_TOLERANCE: f64 = 2.0;

/// Required items that were neither parsed nor derivable, grouped by sub-report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFields {
    reports: Vec<(SubReportKind, Vec<FinancialDataItem>)>,
}

impl MissingFields {
    /// Builds a description from per-sub-report lists, dropping empty ones.
    #[must_use]
    pub fn new(reports: Vec<(SubReportKind, Vec<FinancialDataItem>)>) -> Self {
        Self {
            reports: reports
                .into_iter()
                .filter(|(_, items)| !items.is_empty())
                .collect(),
        }
    }

    /// True when nothing is missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Missing items per sub-report.
    #[must_use]
    pub fn reports(&self) -> &[(SubReportKind, Vec<FinancialDataItem>)] {
        &self.reports
    }

    /// All missing items, in report order.
    pub fn items(&self) -> impl Iterator<Item = FinancialDataItem> + '_ {
        self.reports.iter().flat_map(|(_, items)| items.iter().copied())
    }

    /// Whether a specific item is missing.
    #[must_use]
    pub fn contains(&self, item: FinancialDataItem) -> bool {
        self.items().any(|missing| missing == item)
    }
}

impl fmt::Display for MissingFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (kind, items)) in self.reports.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{kind}: [")?;
            for (j, item) in items.iter().enumerate() {
                if j > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(item.label())?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl FinancialReport {
    /// Corrects the weighted average share count when it disagrees with the
    /// cover page share count by more than a factor of two.
    ///
    /// Statements that omit a share scale in their heading get the default
    /// scale, which is frequently off by a thousand. Returns true if the
    /// weighted average was overwritten.
    pub fn check_share_scale(&mut self) -> bool {
        let outstanding = self.value(FinancialDataItem::SharesOutstanding);
        let weighted = self.value(FinancialDataItem::WeightedAverageShares);
        let (Some(outstanding), Some(weighted)) = (outstanding, weighted) else {
            return false;
        };
        if outstanding <= 0.0 {
            return false;
        }
        let ratio = weighted / outstanding;
        if (1.0 / SHARE_RATIO_TOLERANCE..=SHARE_RATIO_TOLERANCE).contains(&ratio) {
            return false;
        }
        debug!(
            outstanding,
            weighted, "Weighted average shares out of scale, using shares outstanding"
        );
        self.set(FinancialDataItem::WeightedAverageShares, outstanding)
            .is_ok()
    }

    /// Derives what can be derived and reports what is still missing.
    ///
    /// Runs the share scale check first, then for every required item that is
    /// not collected either computes it from its derivation rule or records it
    /// as missing. Returns [`FilingError::MissingRequiredFields`] naming every
    /// missing item, grouped by sub-report.
    pub fn validate(&mut self) -> Result<()> {
        self.check_share_scale();

        let mut missing: Vec<(SubReportKind, Vec<FinancialDataItem>)> = Vec::new();
        for kind in SubReportKind::ALL {
            let mut absent = Vec::new();
            for item in FinancialDataItem::ALL {
                if item.sub_report() != Some(kind)
                    || !item.is_required()
                    || self.is_collected(item)
                {
                    continue;
                }
                let derived = item
                    .derivation()
                    .and_then(|rule| rule.compute(|input| self.value(input)));
                match derived {
                    Some(value) => {
                        debug!(item = %item, value, "Derived missing item");
                        self.set(item, value)?;
                    }
                    None => absent.push(item),
                }
            }
            missing.push((kind, absent));
        }

        let missing = MissingFields::new(missing);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FilingError::MissingRequiredFields(missing))
        }
    }

    /// The missing-field description without deriving anything.
    #[must_use]
    pub fn missing_fields(&self) -> MissingFields {
        MissingFields::new(self.missing_required())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilingType;
    use FinancialDataItem as I;

    fn complete_report() -> FinancialReport {
        let mut report = FinancialReport::new(FilingType::Annual);
        for (item, value) in [
            (I::SharesOutstanding, 5_000.0),
            (I::Revenue, 53_265.0),
            (I::CostOfRevenue, 32_844.0),
            (I::OperatingIncome, 12_612.0),
            (I::NetIncome, 11_519.0),
            (I::WeightedAverageShares, 5_100.0),
            (I::OperatingCashFlow, 9_000.0),
            (I::CapitalExpenditure, -1_200.0),
            (I::Dividends, -2_550.0),
            (I::CurrentLiabilities, 88_548.0),
            (I::RetainedEarnings, 79_436.0),
            (I::TotalEquity, 120_000.0),
        ] {
            report.set(item, value).unwrap();
        }
        report
    }

    #[test]
    fn test_validate_derives_margin_expense_and_dividend() {
        let mut report = complete_report();
        report.validate().unwrap();
        assert_eq!(report.value(I::GrossMargin), Some(20_421.0));
        assert_eq!(report.value(I::OperatingExpense), Some(7_809.0));
        assert_eq!(report.value(I::DividendPerShare), Some(0.5));
        assert!(report.is_complete());
    }

    #[test]
    fn test_gross_margin_only_missing() {
        let mut report = complete_report();
        report.set(I::OperatingExpense, 7_809.0).unwrap();
        report.set(I::DividendPerShare, 0.5).unwrap();
        let missing: Vec<_> = report.missing_fields().items().collect();
        assert_eq!(missing, vec![I::GrossMargin]);
        assert!(report.validate().is_ok());
        assert_eq!(report.value(I::GrossMargin), Some(20_421.0));
    }

    #[test]
    fn test_missing_non_derivable_is_named() {
        let mut report = complete_report();
        report.ops = Default::default();
        report.set(I::Revenue, 53_265.0).unwrap();
        report.set(I::CostOfRevenue, 32_844.0).unwrap();
        report.set(I::OperatingIncome, 12_612.0).unwrap();
        report.set(I::WeightedAverageShares, 5_100.0).unwrap();

        let err = report.validate().unwrap_err();
        let FilingError::MissingRequiredFields(missing) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(missing.items().collect::<Vec<_>>(), vec![I::NetIncome]);
        assert_eq!(missing.reports()[0].0, SubReportKind::Operations);
        assert_eq!(
            missing.to_string(),
            "Operational Information: [Net Income]"
        );
    }

    #[test]
    fn test_share_scale_overwrites_weighted_average() {
        let mut report = complete_report();
        report.set(I::WeightedAverageShares, 5_100_000.0).unwrap();
        assert!(report.check_share_scale());
        assert_eq!(report.value(I::WeightedAverageShares), Some(5_000.0));

        let mut report = complete_report();
        assert!(!report.check_share_scale());
        assert_eq!(report.value(I::WeightedAverageShares), Some(5_100.0));
    }

    #[test]
    fn test_empty_report_lists_every_sub_report() {
        let mut report = FinancialReport::new(FilingType::Quarterly);
        let Err(FilingError::MissingRequiredFields(missing)) = report.validate() else {
            panic!("empty report validated");
        };
        let kinds: Vec<_> = missing.reports().iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, SubReportKind::ALL.to_vec());
        assert!(missing.contains(I::SharesOutstanding));
        assert!(missing.contains(I::GrossMargin));
    }
}
