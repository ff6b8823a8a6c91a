//! Statement parsing: from a sub-document page to a populated sub-report.

use tracing::{debug, trace};

use filings_core::{
    BsData, CfData, DocumentType, EntityData, FilingError, FinancialDataItem, OpsData, Result,
    ScaleMap, StatementData, SubReport, SubReportKind,
};

use crate::normalize::{filing_scale, normalize_number};
use crate::table::{next_heading, next_row};
use crate::tags::{is_concept_tag, resolve, resolve_label};
use crate::tokenizer::TokenStream;

/// Stores one raw cell into `report` as `item`.
///
/// Fails with [`FilingError::FieldNotFound`] if `report` has no field for
/// `item`, and with [`FilingError::Normalization`] if the cell is not a
/// number. An item that is already collected is left untouched: the first
/// value column of a statement is the most recent period.
pub fn map_field<R: SubReport>(
    report: &mut R,
    item: FinancialDataItem,
    raw: &str,
    scales: &ScaleMap,
) -> Result<()> {
    if !R::declares(item) {
        return Err(FilingError::FieldNotFound {
            item,
            report: R::KIND,
        });
    }
    if report.is_collected(item) {
        return Ok(());
    }
    let value = normalize_number(raw)?;
    report.set(item, scales.apply(item, value))
}

/// Parses a sub-document into a fresh record of the sub-report it feeds.
///
/// The first table row is the heading and sets the scales. Every later row
/// whose first cell resolves to a known item is mapped from the first value
/// cell that normalizes.
pub fn parse_statement(page: &str, doc_type: DocumentType) -> Result<StatementData> {
    let kind = doc_type.sub_report().ok_or_else(|| {
        FilingError::InvalidParameter(format!("{doc_type} documents carry no data"))
    })?;
    let data = match kind {
        SubReportKind::Entity => StatementData::Entity(parse_into::<EntityData>(page, doc_type)),
        SubReportKind::Operations => {
            StatementData::Operations(parse_into::<OpsData>(page, doc_type))
        }
        SubReportKind::BalanceSheet => {
            StatementData::BalanceSheet(parse_into::<BsData>(page, doc_type))
        }
        SubReportKind::CashFlow => StatementData::CashFlow(parse_into::<CfData>(page, doc_type)),
    };
    debug!(
        document = %doc_type,
        collected = data.collected_count(),
        "Parsed statement"
    );
    Ok(data)
}

fn parse_into<R: SubReport>(page: &str, doc_type: DocumentType) -> R {
    let mut stream = TokenStream::new(page);
    let headings = next_heading(&mut stream).unwrap_or_default();
    let scales = filing_scale(&headings, doc_type);
    trace!(?headings, ?scales, "Statement heading");

    let mut report = R::default();
    while let Some(row) = next_row(&mut stream, true) {
        let Some((label, cells)) = row.split_first() else {
            continue;
        };
        let item = if is_concept_tag(label) {
            resolve(label)
        } else {
            resolve_label(label, doc_type)
        };
        if item == FinancialDataItem::Unknown {
            continue;
        }
        for cell in cells {
            match map_field(&mut report, item, cell, &scales) {
                Ok(()) => break,
                Err(FilingError::Normalization(_)) => continue,
                Err(err) => {
                    trace!(label = %label, error = %err, "Skipping row");
                    break;
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::ScaleFactor;

    #[test]
    fn test_map_field_scales_and_marks() {
        let mut ops = OpsData::default();
        let scales = ScaleMap::defaults_for(DocumentType::Operations);
        map_field(&mut ops, FinancialDataItem::Revenue, "53,265", &scales).unwrap();
        assert_eq!(ops.get(FinancialDataItem::Revenue), Some(53_265e6));
    }

    #[test]
    fn test_map_field_first_observation_wins() {
        let mut ops = OpsData::default();
        let scales = ScaleMap::defaults_for(DocumentType::Operations);
        map_field(&mut ops, FinancialDataItem::NetIncome, "11,519", &scales).unwrap();
        map_field(&mut ops, FinancialDataItem::NetIncome, "8,235", &scales).unwrap();
        assert_eq!(ops.get(FinancialDataItem::NetIncome), Some(11_519e6));
    }

    #[test]
    fn test_map_field_errors() {
        let mut cf = CfData::default();
        let mut scales = ScaleMap::defaults_for(DocumentType::CashFlow);
        scales.money = ScaleFactor::Thousand;
        assert!(matches!(
            map_field(&mut cf, FinancialDataItem::Revenue, "1", &scales),
            Err(FilingError::FieldNotFound { .. })
        ));
        assert!(matches!(
            map_field(&mut cf, FinancialDataItem::OperatingCashFlow, "n/a", &scales),
            Err(FilingError::Normalization(_))
        ));
        assert!(!cf.is_collected(FinancialDataItem::OperatingCashFlow));
        map_field(&mut cf, FinancialDataItem::OperatingCashFlow, "(12)", &scales).unwrap();
        assert_eq!(cf.get(FinancialDataItem::OperatingCashFlow), Some(-12_000.0));
    }

    #[test]
    fn test_ignore_documents_are_rejected() {
        assert!(parse_statement("<table></table>", DocumentType::Ignore).is_err());
    }

    #[test]
    fn test_skips_blank_cells_and_foreign_items() {
        let page = r#"<table>
          <tr><th>Consolidated Statements of Cash Flows (USD $)<br>In Millions</th><th>12 Months Ended</th></tr>
          <tr><th></th><th>Sep. 29, 2012</th></tr>
          <tr><td><a onclick="top.Show.showAR( this, 'defref_us-gaap_NetCashProvidedByUsedInOperatingActivities', window );">Cash generated by operating activities</a></td><td class="nump">&#xA0;</td><td class="text">&#x2014;</td><td class="nump">50,856</td><td class="nump">37,529</td></tr>
          <tr><td><a onclick="top.Show.showAR( this, 'defref_us-gaap_NetIncomeLoss', window );">Net income</a></td><td class="nump">41,733</td></tr>
          <tr><td><a onclick="top.Show.showAR( this, 'defref_us-gaap_PaymentsToAcquirePropertyPlantAndEquipment', window );">Payments for acquisition of property, plant and equipment</a></td><td class="num">(8,295)</td></tr>
        </table>"#;
        let StatementData::CashFlow(cf) = parse_statement(page, DocumentType::CashFlow).unwrap()
        else {
            panic!("expected cash flow data");
        };
        assert_eq!(cf.get(FinancialDataItem::OperatingCashFlow), Some(50_856e6));
        assert_eq!(cf.get(FinancialDataItem::CapitalExpenditure), Some(-8_295e6));
        assert_eq!(cf.collected().len(), 2);
    }
}
