//! EDGAR company query and CIK lookup pages.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use filings_core::{FilingError, FilingType, Result, Ticker};

use crate::table::next_row;
use crate::tokenizer::{Token, TokenStream};

/// Number of filings requested per company query page.
pub const QUERY_COUNT: usize = 100;

/// Path of the company query page listing filings of one type.
#[must_use]
pub fn filing_query_path(cik: &str, filing_type: FilingType) -> String {
    format!(
        "/cgi-bin/browse-edgar?action=getcompany&CIK={cik}&type={}&dateb=&owner=exclude&count={QUERY_COUNT}",
        filing_type.form()
    )
}

/// Path of the XML company page carrying a ticker's CIK.
#[must_use]
pub fn cik_query_path(ticker: &Ticker) -> String {
    format!("/cgi-bin/browse-edgar?action=getcompany&output=xml&CIK={ticker}")
}

/// Reads the filing table of a company query page.
///
/// Keeps rows with exactly five cells whose first cell is the filing type's
/// form label (amendments such as `10-K/A` do not match), dated in
/// `min_year` or later. Returns reporting date to interactive-data link.
#[must_use]
pub fn parse_filing_index(
    page: &str,
    filing_type: FilingType,
    min_year: i32,
) -> BTreeMap<NaiveDate, String> {
    let mut stream = TokenStream::new(page);
    let mut links = BTreeMap::new();
    while let Some(row) = next_row(&mut stream, true) {
        let [form, link, _, date, _] = row.as_slice() else {
            continue;
        };
        if form != filing_type.form() {
            continue;
        }
        let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            debug!(date = %date, "Skipping filing with unreadable date");
            continue;
        };
        if date.year() >= min_year {
            links.insert(date, link.clone());
        }
    }
    debug!(filing_type = %filing_type, count = links.len(), "Parsed filing index");
    links
}

/// Reads the CIK from the XML company page.
pub fn parse_cik_page(page: &str) -> Result<String> {
    let mut stream = TokenStream::new(page);
    while let Some(token) = stream.next_token() {
        if !token.is_start("cik") {
            continue;
        }
        while let Some(inner) = stream.next_token() {
            if inner.is_end("cik") {
                break;
            }
            if let Token::Text(text) = inner {
                let text = text.trim();
                if !text.is_empty() {
                    return Ok(text.to_string());
                }
            }
        }
    }
    Err(FilingError::CikNotFound("no CIK element on company page".to_string()))
}
