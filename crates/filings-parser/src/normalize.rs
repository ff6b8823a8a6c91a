//! Number and scale normalization for statement cells.

use filings_core::{DocumentType, FilingError, Result, ScaleEntity, ScaleFactor, ScaleMap};

/// Converts a statement cell such as `$ (1,234.5)` to a signed number.
///
/// Enclosing parentheses mean negative. Surrounding whitespace, currency
/// symbols and the parentheses are stripped, and thousands separators are
/// removed from the integer part.
pub fn normalize_number(cell: &str) -> Result<f64> {
    let negative = cell.contains('(') && cell.contains(')');
    let stripped = cell
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '$' | '(' | ')'))
        .replace(char::is_whitespace, "");

    let (integer, fraction) = match stripped.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (stripped.as_str(), None),
    };
    let mut digits = integer.replace(',', "");
    if let Some(fraction) = fraction {
        digits.push('.');
        digits.push_str(fraction);
    }

    if !digits.bytes().any(|b| b.is_ascii_digit()) {
        return Err(FilingError::Normalization(cell.to_string()));
    }
    let value: f64 = digits
        .parse()
        .map_err(|_| FilingError::Normalization(cell.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// Derives the scale map of a document from its heading fragments.
///
/// Starts from [`ScaleMap::defaults_for`], then scans each comma-separated
/// part of each fragment: a part mentioning shares sets the share scale, a
/// part mentioning `$`/`usd` sets the money scale. When the heading declares a
/// currency anywhere, unattributed parts such as "In Thousands" set the money
/// scale too. Later matches override earlier ones.
#[must_use]
pub fn filing_scale(headings: &[String], doc_type: DocumentType) -> ScaleMap {
    let mut scales = ScaleMap::defaults_for(doc_type);
    let lowered: Vec<String> = headings.iter().map(|h| h.to_lowercase()).collect();
    let currency_heading = lowered.iter().any(|h| mentions_currency(h));

    for heading in &lowered {
        for part in heading.split(',') {
            let Some(factor) = scale_word(part) else {
                continue;
            };
            if part.contains("share") {
                if factor != ScaleFactor::Billion {
                    scales.set(ScaleEntity::Shares, factor);
                }
            } else if mentions_currency(part) || currency_heading {
                scales.set(ScaleEntity::Money, factor);
            }
        }
    }
    scales
}

fn mentions_currency(text: &str) -> bool {
    text.contains('$') || text.contains("usd")
}

fn scale_word(part: &str) -> Option<ScaleFactor> {
    if part.contains("thousand") {
        Some(ScaleFactor::Thousand)
    } else if part.contains("million") {
        Some(ScaleFactor::Million)
    } else if part.contains("billion") {
        Some(ScaleFactor::Billion)
    } else {
        None
    }
}
