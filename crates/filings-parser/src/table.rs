//! Row-at-a-time reader for EDGAR tables.
//!
//! A row is the list of non-empty cell strings between a `<tr>` and its `</tr>`.
//! Each `<td>` contributes at most one string:
//!
//! - cells whose class is `num` or `nump` yield their literal text, even when
//!   the number sits inside an anchor;
//! - with link following enabled, an anchor whose `onclick` embeds a quoted
//!   `defref` concept token yields that token, and the `interactiveDataBtn`
//!   anchor yields its `href`;
//! - otherwise the first non-blank text in the cell is used.

use tracing::trace;

use crate::tokenizer::{Token, TokenStream};

const INTERACTIVE_DATA_BUTTON: &str = "interactiveDataBtn";

/// Reads the next table row, or `None` when no `<tr>` remains.
///
/// `follow_links` enables concept-tag and interactive-data link extraction
/// from anchors in non-numeric cells.
pub fn next_row(stream: &mut TokenStream, follow_links: bool) -> Option<Vec<String>> {
    seek_row(stream)?;

    let mut cells = Vec::new();
    while let Some(token) = stream.next_token() {
        if token.is_end("tr") {
            break;
        }
        if token.is_start("tr") || token.is_end("table") {
            stream.push_back(token);
            break;
        }
        if token.is_start("td") {
            let follow = follow_links && !is_numeric_cell(&token);
            if let Some(cell) = read_cell(stream, follow) {
                cells.push(cell);
            }
        }
    }
    trace!(cells = cells.len(), "Read table row");
    Some(cells)
}

/// Reads the next row's `<th>` text fragments, or `None` when no `<tr>` remains.
///
/// Every non-blank text run inside a heading cell is returned separately, so a
/// heading broken with `<br>` yields one entry per line.
pub fn next_heading(stream: &mut TokenStream) -> Option<Vec<String>> {
    seek_row(stream)?;

    let mut fragments = Vec::new();
    let mut in_heading = false;
    while let Some(token) = stream.next_token() {
        if token.is_end("tr") {
            break;
        }
        if token.is_start("tr") {
            stream.push_back(token);
            break;
        }
        if token.is_start("th") {
            in_heading = true;
        } else if token.is_end("th") {
            in_heading = false;
        } else if let Token::Text(text) = &token {
            let text = text.trim();
            if in_heading && !text.is_empty() {
                fragments.push(text.to_string());
            }
        }
    }
    Some(fragments)
}

/// Extracts the quoted concept token from a `showAR` onclick handler.
///
/// `top.Show.showAR( this, 'defref_us-gaap_Assets', window );` yields
/// `defref_us-gaap_Assets`.
#[must_use]
pub fn concept_tag(onclick: &str) -> Option<&str> {
    if !onclick.contains("showAR") {
        return None;
    }
    let parts: Vec<&str> = onclick.split('\'').collect();
    match parts.as_slice() {
        [_, tag, _] if tag.contains("defref") => Some(*tag),
        _ => None,
    }
}

fn seek_row(stream: &mut TokenStream) -> Option<()> {
    loop {
        if stream.next_token()?.is_start("tr") {
            return Some(());
        }
    }
}

fn is_numeric_cell(td: &Token) -> bool {
    td.attr("class")
        .is_some_and(|class| class.split_whitespace().any(|c| c == "num" || c == "nump"))
}

/// Reads one cell after its `<td>`; leaves the stream after the cell's `</td>`.
fn read_cell(stream: &mut TokenStream, follow_links: bool) -> Option<String> {
    let mut value = None;
    while let Some(token) = stream.next_token() {
        if token.is_end("td") {
            break;
        }
        if token.is_start("td") || token.is_start("tr") || token.is_end("tr") {
            stream.push_back(token);
            break;
        }
        if value.is_some() {
            continue;
        }
        match &token {
            Token::Start { name, .. } if follow_links && name == "a" => {
                value = read_link(stream, &token);
            }
            Token::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    value = Some(text.to_string());
                }
            }
            _ => {}
        }
    }
    value
}

/// Interprets an anchor; consumes it through `</a>` unless it carries a concept tag.
fn read_link(stream: &mut TokenStream, anchor: &Token) -> Option<String> {
    if let Some(tag) = anchor.attr("onclick").and_then(concept_tag) {
        return Some(tag.to_string());
    }
    while let Some(token) = stream.next_token() {
        if token.is_end("a") {
            break;
        }
        if token.is_end("td") || token.is_end("tr") {
            stream.push_back(token);
            break;
        }
    }
    if anchor.attr("id") == Some(INTERACTIVE_DATA_BUTTON) {
        anchor.attr("href").map(str::to_string)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUERY_ROW: &str = r#"<tr><td nowrap="nowrap">10-Q</td><td nowrap="nowrap"><a href="/Archives/edgar/data/320193/000032019318000100/0000320193-18-000100-index.htm" id="documentsbutton">&nbsp;Documents</a>&nbsp; <a href="/cgi-bin/viewer?action=view&amp;cik=320193&amp;accession_number=0000320193-18-000100&amp;xbrl_type=v" id="interactiveDataBtn">&nbsp;Interactive Data</a></td><td class="small" >Quarterly report [Sections 13 or 15(d)]<br />Acc-no: 0000320193-18-000100&nbsp;(34 Act)&nbsp; Size: 9 MB            </td><td>2018-08-01</td><td nowrap="nowrap"><a href="/cgi-bin/browse-edgar?action=getcompany&amp;filenum=001-36743&amp;owner=exclude&amp;count=10">001-36743</a><br>18985212         </td></tr><tr class="blueRow">"#;

    const XBRL_ROW: &str = r#"<tr class="reu"><td class="pl " style="border-bottom: 0px;" valign="top"><a class="a" href="javascript:void(0);" onclick="top.Show.showAR( this, 'defref_us-gaap_StockholdersEquity', window );">Total shareholders&#8217; equity</a></td><td class="nump">134,047<span></span>
</td><td class="nump">128,249<span></span></td></tr>"#;

    const NUM_IN_LINK_ROW: &str = r#"<tr class="re">
        <td class="pl " style="border-bottom: 0px;" valign="top"><a class="a" href="javascript:void(0);" onclick="top.Show.showAR( this, 'defref_dei_EntityCommonStockSharesOutstanding', window );">Entity Common Stock, Shares Outstanding</a></td>
        <td class="text">&#xA0;<span></span></td>
        <td class="nump"><a title="dei_EntityCommonStockSharesOutstanding" onclick="toggleNextSibling(this);">266,252,295</a><span style="display:none;white-space:normal;text-align:left;">dei_EntityCommonStockSharesOutstanding</span><span></span></td>
        <td class="text">&#xA0;<span></span></td>
      </tr>
"#;

    #[test]
    fn test_query_row_follows_interactive_link() {
        let mut stream = TokenStream::new(QUERY_ROW);
        let row = next_row(&mut stream, true).unwrap();
        assert_eq!(row.len(), 5);
        assert_eq!(row[0], "10-Q");
        assert_eq!(
            row[1],
            "/cgi-bin/viewer?action=view&cik=320193&accession_number=0000320193-18-000100&xbrl_type=v"
        );
        assert_eq!(row[3], "2018-08-01");
    }

    #[test]
    fn test_concept_row() {
        let mut stream = TokenStream::new(XBRL_ROW);
        let row = next_row(&mut stream, true).unwrap();
        assert_eq!(row, vec![
            "defref_us-gaap_StockholdersEquity",
            "134,047",
            "128,249"
        ]);
        assert_eq!(next_row(&mut stream, true), None);
    }

    #[test]
    fn test_number_inside_link_is_literal() {
        let mut stream = TokenStream::new(NUM_IN_LINK_ROW);
        let row = next_row(&mut stream, true).unwrap();
        assert_eq!(row, vec![
            "defref_dei_EntityCommonStockSharesOutstanding",
            "266,252,295"
        ]);
    }

    #[test]
    fn test_without_link_following_labels_are_text() {
        let mut stream = TokenStream::new(XBRL_ROW);
        let row = next_row(&mut stream, false).unwrap();
        assert_eq!(row[0], "Total shareholders\u{2019} equity");
    }

    #[test]
    fn test_heading_fragments() {
        let html = r#"<table><tr><th class="tl" colspan="1" rowspan="2"><div style="width: 200px;"><strong>Consolidated Statements of Operations (USD $)<br/>In Millions, except Per Share data</strong></div></th><th class="th" colspan="3">12 Months Ended</th></tr><tr><th>Sep. 29, 2012</th></tr></table>"#;
        let mut stream = TokenStream::new(html);
        let heading = next_heading(&mut stream).unwrap();
        assert_eq!(heading, vec![
            "Consolidated Statements of Operations (USD $)",
            "In Millions, except Per Share data",
            "12 Months Ended"
        ]);
        assert_eq!(next_heading(&mut stream).unwrap(), vec!["Sep. 29, 2012"]);
    }

    #[test]
    fn test_concept_tag_requires_defref() {
        assert_eq!(
            concept_tag("top.Show.showAR( this, 'defref_us-gaap_Assets', window );"),
            Some("defref_us-gaap_Assets")
        );
        assert_eq!(concept_tag("top.Show.showAR( this, 'foo', window );"), None);
        assert_eq!(concept_tag("toggleNextSibling(this);"), None);
    }
}
