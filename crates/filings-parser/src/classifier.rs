//! Classification of a filing's sub-documents from its report index page.
//!
//! The index page lists every report twice: once as a script array of report
//! paths, and once as a navigation menu whose anchors call `loadReport(n)` and
//! carry the report title. Menu sections (`menu_cat*`) group the anchors into
//! cover, financial statements and notes. [`map_reports`] walks that menu with
//! a [`MenuState`] machine and assigns each interesting title a
//! [`DocumentType`].

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, warn};

use filings_core::{DocumentType, FilingError, Result};

use crate::tokenizer::{Token, TokenStream};

static ARRAY_DECL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\s+reports\s*=\s*new\s+Array\s*\(\s*(\d+)\s*\)").expect("valid array regex")
});
static ARRAY_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"reports\s*\[\s*(\d+)\s*\]\s*=\s*["']([^"']*)["']"#).expect("valid item regex")
});
static LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var\s+reports\s*=\s*\[(.*?)\]").expect("valid literal regex")
});
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']*)["']"#).expect("valid quoted regex"));

/// Upper bound on the report slots read from one index page.
const MAX_REPORTS: usize = 10_000;

/// Position in the index page's navigation menu.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MenuState {
    /// Before the first menu section.
    #[default]
    Unclassified,
    /// Cover page section.
    Cover,
    /// Primary financial statements.
    FinancialStatements,
    /// Notes to the financial statements.
    Notes,
    /// Any later section; nothing of interest follows.
    Done,
}

impl MenuState {
    /// The state entered at a menu section header.
    ///
    /// The header text decides; a header without text falls back to the
    /// numeric suffix of its `menu_cat` id.
    #[must_use]
    pub fn from_header(text: &str, id: &str) -> Self {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            return match id.trim_start_matches("menu_cat") {
                "1" => Self::Cover,
                "2" => Self::FinancialStatements,
                "3" => Self::Notes,
                _ => Self::Done,
            };
        }
        if text.contains("cover") {
            Self::Cover
        } else if text.contains("financial") && text.contains("statement") {
            if text.contains("note") {
                Self::Notes
            } else {
                Self::FinancialStatements
            }
        } else {
            Self::Done
        }
    }

    /// Classifies a report title seen in this section.
    #[must_use]
    pub fn classify(&self, title: &str) -> DocumentType {
        let title = title.to_lowercase();
        let has = |word: &str| title.contains(word);
        match self {
            Self::Cover if has("document") && has("entity") => DocumentType::EntityInfo,
            Self::FinancialStatements => {
                if has("parenthetical") {
                    DocumentType::Ignore
                } else if has("balance sheet") || has("financial position") {
                    DocumentType::BalanceSheet
                } else if has("operations") || has("earnings") {
                    DocumentType::Operations
                } else if has("income") {
                    DocumentType::Income
                } else if has("cash flow") {
                    DocumentType::CashFlow
                } else {
                    DocumentType::Ignore
                }
            }
            Self::Notes => {
                if has("earnings") && has("share") {
                    DocumentType::NotesEps
                } else if has("shareholder") && has("equity") {
                    DocumentType::NotesEquity
                } else if has("debt") {
                    DocumentType::NotesDebt
                } else {
                    DocumentType::Ignore
                }
            }
            _ => DocumentType::Ignore,
        }
    }
}

/// Extracts the ordered report paths declared by the index page's script.
///
/// Accepts `var reports = new Array(N); reports[0] = "...";` and the literal
/// `var reports = ["...", ...];`. A trailing `all` entry is dropped and `.xml`
/// entries are rewritten to their `.htm` rendering. The array form is sized by
/// the highest index actually assigned, never by the declared length alone.
pub fn report_list(page: &str) -> Result<Vec<String>> {
    let raw: Vec<String> = if let Some(decl) = ARRAY_DECL_RE.captures(page) {
        let declared = decl[1]
            .parse::<usize>()
            .map_or(MAX_REPORTS, |n| n.min(MAX_REPORTS));
        let mut slots: Vec<String> = Vec::new();
        for item in ARRAY_ITEM_RE.captures_iter(page) {
            let Ok(index) = item[1].parse::<usize>() else {
                continue;
            };
            if index >= declared {
                warn!(index, declared, "Report entry outside declared array");
                continue;
            }
            if index >= slots.len() {
                slots.resize(index + 1, String::new());
            }
            slots[index] = item[2].to_string();
        }
        slots
    } else if let Some(literal) = LITERAL_RE.captures(page) {
        QUOTED_RE
            .captures_iter(&literal[1])
            .map(|c| c[1].to_string())
            .collect()
    } else {
        return Err(FilingError::IndexStructure(
            "no report list declared".to_string(),
        ));
    };

    let mut reports: Vec<String> = raw.into_iter().map(rewrite_report).collect();
    if reports
        .last()
        .is_some_and(|last| last.eq_ignore_ascii_case("all"))
    {
        reports.pop();
    }
    debug!(count = reports.len(), "Parsed report list");
    Ok(reports)
}

fn rewrite_report(path: String) -> String {
    match path.strip_suffix(".xml") {
        Some(stem) => format!("{stem}.htm"),
        None => path,
    }
}

/// Maps document types to report paths by walking the index page's menu.
///
/// `reports` is the list from [`report_list`]; `loadReport(n)` selects entry
/// `n - 1`. The first report seen for a document type wins.
#[must_use]
pub fn map_reports(page: &str, reports: &[String]) -> BTreeMap<DocumentType, String> {
    let mut stream = TokenStream::new(page);
    let mut state = MenuState::Unclassified;
    let mut documents = BTreeMap::new();

    while let Some(token) = stream.next_token() {
        let Token::Start { .. } = &token else {
            continue;
        };

        if let Some(id) = token.attr("id").filter(|id| id.contains("menu_cat")) {
            let header = leading_text(&mut stream);
            state = MenuState::from_header(&header, id);
            debug!(header = %header, ?state, "Entered menu section");
            if state == MenuState::Done {
                break;
            }
            continue;
        }

        let Some(number) = token.attr("href").and_then(report_number) else {
            continue;
        };
        let title = anchor_text(&mut stream);
        let doc_type = state.classify(&title);
        if doc_type == DocumentType::Ignore {
            continue;
        }
        match number.checked_sub(1).and_then(|i| reports.get(i)) {
            Some(path) => {
                documents.entry(doc_type).or_insert_with(|| path.clone());
            }
            None => warn!(number, title = %title, "Report number outside report list"),
        }
    }

    let missing = missing_documents(&documents);
    if !missing.is_empty() {
        warn!(?missing, "Did not find all required filing documents");
    }
    documents
}

/// Required document types absent from a classification.
///
/// `Operations` and `Income` satisfy each other; the result names
/// `Operations` when neither is present.
#[must_use]
pub fn missing_documents(documents: &BTreeMap<DocumentType, String>) -> Vec<DocumentType> {
    DocumentType::REQUIRED
        .iter()
        .copied()
        .filter(|doc| match doc {
            DocumentType::Operations | DocumentType::Income => {
                !documents.contains_key(&DocumentType::Operations)
                    && !documents.contains_key(&DocumentType::Income)
            }
            other => !documents.contains_key(other),
        })
        .collect()
}

/// The report number of a `javascript:loadReport(n);` href.
fn report_number(href: &str) -> Option<usize> {
    let (_, rest) = href.split_once("loadReport")?;
    rest.trim_matches(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ';'))
        .parse()
        .ok()
}

/// Text immediately following a tag, up to the next tag.
fn leading_text(stream: &mut TokenStream) -> String {
    let mut text = String::new();
    while let Some(token) = stream.next_token() {
        match token {
            Token::Text(t) => text.push_str(&t),
            other => {
                stream.push_back(other);
                break;
            }
        }
    }
    text.trim().to_string()
}

/// All text inside the current anchor.
fn anchor_text(stream: &mut TokenStream) -> String {
    let mut parts = Vec::new();
    while let Some(token) = stream.next_token() {
        match token {
            Token::Text(t) => {
                let t = t.trim();
                if !t.is_empty() {
                    parts.push(t.to_string());
                }
            }
            t if t.is_end("a") => break,
            _ => {}
        }
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Cover", "menu_cat1", MenuState::Cover)]
    #[case("Financial Statements", "menu_cat2", MenuState::FinancialStatements)]
    #[case("Notes to Financial Statements", "menu_cat3", MenuState::Notes)]
    #[case("Accounting Policies", "menu_cat4", MenuState::Done)]
    #[case("", "menu_cat2", MenuState::FinancialStatements)]
    #[case("", "menu_cat5", MenuState::Done)]
    fn test_header_transitions(#[case] text: &str, #[case] id: &str, #[case] expected: MenuState) {
        assert_eq!(MenuState::from_header(text, id), expected);
    }

    #[rstest]
    #[case(MenuState::Cover, "Document and Entity Information", DocumentType::EntityInfo)]
    #[case(MenuState::Cover, "Cover Page", DocumentType::Ignore)]
    #[case(MenuState::FinancialStatements, "CONSOLIDATED BALANCE SHEETS", DocumentType::BalanceSheet)]
    #[case(
        MenuState::FinancialStatements,
        "CONSOLIDATED BALANCE SHEETS (Parenthetical)",
        DocumentType::Ignore
    )]
    #[case(
        MenuState::FinancialStatements,
        "Consolidated Statements of Financial Position",
        DocumentType::BalanceSheet
    )]
    #[case(MenuState::FinancialStatements, "CONSOLIDATED STATEMENTS OF OPERATIONS", DocumentType::Operations)]
    #[case(
        MenuState::FinancialStatements,
        "CONSOLIDATED STATEMENTS OF COMPREHENSIVE INCOME",
        DocumentType::Income
    )]
    #[case(MenuState::FinancialStatements, "CONSOLIDATED STATEMENTS OF CASH FLOWS", DocumentType::CashFlow)]
    #[case(MenuState::FinancialStatements, "CONSOLIDATED STATEMENTS OF SHAREHOLDERS' EQUITY", DocumentType::Ignore)]
    #[case(MenuState::Notes, "Earnings Per Share", DocumentType::NotesEps)]
    #[case(MenuState::Notes, "Shareholders' Equity", DocumentType::NotesEquity)]
    #[case(MenuState::Notes, "Debt", DocumentType::NotesDebt)]
    #[case(MenuState::Notes, "Income Taxes", DocumentType::Ignore)]
    #[case(MenuState::Unclassified, "CONSOLIDATED BALANCE SHEETS", DocumentType::Ignore)]
    fn test_classify(#[case] state: MenuState, #[case] title: &str, #[case] expected: DocumentType) {
        assert_eq!(state.classify(title), expected);
    }

    #[test]
    fn test_report_list_array_form() {
        let page = r#"<script type="text/javascript">
            var reports = new Array(4);
            reports[0] = "/Archives/edgar/data/1/2/R1.htm";
            reports[1] = "/Archives/edgar/data/1/2/R2.xml";
            reports[2] = "/Archives/edgar/data/1/2/R3.htm";
            reports[3] = "all";
        </script>"#;
        let reports = report_list(page).unwrap();
        assert_eq!(reports, vec![
            "/Archives/edgar/data/1/2/R1.htm",
            "/Archives/edgar/data/1/2/R2.htm",
            "/Archives/edgar/data/1/2/R3.htm",
        ]);
    }

    #[test]
    fn test_report_list_literal_form() {
        let page = r#"var reports = ["R1.htm", 'R2.htm', "all"];"#;
        assert_eq!(report_list(page).unwrap(), vec!["R1.htm", "R2.htm"]);
    }

    #[rstest]
    #[case("1000000000000000000")]
    #[case("99999999999999999999999999")]
    fn test_report_list_ignores_oversized_declaration(#[case] declared: &str) {
        let page = format!(
            r#"<script>var reports = new Array({declared}); reports[0] = "R1.htm";</script>"#
        );
        assert_eq!(report_list(&page).unwrap(), vec!["R1.htm"]);
    }

    #[test]
    fn test_report_list_sized_by_assigned_entries() {
        let page = r#"var reports = new Array(10);
            reports[0] = "R1.htm";
            reports[2] = "R3.htm";
            reports[12] = "R13.htm";"#;
        assert_eq!(report_list(page).unwrap(), vec!["R1.htm", "", "R3.htm"]);
    }

    #[test]
    fn test_report_list_missing() {
        assert!(matches!(
            report_list("<html></html>"),
            Err(FilingError::IndexStructure(_))
        ));
    }

    #[test]
    fn test_map_reports_first_seen_wins_and_stops_at_done() {
        let page = r#"<ul>
          <li><a id="menu_cat1" href="javascript:void(0);">Cover</a><ul>
            <li><a href="javascript:loadReport(1);">Document and Entity Information</a></li></ul></li>
          <li><a id="menu_cat2" href="javascript:void(0);">Financial Statements</a><ul>
            <li><a href="javascript:loadReport(2);">CONSOLIDATED STATEMENTS OF OPERATIONS</a></li>
            <li><a href="javascript:loadReport(3);">CONSOLIDATED BALANCE SHEETS</a></li>
            <li><a href="javascript:loadReport(4);">CONSOLIDATED BALANCE SHEETS (Parenthetical)</a></li>
            <li><a href="javascript:loadReport(5);">Consolidated Statement of Operations - Segments</a></li></ul></li>
          <li><a id="menu_cat4" href="javascript:void(0);">Accounting Policies</a><ul>
            <li><a href="javascript:loadReport(6);">Debt</a></li></ul></li>
        </ul>"#;
        let reports: Vec<String> = (1..=6).map(|i| format!("R{i}.htm")).collect();
        let docs = map_reports(page, &reports);
        assert_eq!(docs.get(&DocumentType::EntityInfo).unwrap(), "R1.htm");
        assert_eq!(docs.get(&DocumentType::Operations).unwrap(), "R2.htm");
        assert_eq!(docs.get(&DocumentType::BalanceSheet).unwrap(), "R3.htm");
        assert!(!docs.contains_key(&DocumentType::NotesDebt));
        assert_eq!(missing_documents(&docs), vec![DocumentType::CashFlow]);
    }

    #[test]
    fn test_income_satisfies_operations() {
        let mut docs = BTreeMap::new();
        docs.insert(DocumentType::Income, "R4.htm".to_string());
        docs.insert(DocumentType::BalanceSheet, "R2.htm".to_string());
        docs.insert(DocumentType::CashFlow, "R6.htm".to_string());
        docs.insert(DocumentType::EntityInfo, "R1.htm".to_string());
        assert!(missing_documents(&docs).is_empty());

        docs.remove(&DocumentType::Income);
        assert_eq!(missing_documents(&docs), vec![DocumentType::Operations]);
    }
}
