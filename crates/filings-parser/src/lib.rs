#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Page parsing for EDGAR filings.
//!
//! Everything here works on page text; fetching lives in `filings-edgar`.

/// Menu walking and document classification.
pub mod classifier;
/// Company query and CIK lookup pages.
pub mod index;
/// Number and scale normalization.
pub mod normalize;
/// Statement pages into sub-report records.
pub mod statement;
/// Table row and heading readers.
pub mod table;
/// Concept tag and label resolution.
pub mod tags;
/// Lenient HTML tokenizer.
pub mod tokenizer;

pub use classifier::{MenuState, map_reports, missing_documents, report_list};
pub use index::{cik_query_path, filing_query_path, parse_cik_page, parse_filing_index};
pub use normalize::{filing_scale, normalize_number};
pub use statement::{map_field, parse_statement};
pub use table::{next_heading, next_row};
pub use tags::{resolve, resolve_label};
pub use tokenizer::{Token, TokenStream};
