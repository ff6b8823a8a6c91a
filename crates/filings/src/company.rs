//! A company's filing folder: filing links, parsed filings, and the
//! fetch-classify-parse pipeline that fills them.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use filings_core::{
    DocumentType, Filing, FilingCache, FilingError, FilingSource, FilingType, FinancialDataItem,
    FinancialReport, PageSource, Result, StatementData, Ticker,
};
use filings_parser::{
    filing_query_path, map_reports, parse_filing_index, parse_statement, report_list,
};

/// Number of dates fetched at once by [`Company::filings`].
const DEFAULT_CONCURRENCY: usize = 4;

/// Everything guarded by the company lock.
#[derive(Debug, Default)]
struct Folder {
    links: HashMap<FilingType, BTreeMap<NaiveDate, String>>,
    reports: BTreeMap<FilingType, BTreeMap<NaiveDate, Arc<Filing>>>,
}

/// Saved form of a company folder.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CompanyArchive {
    #[serde(rename = "Company")]
    pub(crate) company: Ticker,
    #[serde(rename = "Financial Reports", default)]
    pub(crate) reports: BTreeMap<FilingType, BTreeMap<NaiveDate, Filing>>,
}

/// The filings of one company.
///
/// Created by [`FilingFetcher::company_folder`](crate::FilingFetcher::company_folder).
/// Each filing is parsed at most once and kept for the lifetime of the
/// folder; a single lock guards both the link table and the parsed filings.
pub struct Company {
    ticker: Ticker,
    cik: String,
    min_year: i32,
    pages: Arc<dyn PageSource>,
    cache: Option<Arc<dyn FilingCache>>,
    folder: Mutex<Folder>,
}

impl std::fmt::Debug for Company {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Company")
            .field("ticker", &self.ticker)
            .field("cik", &self.cik)
            .field("min_year", &self.min_year)
            .field("pages", &self.pages.name())
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .finish_non_exhaustive()
    }
}

impl Company {
    pub(crate) fn new(
        ticker: Ticker,
        cik: String,
        min_year: i32,
        pages: Arc<dyn PageSource>,
        cache: Option<Arc<dyn FilingCache>>,
    ) -> Self {
        Self {
            ticker,
            cik,
            min_year,
            pages,
            cache,
            folder: Mutex::new(Folder::default()),
        }
    }

    /// Seeds the folder with previously parsed filings.
    pub(crate) async fn restore(
        &self,
        reports: BTreeMap<FilingType, BTreeMap<NaiveDate, Filing>>,
    ) {
        let mut folder = self.folder.lock().await;
        for (filing_type, filings) in reports {
            let entry = folder.reports.entry(filing_type).or_default();
            for (date, filing) in filings {
                entry.insert(date, Arc::new(filing));
            }
        }
    }

    /// The company's ticker.
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// The company's EDGAR CIK.
    pub fn cik(&self) -> &str {
        &self.cik
    }

    /// Reads the company's filing list for one type and records the link of
    /// every filing dated in the minimum year or later.
    ///
    /// Returns how many filings are now known for that type.
    #[instrument(skip(self), fields(ticker = %self.ticker))]
    pub async fn load_filing_links(&self, filing_type: FilingType) -> Result<usize> {
        let page = self
            .pages
            .fetch_page(&filing_query_path(&self.cik, filing_type))
            .await?;
        let links = parse_filing_index(&page, filing_type, self.min_year);

        let mut folder = self.folder.lock().await;
        let known = folder.links.entry(filing_type).or_default();
        known.extend(links);
        debug!(count = known.len(), "Loaded filing links");
        Ok(known.len())
    }

    /// Whether links for a filing type have been loaded.
    pub async fn has_links(&self, filing_type: FilingType) -> bool {
        self.folder.lock().await.links.contains_key(&filing_type)
    }

    /// Reporting dates with a known link, newest first.
    pub async fn available_filings(&self, filing_type: FilingType) -> Vec<NaiveDate> {
        self.folder
            .lock()
            .await
            .links
            .get(&filing_type)
            .map(|links| links.keys().rev().copied().collect())
            .unwrap_or_default()
    }

    /// Filings parsed or restored so far, oldest first.
    pub async fn parsed_filings(&self, filing_type: FilingType) -> Vec<Arc<Filing>> {
        self.folder
            .lock()
            .await
            .reports
            .get(&filing_type)
            .map(|reports| reports.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the filing of a type reported on `date`, parsing it on first request.
    ///
    /// The folder is consulted first, then the persistent cache, and only then
    /// is the filing fetched. Sub-documents are fetched and parsed
    /// concurrently; one that fails is logged and skipped. A filing that is
    /// missing required items is still kept, and is returned inside
    /// [`FilingError::Incomplete`].
    ///
    /// # Errors
    ///
    /// - [`FilingError::LinkResolution`] if no filing is known for `date`
    /// - [`FilingError::Fetch`] if the report index cannot be retrieved
    /// - [`FilingError::IndexStructure`] if the report index is unrecognized
    /// - [`FilingError::Incomplete`] if required items are missing
    #[instrument(skip(self), fields(ticker = %self.ticker))]
    pub async fn filing(&self, filing_type: FilingType, date: NaiveDate) -> Result<Arc<Filing>> {
        if let Some(filing) = self.parsed(filing_type, date).await {
            debug!("Filing already parsed");
            return settle(filing);
        }

        if let Some(filing) = self.cached(filing_type, date).await {
            return settle(self.store(filing).await);
        }

        let link = self.link(filing_type, date).await?;
        let report = self.extract(filing_type, &link).await?;
        let filing = self
            .store(Arc::new(Filing::new(self.ticker.clone(), date, report)))
            .await;
        self.persist(&filing).await;

        let result = settle(filing);
        if let Err(e) = &result {
            warn!(error = %e, "Filing is incomplete");
        }
        result
    }

    /// Fetches several filings of one type concurrently.
    ///
    /// Every requested date yields exactly one entry in the batch, either a
    /// filing or the error that prevented it.
    #[instrument(skip(self, dates), fields(ticker = %self.ticker, count = dates.len()))]
    pub async fn filings(&self, filing_type: FilingType, dates: &[NaiveDate]) -> FilingBatch {
        let results: Vec<(NaiveDate, Result<Arc<Filing>>)> = stream::iter(dates.iter().copied())
            .map(move |date| async move { (date, self.filing(filing_type, date).await) })
            .buffer_unordered(DEFAULT_CONCURRENCY)
            .collect()
            .await;

        let mut batch = FilingBatch::default();
        for (date, result) in results {
            match result {
                Ok(filing) => batch.filings.push((date, filing)),
                Err(e) => batch.errors.push((date, e)),
            }
        }
        batch.filings.sort_by_key(|(date, _)| *date);
        batch.errors.sort_by_key(|(date, _)| *date);
        debug!(
            parsed = batch.filings.len(),
            failed = batch.errors.len(),
            "Fetched filing batch"
        );
        batch
    }

    /// Serializes the folder's parsed filings.
    ///
    /// The result can be handed to
    /// [`FilingFetcher::restore_folder`](crate::FilingFetcher::restore_folder)
    /// to rebuild the folder without fetching.
    pub async fn to_json(&self) -> Result<String> {
        let archive = CompanyArchive {
            company: self.ticker.clone(),
            reports: self
                .folder
                .lock()
                .await
                .reports
                .iter()
                .map(|(filing_type, filings)| {
                    let filings = filings
                        .iter()
                        .map(|(date, filing)| (*date, Filing::clone(filing)))
                        .collect();
                    (*filing_type, filings)
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&archive)?)
    }

    /// Time series of the parsed filings of one type.
    ///
    /// One row per filing, oldest first: a `date` column followed by one
    /// `f64` column per canonical item, null where the item was not collected.
    pub async fn to_frame(&self, filing_type: FilingType) -> Result<DataFrame> {
        let filings = self.parsed_filings(filing_type).await;

        let dates: Vec<String> = filings.iter().map(|f| f.date().to_string()).collect();
        let mut columns = vec![Column::new("date".into(), dates)];
        for item in FinancialDataItem::ALL {
            let values: Vec<Option<f64>> = filings.iter().map(|f| f.value(item)).collect();
            columns.push(Column::new(item.column().into(), values));
        }

        DataFrame::new(columns)
            .map_err(|e| FilingError::Serialization(e.to_string()))?
            .lazy()
            .with_column(col("date").cast(DataType::Date))
            .collect()
            .map_err(|e| FilingError::Serialization(e.to_string()))
    }

    async fn parsed(&self, filing_type: FilingType, date: NaiveDate) -> Option<Arc<Filing>> {
        self.folder
            .lock()
            .await
            .reports
            .get(&filing_type)
            .and_then(|reports| reports.get(&date))
            .cloned()
    }

    /// Keeps a filing unless a concurrent request stored one first; returns the kept one.
    async fn store(&self, filing: Arc<Filing>) -> Arc<Filing> {
        let mut folder = self.folder.lock().await;
        Arc::clone(
            folder
                .reports
                .entry(filing.filing_type())
                .or_default()
                .entry(filing.date())
                .or_insert(filing),
        )
    }

    async fn cached(&self, filing_type: FilingType, date: NaiveDate) -> Option<Arc<Filing>> {
        let cache = self.cache.as_ref()?;
        match cache.get_filing(&self.ticker, filing_type, date).await {
            Ok(Some(filing)) => {
                debug!("Cache hit for filing");
                Some(Arc::new(filing))
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read filing cache");
                None
            }
        }
    }

    async fn persist(&self, filing: &Filing) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put_filing(filing).await {
                warn!(error = %e, "Failed to cache filing");
            }
        }
    }

    async fn link(&self, filing_type: FilingType, date: NaiveDate) -> Result<String> {
        self.folder
            .lock()
            .await
            .links
            .get(&filing_type)
            .and_then(|links| links.get(&date))
            .cloned()
            .ok_or_else(|| {
                FilingError::LinkResolution(format!(
                    "no {filing_type} filing of {} dated {date}",
                    self.ticker
                ))
            })
    }

    /// Fetches the report index behind `link` and builds a validated report.
    async fn extract(&self, filing_type: FilingType, link: &str) -> Result<FinancialReport> {
        let index = self.pages.fetch_page(link).await?;
        let reports = report_list(&index)?;
        let documents = map_reports(&index, &reports);
        if documents.is_empty() {
            return Err(FilingError::IndexStructure(format!(
                "no statements classified in {link}"
            )));
        }

        let mut report = FinancialReport::new(filing_type);
        for (doc_type, data) in self.parse_documents(documents).await {
            let merged = report.merge(&data);
            debug!(document = %doc_type, merged, "Merged statement");
        }

        match report.validate() {
            Ok(()) | Err(FilingError::MissingRequiredFields(_)) => Ok(report),
            Err(e) => Err(e),
        }
    }

    /// Fetches and parses every classified document on its own task.
    ///
    /// Each task fills a fresh sub-report; results come back in merge order.
    async fn parse_documents(
        &self,
        documents: BTreeMap<DocumentType, String>,
    ) -> Vec<(DocumentType, StatementData)> {
        let (doc_types, handles): (Vec<_>, Vec<_>) = documents
            .into_iter()
            .filter(|(doc_type, _)| doc_type.sub_report().is_some())
            .map(|(doc_type, path)| {
                let pages = Arc::clone(&self.pages);
                let handle = tokio::spawn(async move {
                    let page = pages.fetch_page(&path).await?;
                    parse_statement(&page, doc_type)
                });
                (doc_type, handle)
            })
            .unzip();

        let mut parsed = Vec::with_capacity(handles.len());
        for (doc_type, result) in doc_types.into_iter().zip(join_all(handles).await) {
            match result {
                Ok(Ok(data)) => parsed.push((doc_type, data)),
                Ok(Err(e)) => warn!(document = %doc_type, error = %e, "Skipping sub-document"),
                Err(e) => warn!(document = %doc_type, error = %e, "Sub-document task failed"),
            }
        }
        parsed.sort_by_key(|(doc_type, _)| (doc_type.merge_priority(), *doc_type));
        parsed
    }
}

/// Pairs a filing with the description of what it lacks.
fn settle(filing: Arc<Filing>) -> Result<Arc<Filing>> {
    let missing = filing.report().missing_fields();
    if missing.is_empty() {
        Ok(filing)
    } else {
        Err(FilingError::Incomplete { filing, missing })
    }
}

/// Outcome of [`Company::filings`]: one entry per requested date.
#[derive(Debug, Default)]
pub struct FilingBatch {
    filings: Vec<(NaiveDate, Arc<Filing>)>,
    errors: Vec<(NaiveDate, FilingError)>,
}

impl FilingBatch {
    /// Complete filings, oldest first.
    pub fn filings(&self) -> &[(NaiveDate, Arc<Filing>)] {
        &self.filings
    }

    /// Per-date failures, oldest first.
    pub fn errors(&self) -> &[(NaiveDate, FilingError)] {
        &self.errors
    }

    /// Number of dates in the batch.
    pub fn len(&self) -> usize {
        self.filings.len() + self.errors.len()
    }

    /// True when no dates were requested.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when every date produced a complete filing.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The complete filings and, if any date failed, a [`FilingError::Batch`].
    pub fn into_parts(self) -> (Vec<Arc<Filing>>, Option<FilingError>) {
        let filings = self.filings.into_iter().map(|(_, f)| f).collect();
        let error = (!self.errors.is_empty()).then(|| FilingError::Batch(self.errors));
        (filings, error)
    }

    /// The complete filings, or a [`FilingError::Batch`] if any date failed.
    pub fn into_result(self) -> Result<Vec<Arc<Filing>>> {
        match self.into_parts() {
            (filings, None) => Ok(filings),
            (_, Some(error)) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filings_core::FinancialDataItem as I;
    use filings_edgar::ReplaySource;

    const CIK: &str = "0000320193";

    const QUERY_PAGE: &str = r#"<table class="tableFile2">
<tr><th>Filings</th><th>Format</th><th>Description</th><th>Filing Date</th><th>File/Film Number</th></tr>
<tr><td>10-K</td><td><a href="/cgi-bin/viewer?action=view&amp;cik=320193&amp;accession_number=0000320193-17-000070&amp;xbrl_type=v" id="interactiveDataBtn">Interactive Data</a></td><td>Annual report</td><td>2017-11-03</td><td>171174673</td></tr>
<tr><td>10-K</td><td><a href="/cgi-bin/viewer?action=view&amp;cik=320193&amp;accession_number=0001628280-16-020309&amp;xbrl_type=v" id="interactiveDataBtn">Interactive Data</a></td><td>Annual report</td><td>2016-10-26</td><td>161953070</td></tr>
</table>"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn company(source: ReplaySource) -> Company {
        Company::new(Ticker::new("AAPL"), CIK.to_string(), 2011, Arc::new(source), None)
    }

    fn annual_filing(day: NaiveDate, revenue: f64) -> Filing {
        let mut report = FinancialReport::new(FilingType::Annual);
        report.set(I::Revenue, revenue).unwrap();
        Filing::new(Ticker::new("AAPL"), day, report)
    }

    #[tokio::test]
    async fn test_links_newest_first() {
        let source = ReplaySource::new()
            .with_page(filing_query_path(CIK, FilingType::Annual), QUERY_PAGE);
        let company = company(source);
        assert!(!company.has_links(FilingType::Annual).await);

        assert_eq!(company.load_filing_links(FilingType::Annual).await.unwrap(), 2);
        assert!(company.has_links(FilingType::Annual).await);
        assert_eq!(
            company.available_filings(FilingType::Annual).await,
            vec![date(2017, 11, 3), date(2016, 10, 26)]
        );
        assert!(company.available_filings(FilingType::Quarterly).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_date_is_link_error() {
        let company = company(ReplaySource::new());
        let result = company.filing(FilingType::Annual, date(2017, 11, 3)).await;
        assert!(matches!(result, Err(FilingError::LinkResolution(_))));
    }

    #[tokio::test]
    async fn test_unrecognized_index_page() {
        let link = "/cgi-bin/viewer?action=view&cik=320193&accession_number=0000320193-17-000070&xbrl_type=v";
        let source = ReplaySource::new()
            .with_page(filing_query_path(CIK, FilingType::Annual), QUERY_PAGE)
            .with_page(link, "<html><body>Service unavailable</body></html>");
        let company = company(source);
        company.load_filing_links(FilingType::Annual).await.unwrap();

        let result = company.filing(FilingType::Annual, date(2017, 11, 3)).await;
        assert!(matches!(result, Err(FilingError::IndexStructure(_))));
        assert!(company.parsed_filings(FilingType::Annual).await.is_empty());
    }

    #[tokio::test]
    async fn test_restored_filing_is_served_without_fetching() {
        let source = Arc::new(ReplaySource::new());
        let company = Company::new(
            Ticker::new("AAPL"),
            CIK.to_string(),
            2011,
            source.clone(),
            None,
        );
        let day = date(2017, 11, 3);
        company
            .restore(BTreeMap::from([(
                FilingType::Annual,
                BTreeMap::from([(day, annual_filing(day, 229_234e6))]),
            )]))
            .await;

        let Err(FilingError::Incomplete { filing, missing }) =
            company.filing(FilingType::Annual, day).await
        else {
            panic!("a report with only revenue is incomplete");
        };
        assert_eq!(filing.revenue(), Some(229_234e6));
        assert!(missing.contains(I::NetIncome));
        assert_eq!(source.request_count(), 0);
    }

    #[tokio::test]
    async fn test_to_frame_columns() {
        let company = company(ReplaySource::new());
        let (first, second) = (date(2016, 10, 26), date(2017, 11, 3));
        company
            .restore(BTreeMap::from([(
                FilingType::Annual,
                BTreeMap::from([
                    (second, annual_filing(second, 229_234e6)),
                    (first, annual_filing(first, 215_639e6)),
                ]),
            )]))
            .await;

        let df = company.to_frame(FilingType::Annual).await.unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 1 + I::ALL.len());
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let revenue = df.column("revenue").unwrap().f64().unwrap();
        assert_eq!(revenue.get(0), Some(215_639e6));
        assert_eq!(revenue.get(1), Some(229_234e6));
        assert_eq!(df.column("net_income").unwrap().null_count(), 2);

        let quarterly = company.to_frame(FilingType::Quarterly).await.unwrap();
        assert_eq!(quarterly.height(), 0);
    }

    #[test]
    fn test_batch_parts() {
        let day = date(2017, 11, 3);
        let mut batch = FilingBatch::default();
        assert!(batch.is_empty());
        batch
            .filings
            .push((day, Arc::new(annual_filing(day, 1.0))));
        batch.errors.push((
            date(2016, 10, 26),
            FilingError::LinkResolution("gone".to_string()),
        ));
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_ok());

        let (filings, error) = batch.into_parts();
        assert_eq!(filings.len(), 1);
        assert!(matches!(error, Some(FilingError::Batch(ref failures)) if failures.len() == 1));
    }
}
