use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::error::{FetchError, ScrapeError};
use crate::fetch::{PageFetcher, PageRequest, Waits};
use crate::normalize::SalaryFilter;
use crate::parser::detail::{self, CONTAINER_SELECTOR};
use crate::parser::listing::{extract_listings, SCRIPT_SELECTOR};
use crate::parser::pagination::plan_pages;
use crate::record::JobRecord;
use crate::site::{Query, Site};

/// Close button of the email-alert popover shown over detail pages.
pub const POPOVER_CLOSE_SELECTOR: &str = "button.popover-x-button-close.icl-CloseButton";

pub struct SearchOptions<'a> {
    pub site: Site,
    pub waits: Waits,
    pub salary_filter: &'a dyn SalaryFilter,
    /// Keep going when a detail page fails; the record keeps empty descriptions.
    pub skip_failed_details: bool,
}

impl SearchOptions<'_> {
    fn results_request<'u>(&self, url: &'u str) -> PageRequest<'u> {
        PageRequest {
            url,
            ready: SCRIPT_SELECTOR,
            dismiss: None,
            waits: self.waits,
        }
    }

    fn detail_request<'u>(&self, url: &'u str) -> PageRequest<'u> {
        PageRequest {
            url,
            ready: CONTAINER_SELECTOR,
            dismiss: Some(POPOVER_CLOSE_SELECTOR),
            waits: self.waits,
        }
    }
}

/// Records gathered by a run, plus the query that stopped it, if any.
pub struct RunOutput {
    pub records: Vec<JobRecord>,
    pub completed: usize,
    pub failure: Option<(Query, ScrapeError)>,
}

impl RunOutput {
    /// A clean run is always persisted, even with no rows, so the dataset
    /// exists afterwards. A failed run is persisted only if it kept rows.
    pub fn should_persist(&self) -> bool {
        self.failure.is_none() || !self.records.is_empty()
    }
}

/// Run every query in order. The first failing query ends the run; batches of
/// the queries before it are kept.
pub async fn run_queries<F, O>(queries: &[Query], mut open: O, options: &SearchOptions<'_>) -> RunOutput
where
    F: PageFetcher,
    O: FnMut() -> Result<F, FetchError>,
{
    let mut records = Vec::new();
    let mut completed = 0;

    for query in queries {
        info!("Searching {}", query);
        match search_query(&mut open, query, options).await {
            Ok(batch) => {
                info!("{}: {} records", query, batch.len());
                records.extend(batch);
                completed += 1;
            }
            Err(e) => {
                warn!("Stopping at {}: {}", query, e);
                return RunOutput {
                    records,
                    completed,
                    failure: Some((query.clone(), e)),
                };
            }
        }
    }

    RunOutput {
        records,
        completed,
        failure: None,
    }
}

/// Traverse one query with its own fetcher, releasing it whatever the outcome.
pub async fn search_query<F, O>(
    open: &mut O,
    query: &Query,
    options: &SearchOptions<'_>,
) -> Result<Vec<JobRecord>, ScrapeError>
where
    F: PageFetcher,
    O: FnMut() -> Result<F, FetchError>,
{
    let fetcher = open()?;
    let result = traverse(&fetcher, query, options).await;
    if let Err(e) = fetcher.close() {
        warn!("{}: {}", query, e);
    }
    result
}

async fn traverse<F: PageFetcher>(
    fetcher: &F,
    query: &Query,
    options: &SearchOptions<'_>,
) -> Result<Vec<JobRecord>, ScrapeError> {
    let seed = options.site.search_url(query, 0);
    let html = fetcher.fetch(&options.results_request(&seed)).await?;
    let first_page = listings(&html, &seed, options)?;
    let page_urls = plan_pages(&html, &options.site, query);
    info!(
        "{}: {} listings on the first page, {} more pages",
        query,
        first_page.len(),
        page_urls.len()
    );

    let mut batch = Vec::new();
    for url in &page_urls {
        let html = fetcher.fetch(&options.results_request(url)).await?;
        batch.extend(listings(&html, url, options)?);
    }
    // Later pages precede the first page in the batch.
    batch.extend(first_page);

    describe(fetcher, &mut batch, options).await?;
    Ok(batch)
}

fn listings(html: &str, url: &str, options: &SearchOptions<'_>) -> Result<Vec<JobRecord>, ScrapeError> {
    match extract_listings(html, &options.site, options.salary_filter) {
        Ok(listings) => {
            let defaulted: usize = listings.iter().map(|l| l.missing.len()).sum();
            debug!(url, listings = listings.len(), defaulted, "Extracted results page");
            Ok(listings.into_iter().map(|l| l.record).collect())
        }
        Err(e) => {
            warn!(url, "Structural parse failure: {}", e);
            Err(ScrapeError::parse(url, e))
        }
    }
}

/// Visit the detail page of every record that has one.
async fn describe<F: PageFetcher>(
    fetcher: &F,
    records: &mut [JobRecord],
    options: &SearchOptions<'_>,
) -> Result<(), ScrapeError> {
    let targets = records.iter().filter(|r| r.job_url.is_some()).count();
    let pb = ProgressBar::new(targets as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} details (eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    for record in records.iter_mut() {
        let Some(url) = record.job_url.clone() else {
            continue;
        };
        let outcome = match fetcher.fetch(&options.detail_request(&url)).await {
            Ok(html) => detail::enrich(record, &html).map_err(|e| ScrapeError::parse(&url, e)),
            Err(e) => Err(e.into()),
        };
        if let Err(e) = outcome {
            if !options.skip_failed_details {
                pb.finish_and_clear();
                return Err(e);
            }
            warn!("Skipping description: {}", e);
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(())
}
