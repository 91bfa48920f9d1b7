//! Crawl run orchestration.

use std::time::Instant;

use crate::error::Result;
use crate::models::Config;
use crate::services::crawler::{CrawlOutcome, ListingCrawler, PageFetcher};
use crate::store::ListingSink;

/// Run one full crawl and log a summary.
pub async fn run_crawl(
    config: &Config,
    fetcher: &dyn PageFetcher,
    sink: &dyn ListingSink,
) -> Result<CrawlOutcome> {
    let crawler = ListingCrawler::new(config.clone())?;

    log::info!("Starting crawl run");
    let started = Instant::now();
    let outcome = crawler.run(fetcher, sink).await;
    let elapsed = started.elapsed();

    log::info!(
        "Crawl finished in {:.1}s: {} pages, {} candidates, {} accepted, \
         {} duplicates, {} invalid, {} skipped, {} stale, {} failed pairs",
        elapsed.as_secs_f64(),
        outcome.pages_fetched,
        outcome.candidates,
        outcome.accepted,
        outcome.duplicates,
        outcome.invalid,
        outcome.skipped,
        outcome.stale,
        outcome.failed_pairs
    );
    Ok(outcome)
}
