//! Crawl engine.
//!
//! Each (category, city) pair is an independent pagination run walking page
//! 1 upward until the end-of-results signal or the page ceiling. Runs are
//! driven concurrently up to the configured limit; a failed run never takes
//! the others down with it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use futures::stream::{self, StreamExt};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Category, City, Config};
use crate::normalize::RawListing;
use crate::services::extract::PageSelectors;
use crate::store::{InsertOutcome, ListingSink};
use crate::utils::http;

/// Fetches one listing index page. Seam between pagination and transport.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, category: Category, city: City, page: u32) -> Result<String>;
}

/// HTTP-backed page fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: Config,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http::create_client(&config.crawler)?,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, category: Category, city: City, page: u32) -> Result<String> {
        let url = self.config.crawler.page_url(category, city, page);
        http::fetch_text(&self.client, &url).await
    }
}

/// Counters for one crawl run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Pages fetched across all pairs
    pub pages_fetched: usize,
    /// Candidate elements seen
    pub candidates: usize,
    /// Records accepted by the sink
    pub accepted: usize,
    /// Re-crawled records the sink already had
    pub duplicates: usize,
    /// Records the sink rejected as invalid
    pub invalid: usize,
    /// Candidates dropped during extraction or normalization
    pub skipped: usize,
    /// Candidates rejected by the freshness gate
    pub stale: usize,
    /// Pairs whose pagination run aborted
    pub failed_pairs: usize,
}

impl CrawlOutcome {
    fn absorb(&mut self, other: &CrawlOutcome) {
        self.pages_fetched += other.pages_fetched;
        self.candidates += other.candidates;
        self.accepted += other.accepted;
        self.duplicates += other.duplicates;
        self.invalid += other.invalid;
        self.skipped += other.skipped;
        self.stale += other.stale;
        self.failed_pairs += other.failed_pairs;
    }
}

/// Walks every (category, city) pair and feeds the sink.
pub struct ListingCrawler {
    config: Config,
    selectors: PageSelectors,
}

impl ListingCrawler {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            selectors: PageSelectors::new()?,
            config,
        })
    }

    fn site_offset(&self) -> FixedOffset {
        self.config
            .crawler
            .site_offset()
            .unwrap_or_else(|| Utc.fix())
    }

    /// Run the full crawl: every category crossed with every city.
    pub async fn run(&self, fetcher: &dyn PageFetcher, sink: &dyn ListingSink) -> CrawlOutcome {
        let offset = self.site_offset();
        let pairs: Vec<(Category, City)> = Category::ALL
            .iter()
            .flat_map(|&category| City::ALL.iter().map(move |&city| (category, city)))
            .collect();

        let concurrency = self.config.crawler.max_concurrent.max(1);
        let mut outcome = CrawlOutcome::default();
        let mut runs = stream::iter(pairs)
            .map(|(category, city)| async move {
                (
                    category,
                    city,
                    self.crawl_pair(fetcher, sink, category, city, offset).await,
                )
            })
            .buffer_unordered(concurrency);

        while let Some((category, city, result)) = runs.next().await {
            match result {
                Ok(pair_outcome) => outcome.absorb(&pair_outcome),
                Err(e) => {
                    outcome.failed_pairs += 1;
                    log::warn!("Pagination run {category}/{} aborted: {e}", city.slug());
                }
            }
        }
        outcome
    }

    /// One pagination run: page 1 upward until the end-of-results signal or
    /// the page ceiling.
    pub async fn crawl_pair(
        &self,
        fetcher: &dyn PageFetcher,
        sink: &dyn ListingSink,
        category: Category,
        city: City,
        offset: FixedOffset,
    ) -> Result<CrawlOutcome> {
        let base = Url::parse(&self.config.crawler.page_url(category, city, 1))?;
        let cutoff = Utc::now().with_timezone(&offset).date_naive();
        let delay = Duration::from_millis(self.config.crawler.request_delay_ms);
        let mut outcome = CrawlOutcome::default();

        for page in 1..=self.config.crawler.max_pages {
            let html = self.fetch_with_retry(fetcher, category, city, page).await?;
            outcome.pages_fetched += 1;

            let extract = self.selectors.extract_page(&html, &base, cutoff);
            outcome.candidates += extract.candidates;
            outcome.skipped += extract.skipped;
            outcome.stale += extract.stale;

            if extract.end_of_results {
                log::debug!("End of results for {category}/{} at page {page}", city.slug());
                break;
            }

            for raw in extract.listings {
                self.submit(sink, raw, category, offset, &mut outcome).await;
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        log::info!(
            "Crawled {category}/{}: {} pages, {} accepted, {} duplicates",
            city.slug(),
            outcome.pages_fetched,
            outcome.accepted,
            outcome.duplicates
        );
        Ok(outcome)
    }

    /// Normalize one candidate and push it through the sink.
    async fn submit(
        &self,
        sink: &dyn ListingSink,
        raw: RawListing,
        category: Category,
        offset: FixedOffset,
        outcome: &mut CrawlOutcome,
    ) {
        let now_site: DateTime<FixedOffset> = Utc::now().with_timezone(&offset);
        let listing = match raw.normalize(category, now_site) {
            Ok(listing) => listing,
            Err(e) => {
                outcome.skipped += 1;
                log::warn!("Dropping candidate {}: {e}", raw.url);
                return;
            }
        };

        match sink.insert_if_new(listing).await {
            Ok(InsertOutcome::Accepted(record)) => {
                outcome.accepted += 1;
                log::info!(
                    "New listing {} in {} / {}",
                    record.listing.source_id,
                    record.listing.city,
                    record.listing.district
                );
            }
            Ok(InsertOutcome::DuplicateRejected) => outcome.duplicates += 1,
            Ok(InsertOutcome::InvalidRejected(reason)) => {
                outcome.invalid += 1;
                log::warn!("Sink rejected candidate: {reason}");
            }
            Err(e) => {
                outcome.invalid += 1;
                log::warn!("Sink insert failed: {e}");
            }
        }
    }

    /// Fetch one page within the retry budget.
    async fn fetch_with_retry(
        &self,
        fetcher: &dyn PageFetcher,
        category: Category,
        city: City,
        page: u32,
    ) -> Result<String> {
        let attempts = self.config.crawler.retry_attempts.max(1);
        let pause = Duration::from_secs(self.config.crawler.retry_delay_secs);

        for attempt in 1..=attempts {
            match fetcher.fetch(category, city, page).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    log::warn!(
                        "Fetch {category}/{} page {page} failed (attempt {attempt}/{attempts}): {e}",
                        city.slug()
                    );
                    if attempt < attempts {
                        tokio::time::sleep(pause).await;
                    }
                }
            }
        }

        Err(AppError::fetch(
            format!("{category}/{} page {page}", city.slug()),
            "retry budget exhausted",
        ))
    }
}
