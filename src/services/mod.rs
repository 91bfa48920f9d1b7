//! Crawling, extraction and delivery services.

pub mod crawler;
pub mod extract;
pub mod notifier;

pub use crawler::{CrawlOutcome, HttpFetcher, ListingCrawler, PageFetcher};
pub use extract::{PageExtract, PageSelectors};
pub use notifier::{LogNotifier, Notifier};
