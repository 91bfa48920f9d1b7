//! Data models for the listing pipeline.

pub mod config;
pub mod listing;
pub mod subscription;

pub use config::{Config, CrawlerConfig, PathsConfig, SchedulerConfig, SinkConfig};
pub use listing::{Category, City, Listing, ListingRecord, ORIGIN_SITE, PropertyType, Reporter};
pub use subscription::{ListingFilter, Subscription};
