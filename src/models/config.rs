//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Category, City};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Ingestion sink settings
    #[serde(default)]
    pub sink: SinkConfig,

    /// Delivery scheduler settings
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_pages == 0 {
            return Err(AppError::validation("crawler.max_pages must be > 0"));
        }
        if self.crawler.retry_attempts == 0 {
            return Err(AppError::validation("crawler.retry_attempts must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if !self.crawler.search_url.contains("{category}")
            || !self.crawler.search_url.contains("{city}")
            || !self.crawler.search_url.contains("{page}")
        {
            return Err(AppError::validation(
                "crawler.search_url must contain {category}, {city} and {page}",
            ));
        }
        if self.crawler.site_offset().is_none() {
            return Err(AppError::validation(
                "crawler.site_utc_offset_hours is out of range",
            ));
        }
        if self.sink.lookback_minutes == 0 {
            return Err(AppError::validation("sink.lookback_minutes must be > 0"));
        }
        if self.scheduler.default_interval_secs == 0 {
            return Err(AppError::validation(
                "scheduler.default_interval_secs must be > 0",
            ));
        }
        if self.scheduler.watermark_step_secs == 0 {
            return Err(AppError::validation(
                "scheduler.watermark_step_secs must be > 0",
            ));
        }
        Ok(())
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Listing index URL template with {category}, {city} and {page}
    #[serde(default = "defaults::search_url")]
    pub search_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent (category, city) pagination runs
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Page ceiling per (category, city) pair; circuit breaker against a
    /// missed end-of-results signal
    #[serde(default = "defaults::max_pages")]
    pub max_pages: u32,

    /// Fetch attempts per page before the pair's run is aborted
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,

    /// Pause before retrying a failed page fetch, in seconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,

    /// Fixed UTC offset of the source site's timezone, in hours
    #[serde(default = "defaults::site_utc_offset")]
    pub site_utc_offset_hours: i32,
}

impl CrawlerConfig {
    /// Listing index URL for one (category, city, page) triple.
    pub fn page_url(&self, category: Category, city: City, page: u32) -> String {
        self.search_url
            .replace("{category}", category.slug())
            .replace("{city}", city.slug())
            .replace("{page}", &page.to_string())
    }

    /// The source site's timezone as a fixed offset.
    pub fn site_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.site_utc_offset_hours * 3600)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            search_url: defaults::search_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
            max_pages: defaults::max_pages(),
            retry_attempts: defaults::retry_attempts(),
            retry_delay_secs: defaults::retry_delay(),
            site_utc_offset_hours: defaults::site_utc_offset(),
        }
    }
}

/// Ingestion sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Oldest watermark honored by reads, in minutes before now.
    /// Bounds historical replay when a caller supplies a stale cursor.
    #[serde(default = "defaults::lookback")]
    pub lookback_minutes: i64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            lookback_minutes: defaults::lookback(),
        }
    }
}

/// Delivery scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delivery interval for new subscriptions, in seconds
    #[serde(default = "defaults::default_interval")]
    pub default_interval_secs: u64,

    /// Amount the watermark is advanced past the newest delivered record,
    /// in seconds
    #[serde(default = "defaults::watermark_step")]
    pub watermark_step_secs: i64,

    /// Pause between crawl runs in continuous mode, in seconds
    #[serde(default = "defaults::crawl_interval")]
    pub crawl_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: defaults::default_interval(),
            watermark_step_secs: defaults::watermark_step(),
            crawl_interval_secs: defaults::crawl_interval(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Persisted subscriptions file
    #[serde(default = "defaults::subscriptions_file")]
    pub subscriptions_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            subscriptions_file: defaults::subscriptions_file(),
        }
    }
}

mod defaults {
    // Crawler defaults
    pub fn search_url() -> String {
        "https://www.halooglasi.com/nekretnine/{category}/{city}?page={page}".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; rentwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }
    pub fn max_concurrent() -> usize {
        2
    }
    pub fn max_pages() -> u32 {
        40
    }
    pub fn retry_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        5
    }
    pub fn site_utc_offset() -> i32 {
        2
    }

    // Sink defaults
    pub fn lookback() -> i64 {
        30
    }

    // Scheduler defaults
    pub fn default_interval() -> u64 {
        600
    }
    pub fn watermark_step() -> i64 {
        1
    }
    pub fn crawl_interval() -> u64 {
        600
    }

    // Path defaults
    pub fn subscriptions_file() -> String {
        "data/subscriptions.json".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_pages() {
        let mut config = Config::default();
        config.crawler.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_template_without_placeholders() {
        let mut config = Config::default();
        config.crawler.search_url = "https://example.com/list?page={page}".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_url_substitution() {
        let config = CrawlerConfig::default();
        assert_eq!(
            config.page_url(Category::FlatRentals, City::NoviSad, 3),
            "https://www.halooglasi.com/nekretnine/izdavanje-stanova/novi-sad?page=3"
        );
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.crawler.max_pages, 40);
        assert_eq!(config.crawler.retry_attempts, 3);
        assert_eq!(config.sink.lookback_minutes, 30);
        assert_eq!(config.scheduler.default_interval_secs, 600);
    }
}
