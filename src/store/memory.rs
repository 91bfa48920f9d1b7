//! In-memory ingestion sink.
//!
//! Records live in insertion order, so `query_after` ordering falls out of a
//! linear scan. The insert clock is monotonically non-decreasing even if the
//! wall clock steps backwards, which the delivery watermarks rely on.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::models::{City, Listing, ListingFilter, ListingRecord, SinkConfig};
use crate::store::{InsertOutcome, ListingSink};

/// In-memory append-only listing store.
pub struct MemorySink {
    lookback: Duration,
    inner: Mutex<SinkInner>,
}

#[derive(Default)]
struct SinkInner {
    /// Accepted records in insertion order
    records: Vec<ListingRecord>,
    /// Every identity key ever accepted
    seen: HashSet<(String, String)>,
    /// Timestamp of the newest accepted record
    last_inserted_at: Option<DateTime<Utc>>,
}

impl MemorySink {
    /// Create a sink with the given lookback window.
    pub fn new(lookback_minutes: i64) -> Self {
        Self {
            lookback: Duration::minutes(lookback_minutes),
            inner: Mutex::new(SinkInner::default()),
        }
    }

    /// Create a sink from the sink configuration section.
    pub fn from_config(config: &SinkConfig) -> Self {
        Self::new(config.lookback_minutes)
    }

    /// Number of accepted records.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("sink lock poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ListingSink for MemorySink {
    async fn insert_if_new(&self, listing: Listing) -> Result<InsertOutcome> {
        if let Err(e) = listing.validate() {
            return Ok(InsertOutcome::InvalidRejected(e.to_string()));
        }

        let mut inner = self.inner.lock().expect("sink lock poisoned");

        let (source_id, origin_site) = listing.identity_key();
        let key = (source_id.to_string(), origin_site.to_string());
        if inner.seen.contains(&key) {
            return Ok(InsertOutcome::DuplicateRejected);
        }

        let mut inserted_at = Utc::now();
        if let Some(last) = inner.last_inserted_at {
            inserted_at = inserted_at.max(last);
        }

        let record = ListingRecord {
            listing,
            inserted_at,
        };
        inner.seen.insert(key);
        inner.last_inserted_at = Some(inserted_at);
        inner.records.push(record.clone());

        Ok(InsertOutcome::Accepted(record))
    }

    async fn query_after(
        &self,
        city: City,
        watermark: DateTime<Utc>,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingRecord>> {
        let floor = Utc::now() - self.lookback;
        let watermark = watermark.max(floor);

        let inner = self.inner.lock().expect("sink lock poisoned");
        let matching = inner
            .records
            .iter()
            .filter(|r| {
                r.inserted_at > watermark && r.listing.city == city && filter.matches(&r.listing)
            })
            .cloned()
            .collect();
        Ok(matching)
    }
}
