//! Storage abstractions for listings and subscriptions.
//!
//! The ingestion sink is append-only: records are immutable after acceptance
//! and never deleted by this core. The subscription store is keyed by
//! subscriber and is the only mutable per-subscriber state.

pub mod memory;
pub mod subscriptions;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{City, Listing, ListingFilter, ListingRecord, Subscription};

// Re-export for convenience
pub use memory::MemorySink;
pub use subscriptions::JsonSubscriptionStore;

/// Outcome of an insert-if-new attempt.
///
/// A duplicate is a normal outcome of re-crawling, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    /// Stored; carries the record as persisted, with `inserted_at` assigned
    Accepted(ListingRecord),
    /// Identity key already present; sink unchanged
    DuplicateRejected,
    /// Failed the validity check; sink unchanged
    InvalidRejected(String),
}

impl InsertOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, InsertOutcome::Accepted(_))
    }
}

/// Append-only store of normalized listings.
#[async_trait]
pub trait ListingSink: Send + Sync {
    /// Atomically insert the listing unless its identity key
    /// `(source_id, origin_site)` was ever ingested before.
    async fn insert_if_new(&self, listing: Listing) -> Result<InsertOutcome>;

    /// Records with `inserted_at` strictly greater than the watermark,
    /// matching the city exactly and the filter predicate, ascending by
    /// insertion time. A watermark older than the sink's lookback window is
    /// clamped to that window.
    async fn query_after(
        &self,
        city: City,
        watermark: DateTime<Utc>,
        filter: &ListingFilter,
    ) -> Result<Vec<ListingRecord>>;
}

/// Persistent per-subscriber delivery state.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Fetch one subscription.
    async fn get(&self, subscriber_id: i64) -> Result<Option<Subscription>>;

    /// Create or wholesale-replace the subscriber's subscription.
    async fn put(&self, subscription: Subscription) -> Result<()>;

    /// Remove the subscription. Returns whether one existed.
    async fn remove(&self, subscriber_id: i64) -> Result<bool>;

    /// All subscriptions with the active flag set.
    async fn list_active(&self) -> Result<Vec<Subscription>>;

    /// Move the watermark forward. A target at or behind the current
    /// watermark is a no-op; the cursor never moves backwards.
    async fn advance_watermark(&self, subscriber_id: i64, to: DateTime<Utc>) -> Result<()>;
}
