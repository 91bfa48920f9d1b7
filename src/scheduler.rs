//! Delivery scheduler.
//!
//! One recurring job per active subscription, each on its own interval. A
//! tick reloads the subscription, queries the sink past the watermark,
//! delivers in insertion order and then advances the watermark past the
//! newest delivered record. Jobs for removed or deactivated subscriptions
//! terminate themselves on their next tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::{SchedulerConfig, Subscription};
use crate::services::notifier::Notifier;
use crate::store::{ListingSink, SubscriptionStore};

/// What one delivery tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No records past the watermark
    Idle,
    /// Records delivered and the watermark advanced
    Delivered { sent: usize, failed: usize },
    /// Subscription gone or inactive; the job must stop
    Cancelled,
}

pub struct DeliveryScheduler {
    sink: Arc<dyn ListingSink>,
    subscriptions: Arc<dyn SubscriptionStore>,
    notifier: Arc<dyn Notifier>,
    watermark_step: Duration,
    jobs: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl DeliveryScheduler {
    pub fn new(
        sink: Arc<dyn ListingSink>,
        subscriptions: Arc<dyn SubscriptionStore>,
        notifier: Arc<dyn Notifier>,
        config: &SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            sink,
            subscriptions,
            notifier,
            watermark_step: Duration::seconds(config.watermark_step_secs),
            jobs: Mutex::new(HashMap::new()),
        })
    }

    /// Execute one delivery tick for a subscriber.
    ///
    /// Per-record delivery failures are logged and do not block the rest of
    /// the batch; the watermark advances past every record that was offered.
    pub async fn run_tick(&self, subscriber_id: i64) -> Result<TickOutcome> {
        let Some(subscription) = self.subscriptions.get(subscriber_id).await? else {
            return Ok(TickOutcome::Cancelled);
        };
        if !subscription.active {
            return Ok(TickOutcome::Cancelled);
        }

        let records = self
            .sink
            .query_after(
                subscription.filter.city,
                subscription.watermark,
                &subscription.filter,
            )
            .await?;
        if records.is_empty() {
            return Ok(TickOutcome::Idle);
        }

        let mut sent = 0;
        let mut failed = 0;
        let mut newest = subscription.watermark;
        for record in &records {
            match self.notifier.deliver(subscriber_id, record).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    failed += 1;
                    log::warn!(
                        "Delivery of {} to {subscriber_id} failed: {e}",
                        record.listing.source_id
                    );
                }
            }
            newest = newest.max(record.inserted_at);
        }

        self.subscriptions
            .advance_watermark(subscriber_id, newest + self.watermark_step)
            .await?;
        Ok(TickOutcome::Delivered { sent, failed })
    }

    /// Start (or restart) the recurring job for a subscription.
    pub async fn start_job(self: &Arc<Self>, subscription: &Subscription) {
        let subscriber_id = subscription.subscriber_id;
        let interval = StdDuration::from_secs(subscription.interval_secs.max(1));

        let mut jobs = self.jobs.lock().await;
        if let Some(old) = jobs.remove(&subscriber_id) {
            old.abort();
        }

        let scheduler = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match scheduler.run_tick(subscriber_id).await {
                    Ok(TickOutcome::Cancelled) => {
                        log::info!("Delivery job for {subscriber_id} stopped");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => log::warn!("Delivery tick for {subscriber_id} failed: {e}"),
                }
            }
            scheduler.jobs.lock().await.remove(&subscriber_id);
        });
        jobs.insert(subscriber_id, handle);
        log::info!(
            "Delivery job for {subscriber_id} scheduled every {}s",
            interval.as_secs()
        );
    }

    /// Stop the subscriber's job, if one is running.
    pub async fn cancel_job(&self, subscriber_id: i64) {
        if let Some(handle) = self.jobs.lock().await.remove(&subscriber_id) {
            handle.abort();
            log::info!("Delivery job for {subscriber_id} cancelled");
        }
    }

    /// Re-materialize jobs for persisted active subscriptions.
    ///
    /// Each watermark is reset to now first, so a long downtime never turns
    /// into a burst of stale deliveries on the first tick.
    pub async fn restore(self: &Arc<Self>) -> Result<usize> {
        let active = self.subscriptions.list_active().await?;
        for subscription in &active {
            self.subscriptions
                .advance_watermark(subscription.subscriber_id, Utc::now() + self.watermark_step)
                .await?;
            self.start_job(subscription).await;
        }
        Ok(active.len())
    }

    /// Number of currently scheduled jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.lock().await.len()
    }
}
