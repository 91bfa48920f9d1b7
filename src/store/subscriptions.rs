//! Subscription store with JSON file persistence.
//!
//! Subscriptions survive process restarts: every mutation is flushed to a
//! JSON file with a write-to-temp-then-rename, and `open` reloads it. An
//! in-memory variant backs tests and ephemeral runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::Subscription;
use crate::store::SubscriptionStore;

/// Subscription store backed by an optional JSON file.
pub struct JsonSubscriptionStore {
    path: Option<PathBuf>,
    inner: Mutex<HashMap<i64, Subscription>>,
}

impl JsonSubscriptionStore {
    /// Store without persistence.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Open a file-backed store, loading any previously persisted state.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let map = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let subscriptions: Vec<Subscription> = serde_json::from_slice(&bytes)?;
                subscriptions
                    .into_iter()
                    .map(|s| (s.subscriber_id, s))
                    .collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(AppError::Io(e)),
        };

        Ok(Self {
            path: Some(path),
            inner: Mutex::new(map),
        })
    }

    /// Flush the current state to disk (no-op for the in-memory variant).
    async fn persist(&self, map: &HashMap<i64, Subscription>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut subscriptions: Vec<&Subscription> = map.values().collect();
        subscriptions.sort_by_key(|s| s.subscriber_id);
        let bytes = serde_json::to_vec_pretty(&subscriptions)?;

        ensure_parent(path).await?;
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    Ok(())
}

#[async_trait]
impl SubscriptionStore for JsonSubscriptionStore {
    async fn get(&self, subscriber_id: i64) -> Result<Option<Subscription>> {
        let map = self.inner.lock().await;
        Ok(map.get(&subscriber_id).cloned())
    }

    async fn put(&self, subscription: Subscription) -> Result<()> {
        subscription.validate()?;
        let mut map = self.inner.lock().await;
        map.insert(subscription.subscriber_id, subscription);
        self.persist(&map).await
    }

    async fn remove(&self, subscriber_id: i64) -> Result<bool> {
        let mut map = self.inner.lock().await;
        let existed = map.remove(&subscriber_id).is_some();
        if existed {
            self.persist(&map).await?;
        }
        Ok(existed)
    }

    async fn list_active(&self) -> Result<Vec<Subscription>> {
        let map = self.inner.lock().await;
        let mut active: Vec<Subscription> = map.values().filter(|s| s.active).cloned().collect();
        active.sort_by_key(|s| s.subscriber_id);
        Ok(active)
    }

    async fn advance_watermark(&self, subscriber_id: i64, to: DateTime<Utc>) -> Result<()> {
        let mut map = self.inner.lock().await;
        let subscription = map
            .get_mut(&subscriber_id)
            .ok_or(AppError::SubscriptionMissing(subscriber_id))?;

        // The cursor never moves backwards.
        if to <= subscription.watermark {
            return Ok(());
        }
        subscription.watermark = to;
        self.persist(&map).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{City, ListingFilter};
    use chrono::Duration;

    fn make_subscription(subscriber_id: i64) -> Subscription {
        Subscription::new(subscriber_id, ListingFilter::for_city(City::Belgrade), 600)
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = JsonSubscriptionStore::in_memory();
        let sub = make_subscription(7);
        store.put(sub.clone()).await.unwrap();
        assert_eq!(store.get(7).await.unwrap(), Some(sub));
        assert_eq!(store.get(8).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces_wholesale() {
        let store = JsonSubscriptionStore::in_memory();
        let mut sub = make_subscription(7);
        sub.filter.districts = vec!["Zemun".to_string()];
        store.put(sub).await.unwrap();

        // Reconfiguration drops the old districts rather than merging.
        let replacement = make_subscription(7);
        store.put(replacement.clone()).await.unwrap();
        assert_eq!(store.get(7).await.unwrap(), Some(replacement));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = JsonSubscriptionStore::in_memory();
        store.put(make_subscription(7)).await.unwrap();
        assert!(store.remove(7).await.unwrap());
        assert!(!store.remove(7).await.unwrap());
        assert_eq!(store.get(7).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive() {
        let store = JsonSubscriptionStore::in_memory();
        store.put(make_subscription(1)).await.unwrap();
        let mut inactive = make_subscription(2);
        inactive.active = false;
        store.put(inactive).await.unwrap();

        let active = store.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].subscriber_id, 1);
    }

    #[tokio::test]
    async fn test_advance_watermark_is_monotonic() {
        let store = JsonSubscriptionStore::in_memory();
        let sub = make_subscription(7);
        let start = sub.watermark;
        store.put(sub).await.unwrap();

        let forward = start + Duration::seconds(10);
        store.advance_watermark(7, forward).await.unwrap();
        assert_eq!(store.get(7).await.unwrap().unwrap().watermark, forward);

        // A backwards move is silently ignored.
        store
            .advance_watermark(7, start - Duration::seconds(10))
            .await
            .unwrap();
        assert_eq!(store.get(7).await.unwrap().unwrap().watermark, forward);
    }

    #[tokio::test]
    async fn test_advance_watermark_missing_subscription() {
        let store = JsonSubscriptionStore::in_memory();
        let result = store.advance_watermark(404, Utc::now()).await;
        assert!(matches!(result, Err(AppError::SubscriptionMissing(404))));
    }

    #[tokio::test]
    async fn test_file_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subscriptions.json");

        let store = JsonSubscriptionStore::open(&path).await.unwrap();
        store.put(make_subscription(7)).await.unwrap();
        store.put(make_subscription(8)).await.unwrap();
        store.remove(8).await.unwrap();
        drop(store);

        let reopened = JsonSubscriptionStore::open(&path).await.unwrap();
        assert!(reopened.get(7).await.unwrap().is_some());
        assert!(reopened.get(8).await.unwrap().is_none());
        assert_eq!(reopened.list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSubscriptionStore::open(dir.path().join("none.json"))
            .await
            .unwrap();
        assert!(store.list_active().await.unwrap().is_empty());
    }
}
