//! Shared key/value cache holding the health snapshot
//!
//! The tracker stores JSON values so any backend able to hold a string with
//! a TTL can stand behind [`SharedCache`]. [`MemoryCache`] covers the
//! single-process case.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::ClusterResult;

/// Cache shared by every client of a cluster
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Value stored under `key`, `None` when absent or expired
    async fn get(&self, key: &str) -> ClusterResult<Option<Value>>;

    /// Store `value` under `key` for `ttl`
    async fn put(&self, key: &str, value: Value, ttl: Duration) -> ClusterResult<()>;

    async fn forget(&self, key: &str) -> ClusterResult<()>;
}

#[derive(Debug)]
struct CacheEntry {
    value: Value,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }
}

/// Process-local cache with per-entry expiry
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.write().retain(|_, entry| entry.is_live(now));
    }
}

#[async_trait]
impl SharedCache for MemoryCache {
    async fn get(&self, key: &str) -> ClusterResult<Option<Value>> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired
        self.entries.write().remove(key);
        Ok(None)
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> ClusterResult<()> {
        self.purge_expired();
        self.entries.write().insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn forget(&self, key: &str) -> ClusterResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = MemoryCache::new();
        cache
            .put("health", json!({"a": 1}), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("health").await.unwrap(), Some(json!({"a": 1})));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get("health").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get("health").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_put_replaces_and_forget_removes() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(30);

        cache.put("k", json!(1), ttl).await.unwrap();
        cache.put("k", json!(2), ttl).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(json!(2)));
        assert_eq!(cache.len(), 1);

        cache.forget("k").await.unwrap();
        assert!(cache.get("k").await.unwrap().is_none());
        assert!(cache.get("missing").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.put("forever", json!("x"), Duration::MAX).await.unwrap();
        cache
            .put("long", json!("y"), Duration::from_secs(u64::MAX / 2))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;
        assert_eq!(cache.get("forever").await.unwrap(), Some(json!("x")));
        assert_eq!(cache.get("long").await.unwrap(), Some(json!("y")));
        assert_eq!(cache.len(), 2);
    }
}
