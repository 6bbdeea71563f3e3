//! In-memory cache, used when Redis is not configured or unreachable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use agora_core::ports::{Cache, CacheError};

struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }
}

/// Every this many writes, `set` also sweeps out expired entries.
const SWEEP_EVERY: usize = 64;

fn sweep(store: &mut HashMap<String, CacheEntry>, now: Instant) -> usize {
    let before = store.len();
    store.retain(|_, entry| !entry.is_expired(now));
    before - store.len()
}

/// Process-local cache. Sessions and reset tokens are lost on restart.
///
/// Expired keys that are never read again are swept on every
/// [`SWEEP_EVERY`]th write.
pub struct InMemoryCache {
    store: RwLock<HashMap<String, CacheEntry>>,
    writes: AtomicUsize,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
        }
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) -> usize {
        sweep(&mut *self.store.write().await, Instant::now())
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let store = self.store.read().await;
            let entry = store.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }

        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|entry| entry.is_expired(now)) {
            store.remove(key);
        }
        None
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut store = self.store.write().await;

        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            let swept = sweep(&mut store, now);
            if swept > 0 {
                tracing::debug!(swept, "Swept expired cache entries");
            }
        }

        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: ttl.map(|d| now + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = InMemoryCache::new();
        cache.set("sess:abc", "7", None).await.unwrap();
        assert_eq!(cache.get("sess:abc").await, Some("7".to_string()));
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = InMemoryCache::new();
        cache.set("sess:abc", "7", None).await.unwrap();
        cache.delete("sess:abc").await.unwrap();
        assert_eq!(cache.get("sess:abc").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = InMemoryCache::new();
        cache
            .set("forget-password:t", "1", Some(Duration::ZERO))
            .await
            .unwrap();
        cache.set("keep", "1", None).await.unwrap();

        assert_eq!(cache.get("forget-password:t").await, None);
        assert_eq!(cache.purge_expired().await, 0);
        assert_eq!(cache.get("keep").await, Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = InMemoryCache::new();
        cache.set("a", "1", Some(Duration::ZERO)).await.unwrap();
        cache.set("b", "1", Some(Duration::ZERO)).await.unwrap();
        cache.set("c", "1", None).await.unwrap();

        assert_eq!(cache.purge_expired().await, 2);
    }

    #[tokio::test]
    async fn test_writes_sweep_abandoned_entries() {
        let cache = InMemoryCache::new();
        for i in 0..SWEEP_EVERY {
            cache
                .set(&format!("sess:{i}"), "1", Some(Duration::ZERO))
                .await
                .unwrap();
        }

        // The last write swept the earlier ones and left only itself.
        assert_eq!(cache.store.read().await.len(), 1);
        assert_eq!(cache.purge_expired().await, 1);
    }
}
