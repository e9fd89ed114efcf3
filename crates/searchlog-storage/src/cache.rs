//! In-memory client query cache

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use searchlog_core::{ClientQueryCache, ClientQueryEntry, Result};
use tokio::time::{Instant, interval};

struct Slot {
    entry: ClientQueryEntry,
    expires_at: Instant,
}

/// Process-local `ClientQueryCache`
///
/// Deadlines use the tokio clock. Expired entries read as absent and are
/// removed on access; `start_expiry_sweeper` also removes entries nobody reads
/// again.
#[derive(Default)]
pub struct MemoryQueryCache {
    entries: DashMap<String, Slot>,
}

impl MemoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet removed
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Start background task that purges expired entries every `period`
    pub fn start_expiry_sweeper(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(&self);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "Purged expired client query entries");
                }
            }
        })
    }
}

#[async_trait]
impl ClientQueryCache for MemoryQueryCache {
    async fn get(&self, key: &str) -> Result<Option<ClientQueryEntry>> {
        let now = Instant::now();
        let found = self
            .entries
            .get(key)
            .map(|slot| (slot.entry.clone(), slot.expires_at));

        match found {
            Some((entry, expires_at)) if expires_at > now => Ok(Some(entry)),
            Some(_) => {
                self.entries.remove_if(key, |_, slot| slot.expires_at <= now);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, entry: &ClientQueryEntry, ttl: Duration) -> Result<()> {
        let slot = Slot {
            entry: entry.clone(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), slot);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30);

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryQueryCache::new();
        let entry = ClientQueryEntry::new("cats", 1_000);

        assert_eq!(cache.get("client").await.unwrap(), None);

        cache.set("client", &entry, TTL).await.unwrap();
        assert_eq!(cache.get("client").await.unwrap(), Some(entry));

        cache.delete("client").await.unwrap();
        assert_eq!(cache.get("client").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let cache = MemoryQueryCache::new();
        cache.delete("nobody").await.unwrap();
        cache.delete("nobody").await.unwrap();
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = MemoryQueryCache::new();
        cache
            .set("client", &ClientQueryEntry::new("cat", 1), TTL)
            .await
            .unwrap();
        cache
            .set("client", &ClientQueryEntry::new("dog", 2), TTL)
            .await
            .unwrap();

        assert_eq!(
            cache.get("client").await.unwrap(),
            Some(ClientQueryEntry::new("dog", 2))
        );
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_keys_are_verbatim() {
        let cache = MemoryQueryCache::new();
        cache
            .set("Client-A", &ClientQueryEntry::new("cat", 1), TTL)
            .await
            .unwrap();

        assert!(cache.get("client-a").await.unwrap().is_none());
        assert!(cache.get("Client-A").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryQueryCache::new();
        cache
            .set("client", &ClientQueryEntry::new("cat", 1), Duration::from_secs(5))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert!(cache.get("client").await.unwrap().is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("client").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_resets_ttl() {
        let cache = MemoryQueryCache::new();
        let ttl = Duration::from_secs(5);
        cache
            .set("client", &ClientQueryEntry::new("ca", 1), ttl)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        cache
            .set("client", &ClientQueryEntry::new("cat", 2), ttl)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(
            cache.get("client").await.unwrap(),
            Some(ClientQueryEntry::new("cat", 2))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = MemoryQueryCache::new();
        cache
            .set("short", &ClientQueryEntry::new("a", 1), Duration::from_secs(1))
            .await
            .unwrap();
        cache
            .set("long", &ClientQueryEntry::new("b", 1), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_sweeper() {
        let cache = Arc::new(MemoryQueryCache::new());
        let handle = cache.clone().start_expiry_sweeper(Duration::from_secs(1));

        cache
            .set("client", &ClientQueryEntry::new("cat", 1), Duration::from_millis(500))
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert!(cache.is_empty());

        handle.abort();
    }
}
