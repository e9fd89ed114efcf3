//! Client query cache trait
//!
//! The cache holds, per client key, the most recently submitted query. It is
//! the only coordination state shared between a submission and its deferred
//! persistence decision.

use std::time::Duration;

use async_trait::async_trait;

use crate::{ClientQueryEntry, Result};

/// Per-client "latest query" cache with per-key TTL
///
/// Implementations:
/// - `MemoryQueryCache`: in-process `DashMap` with lazy expiry (single node)
/// - `RedisQueryCache`: Redis `PSETEX`/`GET`/`DEL` (shared across nodes)
///
/// Every operation is atomic for a single key. There are no multi-key
/// operations.
///
/// # Example
/// ```no_run
/// # use searchlog_core::{ClientQueryCache, ClientQueryEntry};
/// # use std::time::Duration;
/// # async fn example(cache: &dyn ClientQueryCache) -> searchlog_core::Result<()> {
/// let entry = ClientQueryEntry::new("cats", 1_718_000_000_000);
/// cache.set("203.0.113.7", &entry, Duration::from_secs(30)).await?;
///
/// assert_eq!(cache.get("203.0.113.7").await?, Some(entry));
///
/// cache.delete("203.0.113.7").await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ClientQueryCache: Send + Sync {
    /// Get the live entry for `key`, or `None` if absent or expired
    ///
    /// # Errors
    /// - `Error::Cache` for connectivity or decoding failures
    async fn get(&self, key: &str) -> Result<Option<ClientQueryEntry>>;

    /// Store `entry` under `key`, fully replacing any prior entry and
    /// resetting its TTL
    ///
    /// # Errors
    /// - `Error::Cache` for connectivity or encoding failures
    async fn set(&self, key: &str, entry: &ClientQueryEntry, ttl: Duration) -> Result<()>;

    /// Remove the entry for `key`; removing an absent key succeeds
    ///
    /// # Errors
    /// - `Error::Cache` for connectivity failures
    async fn delete(&self, key: &str) -> Result<()>;
}
