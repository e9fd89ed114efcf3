//! Redis-backed `ClientQueryCache`

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use searchlog_core::{ClientQueryCache, ClientQueryEntry, Error, Result};

use crate::{RedisCacheConfig, RedisConnection};

/// Client query cache on Redis
///
/// Entries are JSON strings under `<key_prefix><client_key>`, written with
/// `PSETEX` so sub-second TTLs are honored.
#[derive(Clone, Debug)]
pub struct RedisQueryCache {
    connection: RedisConnection,
}

impl RedisQueryCache {
    pub fn new(connection: RedisConnection) -> Self {
        Self { connection }
    }

    /// Connect using `config`
    pub async fn connect(config: RedisCacheConfig) -> Result<Self> {
        Ok(Self::new(RedisConnection::connect(config).await?))
    }

    /// Round-trip a `PING`, for readiness checks
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.manager();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| Error::Cache(format!("Redis PING failed: {}", e)))?;
        Ok(())
    }
}

pub(crate) fn ttl_millis(ttl: Duration) -> u64 {
    // PSETEX rejects 0
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl ClientQueryCache for RedisQueryCache {
    async fn get(&self, key: &str) -> Result<Option<ClientQueryEntry>> {
        let redis_key = self.connection.format_key(key);
        let mut conn = self.connection.manager();

        let value: Option<String> = conn
            .get(&redis_key)
            .await
            .map_err(|e| Error::Cache(format!("Failed to get {}: {}", redis_key, e)))?;

        value
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    Error::Cache(format!("Failed to decode entry at {}: {}", redis_key, e))
                })
            })
            .transpose()
    }

    async fn set(&self, key: &str, entry: &ClientQueryEntry, ttl: Duration) -> Result<()> {
        let redis_key = self.connection.format_key(key);
        let json = serde_json::to_string(entry)
            .map_err(|e| Error::Cache(format!("Failed to encode entry: {}", e)))?;
        let mut conn = self.connection.manager();

        let _: () = conn
            .pset_ex(&redis_key, json, ttl_millis(ttl))
            .await
            .map_err(|e| Error::Cache(format!("Failed to set {}: {}", redis_key, e)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let redis_key = self.connection.format_key(key);
        let mut conn = self.connection.manager();

        let _: i64 = conn
            .del(&redis_key)
            .await
            .map_err(|e| Error::Cache(format!("Failed to delete {}: {}", redis_key, e)))?;
        Ok(())
    }
}
