//! Managed Redis connection

use std::sync::Arc;

use redis::aio::ConnectionManager;
use searchlog_core::{Error, Result};

use crate::RedisCacheConfig;

/// Reconnecting Redis connection plus key namespacing
#[derive(Clone)]
pub struct RedisConnection {
    manager: ConnectionManager,
    config: Arc<RedisCacheConfig>,
}

impl RedisConnection {
    /// Connect within `config.connection_timeout`
    ///
    /// # Errors
    /// - `Error::Cache` if the URL is invalid, the server is unreachable, or
    ///   the timeout elapses
    pub async fn connect(config: RedisCacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| Error::Cache(format!("Invalid Redis URL: {}", e)))?;

        let manager = tokio::time::timeout(config.connection_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                Error::Cache(format!(
                    "Timed out connecting to Redis after {:?}",
                    config.connection_timeout
                ))
            })?
            .map_err(|e| Error::Cache(format!("Failed to connect to Redis: {}", e)))?;

        tracing::info!(key_prefix = %config.key_prefix, "Connected to Redis");

        Ok(Self {
            manager,
            config: Arc::new(config),
        })
    }

    /// Handle for one command; clones share the underlying connection
    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }

    pub fn format_key(&self, client_key: &str) -> String {
        format_key(&self.config.key_prefix, client_key)
    }

    pub fn config(&self) -> &RedisCacheConfig {
        &self.config
    }
}

impl std::fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConnection")
            .field("key_prefix", &self.config.key_prefix)
            .finish_non_exhaustive()
    }
}

pub(crate) fn format_key(key_prefix: &str, client_key: &str) -> String {
    format!("{}{}", key_prefix, client_key)
}
