//! Redis connection settings

use std::time::Duration;

pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_KEY_PREFIX: &str = "searchlog:client:";

/// Configuration for the Redis client query cache
///
/// # Example
/// ```
/// use searchlog_cache_redis::RedisCacheConfig;
/// use std::time::Duration;
///
/// let config = RedisCacheConfig::with_url("redis://cache:6379/2")
///     .with_key_prefix("prod:searchlog:")
///     .with_connection_timeout(Duration::from_secs(2));
/// assert_eq!(config.key_prefix, "prod:searchlog:");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisCacheConfig {
    /// `redis://[user[:password]@]host[:port][/database]`
    pub url: String,

    /// Prepended to every client key
    pub key_prefix: String,

    /// Maximum time to wait for the initial connection
    pub connection_timeout: Duration,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisCacheConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}
