//! Backend factory
//!
//! Builds the `ClientQueryCache` and `SearchLogStore` implementations named by
//! the configuration.

use std::sync::Arc;
use std::time::Duration;

use searchlog_core::{ClientQueryCache, Error, Result, SearchLogStore};
use searchlog_storage::{MemoryQueryCache, MemorySearchLogStore};
use searchlog_store_sqlite::SqliteSearchLogStore;

#[cfg(feature = "postgres")]
use crate::config::PostgresConfig;
use crate::config::{CacheBackend, CacheConfig, StoreBackend, StoreConfig};

/// Create the client query cache
///
/// # Errors
/// - `Error::Cache` if Redis is unreachable
/// - `Error::Config` if the backend was not compiled in
pub async fn create_cache(config: &CacheConfig) -> Result<Arc<dyn ClientQueryCache>> {
    match config.backend {
        CacheBackend::Memory => {
            let cache = Arc::new(MemoryQueryCache::new());
            if config.sweep_interval_seconds > 0 {
                // Detached; runs for the life of the process
                let sweeper = cache
                    .clone()
                    .start_expiry_sweeper(Duration::from_secs(config.sweep_interval_seconds));
                drop(sweeper);
            }
            tracing::info!("Using in-memory client query cache");
            Ok(cache)
        }
        CacheBackend::Redis => create_redis_cache(config).await,
    }
}

#[cfg(feature = "redis")]
async fn create_redis_cache(config: &CacheConfig) -> Result<Arc<dyn ClientQueryCache>> {
    use searchlog_cache_redis::{RedisCacheConfig, RedisQueryCache};

    tracing::info!("Initializing Redis client query cache");
    let redis_config = RedisCacheConfig::with_url(config.redis_url.as_str())
        .with_key_prefix(config.key_prefix.as_str())
        .with_connection_timeout(Duration::from_secs(config.connection_timeout_seconds));

    Ok(Arc::new(RedisQueryCache::connect(redis_config).await?))
}

#[cfg(not(feature = "redis"))]
async fn create_redis_cache(_config: &CacheConfig) -> Result<Arc<dyn ClientQueryCache>> {
    Err(Error::Config(
        "Redis cache requested but the redis feature is not enabled".to_string(),
    ))
}

/// Create the search log store
///
/// # Errors
/// - `Error::Store` if the database cannot be opened or migrated
/// - `Error::Config` if the backend was not compiled in
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn SearchLogStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory search log store; counts are lost on exit");
            Ok(Arc::new(MemorySearchLogStore::new()))
        }
        StoreBackend::Sqlite => {
            if config.sqlite_path.trim().is_empty() {
                return Err(Error::Config("SQLite path cannot be empty".to_string()));
            }
            tracing::info!(path = %config.sqlite_path, "Initializing SQLite search log store");
            Ok(Arc::new(SqliteSearchLogStore::new(&config.sqlite_path).await?))
        }
        StoreBackend::Postgres => create_postgres_store(config).await,
    }
}

#[cfg(feature = "postgres")]
async fn create_postgres_store(config: &StoreConfig) -> Result<Arc<dyn SearchLogStore>> {
    use searchlog_store_postgres::PostgresSearchLogStore;

    tracing::info!("Initializing PostgreSQL search log store");
    let pg = &config.postgres;
    let store = PostgresSearchLogStore::connect(&pg.connection_string, &pool_settings(pg)).await?;
    Ok(Arc::new(store))
}

#[cfg(feature = "postgres")]
fn pool_settings(pg: &PostgresConfig) -> searchlog_store_postgres::PoolSettings {
    let optional = |seconds: u64| (seconds > 0).then_some(Duration::from_secs(seconds));

    searchlog_store_postgres::PoolSettings {
        max_connections: pg.max_connections,
        min_connections: pg.min_connections,
        acquire_timeout: Duration::from_secs(pg.acquire_timeout_seconds),
        idle_timeout: optional(pg.idle_timeout_seconds),
        max_lifetime: optional(pg.max_lifetime_seconds),
    }
}

#[cfg(not(feature = "postgres"))]
async fn create_postgres_store(_config: &StoreConfig) -> Result<Arc<dyn SearchLogStore>> {
    Err(Error::Config(
        "PostgreSQL store requested but the postgres feature is not enabled".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchlog_core::ClientQueryEntry;

    #[tokio::test]
    async fn test_memory_cache() {
        let config = CacheConfig {
            sweep_interval_seconds: 0,
            ..CacheConfig::default()
        };
        let cache = create_cache(&config).await.unwrap();

        cache
            .set("client", &ClientQueryEntry::new("cat", 1), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(cache.get("client").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let config = StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        };
        let store = create_store(&config).await.unwrap();
        assert_eq!(store.increment_and_get("cat").await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_in_temp_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            sqlite_path: dir.path().join("db").join("searchlog.db").display().to_string(),
            ..StoreConfig::default()
        };

        let store = create_store(&config).await.unwrap();
        store.increment_and_get("cat").await.unwrap();
        assert_eq!(store.get_by_text("cat").await.unwrap().unwrap().count, 1);
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_pool_settings_from_config() {
        let pg = PostgresConfig {
            max_connections: 25,
            min_connections: 2,
            acquire_timeout_seconds: 3,
            idle_timeout_seconds: 0,
            max_lifetime_seconds: 900,
            ..PostgresConfig::default()
        };

        let settings = pool_settings(&pg);
        assert_eq!(settings.max_connections, 25);
        assert_eq!(settings.min_connections, 2);
        assert_eq!(settings.acquire_timeout, Duration::from_secs(3));
        assert_eq!(settings.idle_timeout, None);
        assert_eq!(settings.max_lifetime, Some(Duration::from_secs(900)));
    }

    #[tokio::test]
    async fn test_sweeper_keeps_running_after_setup() {
        let config = CacheConfig {
            sweep_interval_seconds: 1,
            ..CacheConfig::default()
        };
        let cache = create_cache(&config).await.unwrap();

        cache
            .set("client", &ClientQueryEntry::new("cat", 1), Duration::from_secs(5))
            .await
            .unwrap();
        tokio::task::yield_now().await;
        assert!(cache.get("client").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_sqlite_path_rejected() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            sqlite_path: " ".to_string(),
            ..StoreConfig::default()
        };
        assert!(matches!(
            create_store(&config).await,
            Err(Error::Config(_))
        ));
    }
}
