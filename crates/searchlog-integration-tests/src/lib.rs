//! End-to-end tests for SearchLog
//!
//! Wires the debounce coordinator to concrete backends and drives typing
//! sequences through the library API and the HTTP router.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use searchlog_core::{
    ClientQueryCache, ClientQueryEntry, DebounceConfig, DebounceCoordinator, Error,
    MonotonicClock, Result, SearchLogStore,
};
use searchlog_observability::Metrics;
use searchlog_server::{AppState, router};
use searchlog_storage::{MemoryQueryCache, MemorySearchLogStore};
use searchlog_store_sqlite::SqliteSearchLogStore;

/// A coordinator over concrete backends, plus handles for inspection
pub struct Harness {
    pub coordinator: DebounceCoordinator,
    pub cache: Arc<FlakyCache>,
    pub store: Arc<dyn SearchLogStore>,
    pub metrics: Arc<Metrics>,
}

impl Harness {
    /// In-memory backends with a tokio-driven clock, for paused-time tests
    pub fn in_memory(config: DebounceConfig) -> Self {
        Self::build(Arc::new(MemorySearchLogStore::new()), config, true)
    }

    /// SQLite store at `path` with the wall clock, for real-time tests
    pub async fn sqlite(path: &std::path::Path, config: DebounceConfig) -> Result<Self> {
        let store = SqliteSearchLogStore::new(path).await?;
        Ok(Self::build(Arc::new(store), config, false))
    }

    fn build(store: Arc<dyn SearchLogStore>, config: DebounceConfig, monotonic: bool) -> Self {
        let cache = Arc::new(FlakyCache::new());
        let metrics = Arc::new(Metrics::new().expect("metrics registry"));

        let mut coordinator = DebounceCoordinator::new(cache.clone(), store.clone(), config)
            .with_observer(metrics.clone());
        if monotonic {
            coordinator = coordinator.with_clock(Arc::new(MonotonicClock::new()));
        }

        Self {
            coordinator,
            cache,
            store,
            metrics,
        }
    }

    /// Submit `texts` for `client_key` with `gap` between submissions
    pub async fn type_sequence(&self, client_key: &str, texts: &[&str], gap: Duration) -> Result<()> {
        for (i, text) in texts.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(gap).await;
            }
            self.coordinator.log_search(client_key, text).await?;
        }
        Ok(())
    }

    /// Wait for every scheduled decision to finish
    pub async fn settle(&self) -> bool {
        let delay = self.coordinator.config().debounce_delay();
        self.coordinator
            .wait_idle(delay * 4 + Duration::from_secs(1))
            .await
    }

    pub async fn count(&self, text: &str) -> i64 {
        self.coordinator
            .get_count_by_text(text)
            .await
            .expect("count lookup")
    }

    /// HTTP router sharing this harness's coordinator and metrics
    pub fn router(&self) -> Router {
        router(AppState::new(
            self.coordinator.clone(),
            self.metrics.clone(),
        ))
    }
}

/// In-memory cache whose operations can be switched to fail
pub struct FlakyCache {
    inner: MemoryQueryCache,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FlakyCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryQueryCache::new(),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for FlakyCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClientQueryCache for FlakyCache {
    async fn get(&self, client_key: &str) -> Result<Option<ClientQueryEntry>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Cache("injected read failure".to_string()));
        }
        self.inner.get(client_key).await
    }

    async fn set(&self, client_key: &str, entry: &ClientQueryEntry, ttl: Duration) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Cache("injected write failure".to_string()));
        }
        self.inner.set(client_key, entry, ttl).await
    }

    async fn delete(&self, client_key: &str) -> Result<()> {
        self.inner.delete(client_key).await
    }
}
