//! Debounce coordinator
//!
//! Accepts per-client query submissions, records each one as the client's
//! latest query, and after the debounce delay decides in a detached task
//! whether the submission is worth counting.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use crate::{
    ClientQueryCache, ClientQueryEntry, Clock, DebounceConfig, Decision, DecisionObserver,
    DecisionOutcome, Error, Result, SearchLogStore, SystemClock, normalize_query,
};

/// Coordinates the client query cache and the search log store
///
/// Cheap to clone; clones share backends and in-flight accounting.
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use searchlog_core::{ClientQueryCache, DebounceConfig, DebounceCoordinator, SearchLogStore};
/// # async fn example(
/// #     cache: Arc<dyn ClientQueryCache>,
/// #     store: Arc<dyn SearchLogStore>,
/// # ) -> searchlog_core::Result<()> {
/// let coordinator = DebounceCoordinator::new(cache, store, DebounceConfig::default());
///
/// coordinator.log_search("203.0.113.7", "Ca").await?;
/// coordinator.log_search("203.0.113.7", "Cat").await?;
///
/// // Three seconds later only "cat" has been counted
/// let count = coordinator.get_count_by_text("cat").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DebounceCoordinator {
    cache: Arc<dyn ClientQueryCache>,
    store: Arc<dyn SearchLogStore>,
    config: DebounceConfig,
    clock: Arc<dyn Clock>,
    observer: Option<Arc<dyn DecisionObserver>>,
    in_flight: Arc<InFlight>,
}

impl DebounceCoordinator {
    pub fn new(
        cache: Arc<dyn ClientQueryCache>,
        store: Arc<dyn SearchLogStore>,
        config: DebounceConfig,
    ) -> Self {
        Self {
            cache,
            store,
            config,
            clock: Arc::new(SystemClock),
            observer: None,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Replace the timestamp source (defaults to `SystemClock`)
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Report every finished decision to `observer`
    pub fn with_observer(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    /// Record a submission and schedule its persistence decision
    ///
    /// Returns once the submission is stored as the client's latest query.
    /// The decision runs later in a detached task; acceptance does not imply
    /// the submission will be counted.
    ///
    /// # Errors
    /// - `Error::Validation` if `client_key` is empty
    /// - `Error::Cache` if the cache write fails (no task is scheduled)
    pub async fn log_search(&self, client_key: &str, raw_query_text: &str) -> Result<()> {
        if client_key.is_empty() {
            return Err(Error::Validation("client key cannot be empty".to_string()));
        }

        let submission =
            ClientQueryEntry::new(normalize_query(raw_query_text), self.clock.now_millis());

        self.cache
            .set(client_key, &submission, self.config.cache_ttl())
            .await
            .inspect_err(|e| {
                tracing::error!(client_key = %client_key, error = %e, "Failed to cache latest query");
            })?;

        tracing::debug!(
            client_key = %client_key,
            query_text = %submission.query_text,
            submitted_at = submission.submitted_at,
            "Accepted search submission"
        );

        let guard = InFlightGuard::acquire(Arc::clone(&self.in_flight));
        let task = DecisionTask {
            cache: Arc::clone(&self.cache),
            store: Arc::clone(&self.store),
            observer: self.observer.clone(),
            client_key: client_key.to_string(),
            submission,
        };
        let delay = self.config.debounce_delay();

        tokio::spawn(async move {
            let _guard = guard;
            tokio::time::sleep(delay).await;
            task.run().await;
        });

        Ok(())
    }

    /// Stored count for `text` after normalization, or 0 if never counted
    ///
    /// # Errors
    /// - `Error::Validation` if `text` is empty after normalization
    /// - `Error::Store` for backend failures
    pub async fn get_count_by_text(&self, text: &str) -> Result<i64> {
        let query_text = normalize_query(text);
        if query_text.is_empty() {
            return Err(Error::Validation("query text cannot be empty".to_string()));
        }

        let record = self.store.get_by_text(&query_text).await?;
        Ok(record.map_or(0, |r| r.count))
    }

    /// Number of scheduled decisions that have not finished
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Wait until no decisions are in flight
    ///
    /// Returns `false` if `timeout` elapsed first. Tasks are only observed,
    /// never cancelled.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let in_flight = Arc::clone(&self.in_flight);
        tokio::time::timeout(timeout, async move {
            loop {
                let notified = in_flight.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                if in_flight.count.load(Ordering::Acquire) == 0 {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count on drop, including when the task panics
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn acquire(in_flight: Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::AcqRel);
        Self(in_flight)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// One deferred persistence decision
struct DecisionTask {
    cache: Arc<dyn ClientQueryCache>,
    store: Arc<dyn SearchLogStore>,
    observer: Option<Arc<dyn DecisionObserver>>,
    client_key: String,
    submission: ClientQueryEntry,
}

impl DecisionTask {
    async fn run(self) {
        let outcome = self.decide().await;
        if let Some(observer) = &self.observer {
            observer.on_decision(outcome);
        }
    }

    async fn decide(&self) -> DecisionOutcome {
        let latest = match self.cache.get(&self.client_key).await {
            Ok(latest) => latest,
            Err(e) => {
                tracing::error!(
                    client_key = %self.client_key,
                    error = %e,
                    "Failed to read latest query; submission dropped"
                );
                return DecisionOutcome::CacheReadFailed;
            }
        };

        let decision = Decision::evaluate(&self.submission, latest.as_ref());
        if !decision.is_persist() {
            tracing::debug!(
                client_key = %self.client_key,
                query_text = %self.submission.query_text,
                decision = decision.as_str(),
                "Skipping intermediate submission"
            );
            return decision.into();
        }

        match self.store.increment_and_get(&self.submission.query_text).await {
            Ok(record) => {
                tracing::info!(
                    query_text = %record.query_text,
                    count = record.count,
                    "Search log persisted"
                );
            }
            Err(e) => {
                tracing::error!(
                    client_key = %self.client_key,
                    query_text = %self.submission.query_text,
                    error = %e,
                    "Failed to persist search log"
                );
                return DecisionOutcome::StoreFailed;
            }
        }

        if let Err(e) = self.cache.delete(&self.client_key).await {
            tracing::warn!(
                client_key = %self.client_key,
                error = %e,
                "Failed to clear latest query after persisting"
            );
        }

        DecisionOutcome::Persisted
    }
}
