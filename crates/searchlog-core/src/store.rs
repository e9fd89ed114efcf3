//! Search log store trait
//!
//! Durable aggregate counters keyed by normalized query text.

use async_trait::async_trait;

use crate::{Error, Result, SearchLogRecord};

/// Durable per-text counter store
///
/// Implementations:
/// - `MemorySearchLogStore`: in-process `DashMap` (tests, ephemeral runs)
/// - `SqliteSearchLogStore`: SQLite upsert (single node)
/// - `PostgresSearchLogStore`: PostgreSQL upsert (shared)
///
/// Callers pass text that has already been normalized. Both operations reject
/// empty text.
///
/// # Example
/// ```no_run
/// # use searchlog_core::SearchLogStore;
/// # async fn example(store: &dyn SearchLogStore) -> searchlog_core::Result<()> {
/// let record = store.increment_and_get("pizza").await?;
/// assert!(record.count >= 1);
///
/// let found = store.get_by_text("pizza").await?;
/// assert_eq!(found.map(|r| r.id), Some(record.id));
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait SearchLogStore: Send + Sync {
    /// Create the record with count 1, or increment an existing one by 1 and
    /// refresh `updated_at`, returning the resulting record
    ///
    /// Atomic with respect to concurrent calls for the same text.
    ///
    /// # Errors
    /// - `Error::Validation` if `query_text` is empty
    /// - `Error::Store` for backend failures
    async fn increment_and_get(&self, query_text: &str) -> Result<SearchLogRecord>;

    /// Look up the record for `query_text` without side effects
    ///
    /// # Errors
    /// - `Error::Validation` if `query_text` is empty
    /// - `Error::Store` for backend failures
    async fn get_by_text(&self, query_text: &str) -> Result<Option<SearchLogRecord>>;
}

/// Reject empty query text at a store boundary
pub fn ensure_query_text(query_text: &str) -> Result<()> {
    if query_text.is_empty() {
        return Err(Error::Validation("query text cannot be empty".to_string()));
    }
    Ok(())
}
