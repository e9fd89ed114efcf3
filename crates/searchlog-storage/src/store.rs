//! In-memory search log store

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use searchlog_core::{Result, SearchLogRecord, SearchLogStore, ensure_query_text};

/// Process-local `SearchLogStore`
///
/// Each increment holds only the shard lock of its own text, so different
/// texts rarely contend. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemorySearchLogStore {
    records: DashMap<String, SearchLogRecord>,
}

impl MemorySearchLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct texts recorded
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SearchLogStore for MemorySearchLogStore {
    async fn increment_and_get(&self, query_text: &str) -> Result<SearchLogRecord> {
        ensure_query_text(query_text)?;

        let now = Utc::now();
        let record = self
            .records
            .entry(query_text.to_string())
            .and_modify(|record| {
                record.count += 1;
                record.updated_at = now;
            })
            .or_insert_with(|| SearchLogRecord::first(query_text, now))
            .clone();

        Ok(record)
    }

    async fn get_by_text(&self, query_text: &str) -> Result<Option<SearchLogRecord>> {
        ensure_query_text(query_text)?;
        Ok(self.records.get(query_text).map(|r| r.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_then_increment() {
        let store = MemorySearchLogStore::new();

        let first = store.increment_and_get("pizza").await.unwrap();
        assert_eq!(first.count, 1);

        let second = store.increment_and_get("pizza").await.unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_texts_are_independent() {
        let store = MemorySearchLogStore::new();
        store.increment_and_get("pizza").await.unwrap();
        store.increment_and_get("sushi").await.unwrap();

        assert_eq!(store.get_by_text("pizza").await.unwrap().unwrap().count, 1);
        assert_eq!(store.get_by_text("sushi").await.unwrap().unwrap().count, 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_text_is_absent() {
        let store = MemorySearchLogStore::new();
        assert!(store.get_by_text("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let store = MemorySearchLogStore::new();
        assert!(store.increment_and_get("").await.unwrap_err().is_validation());
        assert!(store.get_by_text("").await.unwrap_err().is_validation());
        assert!(store.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemorySearchLogStore::new());

        let tasks: Vec<_> = (0..100)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_and_get("hot").await.unwrap() })
            })
            .collect();
        futures::future::join_all(tasks).await;

        assert_eq!(store.get_by_text("hot").await.unwrap().unwrap().count, 100);
    }
}
