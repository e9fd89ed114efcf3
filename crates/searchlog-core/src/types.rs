//! Value types shared by the coordinator and the backends

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latest query submitted by one client, as held in the client query cache
///
/// Serialized as `{"query_text": "...", "submitted_at": 1718000000000}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientQueryEntry {
    /// Normalized query text
    pub query_text: String,

    /// Submission time in epoch milliseconds
    pub submitted_at: i64,
}

impl ClientQueryEntry {
    pub fn new(query_text: impl Into<String>, submitted_at: i64) -> Self {
        Self {
            query_text: query_text.into(),
            submitted_at,
        }
    }

    /// True if this entry's text is a strict prefix of `other`'s text
    pub fn is_strict_prefix_of(&self, other: &ClientQueryEntry) -> bool {
        self.query_text.len() < other.query_text.len()
            && other.query_text.starts_with(&self.query_text)
    }
}

/// Durable aggregate count for one normalized query text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLogRecord {
    pub id: Uuid,

    /// Normalized query text, unique across records
    pub query_text: String,

    /// Number of accepted persistence decisions for this text (>= 1)
    pub count: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl SearchLogRecord {
    /// A freshly created record with count 1
    pub fn first(query_text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query_text: query_text.into(),
            count: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_json_shape() {
        let entry = ClientQueryEntry::new("cats", 1_718_000_000_123);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"query_text": "cats", "submitted_at": 1_718_000_000_123_i64})
        );

        let decoded: ClientQueryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_strict_prefix() {
        let short = ClientQueryEntry::new("foo-baz", 0);
        let long = ClientQueryEntry::new("foo-baz-bar", 0);
        assert!(short.is_strict_prefix_of(&long));
        assert!(!long.is_strict_prefix_of(&short));
    }

    #[test]
    fn test_equal_text_is_not_strict_prefix() {
        let a = ClientQueryEntry::new("abc", 0);
        let b = ClientQueryEntry::new("abc", 5);
        assert!(!a.is_strict_prefix_of(&b));
    }

    #[test]
    fn test_unrelated_text_is_not_prefix() {
        let x = ClientQueryEntry::new("x", 0);
        let y = ClientQueryEntry::new("yy", 0);
        assert!(!x.is_strict_prefix_of(&y));
    }

    #[test]
    fn test_empty_text_is_prefix_of_anything_longer() {
        let empty = ClientQueryEntry::new("", 0);
        assert!(empty.is_strict_prefix_of(&ClientQueryEntry::new("a", 0)));
    }

    #[test]
    fn test_first_record() {
        let now = Utc::now();
        let record = SearchLogRecord::first("pizza", now);
        assert_eq!(record.count, 1);
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.query_text, "pizza");
    }
}
