//! SQLite search log store
//!
//! Single-node durable backend for `SearchLogStore`. Increments are a single
//! upsert statement, so concurrent decisions for the same text never lose a
//! count.

pub mod sqlite_store;

pub use sqlite_store::SqliteSearchLogStore;
