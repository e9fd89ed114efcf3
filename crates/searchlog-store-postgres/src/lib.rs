//! PostgreSQL search log store
//!
//! Shared durable backend for `SearchLogStore`, suitable when several server
//! processes count into the same database.

pub mod migrations;
pub mod pool;
pub mod postgres_store;

pub use pool::PoolSettings;
pub use postgres_store::PostgresSearchLogStore;
