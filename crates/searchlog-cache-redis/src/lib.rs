//! Redis client query cache
//!
//! Shared backend for `ClientQueryCache`, so the latest-query state is visible
//! to every server process that handles the same clients.

pub mod cache;
pub mod config;
pub mod connection;

pub use cache::RedisQueryCache;
pub use config::RedisCacheConfig;
pub use connection::RedisConnection;
