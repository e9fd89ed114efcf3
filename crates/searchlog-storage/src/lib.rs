//! SearchLog in-memory backends
//!
//! This crate provides process-local implementations of the backend traits:
//! - Client query cache (TTL with lazy expiry and an optional sweeper)
//! - Search log store (per-text counters)

pub mod cache;
pub mod store;

pub use cache::MemoryQueryCache;
pub use store::MemorySearchLogStore;
