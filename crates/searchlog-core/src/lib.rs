//! SearchLog Core Types and Traits
//!
//! This crate provides the pieces every SearchLog deployment shares:
//! - Query normalization and the value types stored by the backends
//! - The `ClientQueryCache` and `SearchLogStore` backend traits
//! - The debounce coordinator that decides which submissions get counted
//! - Core error types

pub mod cache;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod decision;
pub mod error;
pub mod normalize;
pub mod observer;
pub mod store;
pub mod types;

pub use cache::ClientQueryCache;
pub use clock::{Clock, MonotonicClock, SystemClock};
pub use config::DebounceConfig;
pub use coordinator::DebounceCoordinator;
pub use decision::Decision;
pub use error::{Error, Result};
pub use normalize::normalize_query;
pub use observer::{DecisionObserver, DecisionOutcome};
pub use store::{SearchLogStore, ensure_query_text};
pub use types::{ClientQueryEntry, SearchLogRecord};
