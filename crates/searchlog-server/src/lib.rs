//! SearchLog HTTP server
//!
//! This crate wires the debounce coordinator to its outer surfaces:
//! - YAML/TOML configuration with environment overrides
//! - Backend selection (memory, SQLite, PostgreSQL, Redis)
//! - The `/search-logs` HTTP routes and client identity derivation

pub mod app;
pub mod backends;
pub mod client_key;
pub mod config;
pub mod error;
pub mod routes;

pub use app::AppState;
pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use routes::router;
