//! SearchLog Observability
//!
//! This crate provides observability features:
//! - Metrics collection (Prometheus), including decision outcomes
//! - Health endpoints with backend readiness checks

pub mod health;
pub mod metrics;

pub use health::{BackendReadiness, HealthState, ReadinessChecker, health_router};
pub use metrics::Metrics;
