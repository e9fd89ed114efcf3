//! Debounce configuration
//!
//! Built once at startup and handed to the coordinator by value. There is no
//! global or mutable configuration.

use std::time::Duration;

use crate::{Error, Result};

/// Default wait before a submission's persistence decision runs
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_secs(3);

/// Default lifetime of a client's "latest query" cache entry
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Timing configuration for the debounce coordinator
///
/// # Example
/// ```
/// use searchlog_core::DebounceConfig;
/// use std::time::Duration;
///
/// let config = DebounceConfig::new(Duration::from_secs(2), Duration::from_secs(20)).unwrap();
/// assert_eq!(config.debounce_delay(), Duration::from_secs(2));
///
/// assert!(DebounceConfig::new(Duration::ZERO, Duration::from_secs(20)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    debounce_delay: Duration,
    cache_ttl: Duration,
}

impl DebounceConfig {
    /// Create a validated configuration
    ///
    /// # Errors
    /// - `Error::ConfigValidation` if either duration is zero
    pub fn new(debounce_delay: Duration, cache_ttl: Duration) -> Result<Self> {
        if debounce_delay.is_zero() {
            return Err(Error::ConfigValidation(
                "debounce delay must be a positive duration".to_string(),
            ));
        }
        if cache_ttl.is_zero() {
            return Err(Error::ConfigValidation(
                "cache TTL must be a positive duration".to_string(),
            ));
        }

        Ok(Self {
            debounce_delay,
            cache_ttl,
        })
    }

    pub fn debounce_delay(&self) -> Duration {
        self.debounce_delay
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Whether a cache entry can outlive the debounce delay
    ///
    /// When it cannot, every deferred decision finds the entry already expired
    /// and persists its own submission.
    pub fn ttl_covers_delay(&self) -> bool {
        self.cache_ttl > self.debounce_delay
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            debounce_delay: DEFAULT_DEBOUNCE_DELAY,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}
