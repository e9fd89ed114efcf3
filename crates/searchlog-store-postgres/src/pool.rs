//! Connection pool sizing for the PostgreSQL store

use std::time::Duration;

use searchlog_core::{Error, Result};
use sqlx::postgres::PgPoolOptions;

/// Pool bounds and timeouts
///
/// `None` for `idle_timeout` or `max_lifetime` keeps connections open
/// indefinitely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
        }
    }
}

impl PoolSettings {
    /// `PgPoolOptions` for these settings
    ///
    /// # Errors
    /// - `Error::Config` if `max_connections` is zero or below `min_connections`
    pub fn pool_options(&self) -> Result<PgPoolOptions> {
        if self.max_connections == 0 {
            return Err(Error::Config(
                "PostgreSQL pool needs at least one connection".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(Error::Config(format!(
                "PostgreSQL pool min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        Ok(PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime))
    }
}
