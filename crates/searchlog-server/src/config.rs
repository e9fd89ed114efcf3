//! Server configuration
//!
//! Loaded from a YAML (default) or TOML file, then overridden by environment
//! variables. Every field has a default, so an empty file or no file at all
//! is a valid configuration.

use searchlog_core::DebounceConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

impl FromStr for CacheBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "redis" => Ok(CacheBackend::Redis),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
    Postgres,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "sqlite" => Ok(StoreBackend::Sqlite),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub debounce: DebounceSettings,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceSettings {
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,

    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_connection_timeout_seconds")]
    pub connection_timeout_seconds: u64,

    /// Expiry sweep period for the memory backend; 0 disables the sweeper
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    #[serde(default)]
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    #[serde(default = "default_database_url")]
    pub connection_string: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,

    /// 0 keeps idle connections open
    #[serde(default = "default_idle_timeout_seconds")]
    pub idle_timeout_seconds: u64,

    /// 0 never recycles connections by age
    #[serde(default = "default_max_lifetime_seconds")]
    pub max_lifetime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of human-readable text
    #[serde(default = "default_false")]
    pub json: bool,

    #[serde(default = "default_false")]
    pub log_sql_queries: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            debounce: DebounceSettings::default(),
            cache: CacheConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            delay_seconds: default_delay_seconds(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: default_redis_url(),
            key_prefix: default_key_prefix(),
            connection_timeout_seconds: default_connection_timeout_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_path: default_sqlite_path(),
            postgres: PostgresConfig::default(),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            connection_string: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_seconds: default_acquire_timeout_seconds(),
            idle_timeout_seconds: default_idle_timeout_seconds(),
            max_lifetime_seconds: default_max_lifetime_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            log_sql_queries: false,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml::from_str(&contents)?
        } else {
            // Default to YAML
            serde_yaml::from_str(&contents)?
        };

        Ok(config)
    }

    /// Merge process environment variables into config (env vars take precedence)
    pub fn merge_env(&mut self) -> Result<(), ConfigError> {
        self.merge_env_from(|var| std::env::var(var).ok())
    }

    /// Merge overrides from `lookup`, which maps a variable name to its value
    ///
    /// Unparsable values are errors rather than being ignored.
    pub fn merge_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("SEARCHLOG_HOST") {
            self.host = val;
        }
        if let Some(val) = lookup("SEARCHLOG_PORT") {
            self.port = parse_env("SEARCHLOG_PORT", &val)?;
        }
        if let Some(val) = lookup("SEARCHLOG_LOG_LEVEL") {
            self.logging.level = val;
        }

        // Debounce timing
        if let Some(val) = lookup("LOG_SEARCH_DEBOUNCE_DELAY_SECONDS") {
            self.debounce.delay_seconds = parse_env("LOG_SEARCH_DEBOUNCE_DELAY_SECONDS", &val)?;
        }
        if let Some(val) = lookup("DEFAULT_CACHE_TTL_SECONDS") {
            self.debounce.cache_ttl_seconds = parse_env("DEFAULT_CACHE_TTL_SECONDS", &val)?;
        }

        // Backends
        if let Some(val) = lookup("SEARCHLOG_CACHE_BACKEND") {
            self.cache.backend = parse_env("SEARCHLOG_CACHE_BACKEND", &val)?;
        }
        if let Some(val) = lookup("REDIS_URL") {
            self.cache.redis_url = val;
        }
        if let Some(val) = lookup("SEARCHLOG_STORE_BACKEND") {
            self.store.backend = parse_env("SEARCHLOG_STORE_BACKEND", &val)?;
        }
        if let Some(val) = lookup("SEARCHLOG_SQLITE_PATH") {
            self.store.sqlite_path = val;
        }
        if let Some(val) = lookup("DATABASE_URL") {
            self.store.postgres.connection_string = val;
        }

        Ok(())
    }

    /// Validated debounce timing
    pub fn debounce_config(&self) -> Result<DebounceConfig, ConfigError> {
        DebounceConfig::new(
            Duration::from_secs(self.debounce.delay_seconds),
            Duration::from_secs(self.debounce.cache_ttl_seconds),
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Check every value that cannot be rejected while parsing
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.debounce_config()?;

        if self.store.backend == StoreBackend::Sqlite && self.store.sqlite_path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "store.sqlite_path cannot be empty".to_string(),
            ));
        }

        let pg = &self.store.postgres;
        if self.store.backend == StoreBackend::Postgres && pg.min_connections > pg.max_connections
        {
            return Err(ConfigError::Invalid(format!(
                "store.postgres.min_connections ({}) exceeds max_connections ({})",
                pg.min_connections, pg.max_connections
            )));
        }

        Ok(())
    }
}

fn parse_env<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_delay_seconds() -> u64 {
    3
}

fn default_cache_ttl_seconds() -> u64 {
    30
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    "searchlog:client:".to_string()
}

fn default_connection_timeout_seconds() -> u64 {
    5
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

fn default_sqlite_path() -> String {
    "./data/searchlog.db".to_string()
}

fn default_database_url() -> String {
    "postgres://localhost/searchlog".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout_seconds() -> u64 {
    5
}

fn default_idle_timeout_seconds() -> u64 {
    600
}

fn default_max_lifetime_seconds() -> u64 {
    1800
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_false() -> bool {
    false
}
