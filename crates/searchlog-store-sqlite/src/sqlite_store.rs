//! SQLite-backed `SearchLogStore`

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use searchlog_core::{Error, Result, SearchLogRecord, SearchLogStore, ensure_query_text};
use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
    SqliteSynchronous,
};
use uuid::Uuid;

const SCHEMA_VERSION: i64 = 1;

/// SQLite search log store
///
/// # Example
/// ```no_run
/// # use searchlog_store_sqlite::SqliteSearchLogStore;
/// # use searchlog_core::SearchLogStore;
/// # async fn example() -> searchlog_core::Result<()> {
/// let store = SqliteSearchLogStore::new("data/searchlog.db").await?;
/// let record = store.increment_and_get("pizza").await?;
/// println!("{} searched {} times", record.query_text, record.count);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SqliteSearchLogStore {
    pool: SqlitePool,
}

impl SqliteSearchLogStore {
    /// Open (or create) the database file at `path` and initialize the schema
    ///
    /// The special path `:memory:` opens a private in-memory database.
    ///
    /// # Errors
    /// - `Error::Store` if the file cannot be opened or the schema cannot be
    ///   created
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path == Path::new(":memory:") {
            return Self::in_memory().await;
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Store(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal),
            )
            .await
            .map_err(|e| Error::Store(format!("Failed to open SQLite database: {}", e)))?;

        tracing::info!(path = %path.display(), "Opened SQLite search log store");

        Self::from_pool(pool).await
    }

    /// Private in-memory database on a single shared connection
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| Error::Store(format!("Invalid SQLite options: {}", e)))?;

        // Every connection to :memory: is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| Error::Store(format!("Failed to open in-memory SQLite: {}", e)))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        Self::initialize_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| Error::Store(format!("Failed to create schema_version table: {}", e)))?;

        sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
            .bind(SCHEMA_VERSION)
            .execute(pool)
            .await
            .map_err(|e| Error::Store(format!("Failed to record schema version: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS search_logs (
                id TEXT PRIMARY KEY,
                query_text TEXT NOT NULL UNIQUE,
                count INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(|e| Error::Store(format!("Failed to create search_logs table: {}", e)))?;

        let version: i64 = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(pool)
            .await
            .map_err(|e| Error::Store(format!("Failed to read schema version: {}", e)))?;

        if version != SCHEMA_VERSION {
            return Err(Error::Store(format!(
                "Unsupported schema version: {}",
                version
            )));
        }

        Ok(())
    }

    fn record_from_row(row: &SqliteRow) -> Result<SearchLogRecord> {
        let id: String = row
            .try_get("id")
            .map_err(|e| Error::Store(format!("Failed to read id: {}", e)))?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| Error::Store(format!("Invalid record id {}: {}", id, e)))?;

        Ok(SearchLogRecord {
            id,
            query_text: row
                .try_get("query_text")
                .map_err(|e| Error::Store(format!("Failed to read query_text: {}", e)))?,
            count: row
                .try_get("count")
                .map_err(|e| Error::Store(format!("Failed to read count: {}", e)))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| Error::Store(format!("Failed to read created_at: {}", e)))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| Error::Store(format!("Failed to read updated_at: {}", e)))?,
        })
    }
}

#[async_trait]
impl SearchLogStore for SqliteSearchLogStore {
    async fn increment_and_get(&self, query_text: &str) -> Result<SearchLogRecord> {
        ensure_query_text(query_text)?;

        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO search_logs (id, query_text, count, created_at, updated_at)
            VALUES (?, ?, 1, ?, ?)
            ON CONFLICT(query_text) DO UPDATE SET
                count = search_logs.count + 1,
                updated_at = excluded.updated_at
            RETURNING id, query_text, count, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(query_text)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("Failed to increment search log: {}", e)))?;

        Self::record_from_row(&row)
    }

    async fn get_by_text(&self, query_text: &str) -> Result<Option<SearchLogRecord>> {
        ensure_query_text(query_text)?;

        let row = sqlx::query(
            r#"
            SELECT id, query_text, count, created_at, updated_at
            FROM search_logs
            WHERE query_text = ?
            "#,
        )
        .bind(query_text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("Failed to get search log: {}", e)))?;

        row.as_ref().map(Self::record_from_row).transpose()
    }
}
