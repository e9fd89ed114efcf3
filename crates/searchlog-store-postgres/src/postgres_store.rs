//! PostgreSQL-backed `SearchLogStore`

use async_trait::async_trait;
use searchlog_core::{Error, Result, SearchLogRecord, SearchLogStore, ensure_query_text};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::migrations;
use crate::pool::PoolSettings;

/// PostgreSQL search log store
#[derive(Clone)]
pub struct PostgresSearchLogStore {
    pool: PgPool,
}

impl PostgresSearchLogStore {
    /// Connect with the default pool settings and run migrations
    ///
    /// # Errors
    /// - `Error::Store` if connection or migration fails
    pub async fn new(database_url: &str) -> Result<Self> {
        Self::connect(database_url, &PoolSettings::default()).await
    }

    /// Connect with explicit pool settings and run migrations
    ///
    /// # Example
    /// ```no_run
    /// # use searchlog_store_postgres::{PoolSettings, PostgresSearchLogStore};
    /// # async fn example() -> searchlog_core::Result<()> {
    /// let settings = PoolSettings {
    ///     max_connections: 30,
    ///     ..PoolSettings::default()
    /// };
    /// let store = PostgresSearchLogStore::connect("postgres://localhost/searchlog", &settings).await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// - `Error::Config` if the pool bounds are inconsistent
    /// - `Error::Store` if connection or migration fails
    pub async fn connect(database_url: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = settings
            .pool_options()?
            .connect(database_url)
            .await
            .map_err(|e| Error::Store(format!("Failed to connect to PostgreSQL: {}", e)))?;

        migrations::run_migrations(&pool).await?;
        tracing::info!("Connected PostgreSQL search log store");

        Ok(Self { pool })
    }

    /// Wrap an existing pool; migrations are not run
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn record_from_row(row: &PgRow) -> Result<SearchLogRecord> {
        let read = |e: sqlx::Error| Error::Store(format!("Failed to decode search log: {}", e));

        Ok(SearchLogRecord {
            id: row.try_get("id").map_err(read)?,
            query_text: row.try_get("query_text").map_err(read)?,
            count: row.try_get("count").map_err(read)?,
            created_at: row.try_get("created_at").map_err(read)?,
            updated_at: row.try_get("updated_at").map_err(read)?,
        })
    }
}

#[async_trait]
impl SearchLogStore for PostgresSearchLogStore {
    async fn increment_and_get(&self, query_text: &str) -> Result<SearchLogRecord> {
        ensure_query_text(query_text)?;

        let row = sqlx::query(
            r#"
            INSERT INTO search_logs (id, query_text, count, created_at, updated_at)
            VALUES ($1, $2, 1, NOW(), NOW())
            ON CONFLICT (query_text) DO UPDATE SET
                count = search_logs.count + 1,
                updated_at = NOW()
            RETURNING id, query_text, count, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(query_text)
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
            WHERE query_text = $1
            "#,
        )
        .bind(query_text)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("Failed to get search log: {}", e)))?;

        row.as_ref().map(Self::record_from_row).transpose()
    }
}
