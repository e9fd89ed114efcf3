//! Versioned schema migrations for the PostgreSQL store
//!
//! Applied versions are recorded in `searchlog_schema_migrations`, so each
//! migration runs exactly once and in order.

use searchlog_core::{Error, Result};
use sqlx::PgPool;
use tracing::{debug, info};

/// A single schema migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique version number (sequential)
    pub version: i32,
    pub description: &'static str,
    pub up_sql: &'static str,
}

/// All migrations in order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Create search_logs table",
        up_sql: r#"
            CREATE TABLE IF NOT EXISTS search_logs (
                id UUID PRIMARY KEY,
                query_text TEXT NOT NULL,
                count BIGINT NOT NULL DEFAULT 1 CHECK (count >= 1),
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#,
    },
    Migration {
        version: 2,
        description: "Create unique query_text index",
        up_sql: r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_search_logs_query_text
            ON search_logs(query_text)
        "#,
    },
    Migration {
        version: 3,
        description: "Create count index",
        up_sql: r#"
            CREATE INDEX IF NOT EXISTS idx_search_logs_count
            ON search_logs(count DESC)
        "#,
    },
];

/// Run all pending migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS searchlog_schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| Error::Store(format!("Failed to create migrations table: {}", e)))?;

    let applied_versions: Vec<i32> =
        sqlx::query_scalar("SELECT version FROM searchlog_schema_migrations")
            .fetch_all(pool)
            .await
            .map_err(|e| Error::Store(format!("Failed to fetch applied migrations: {}", e)))?;

    debug!(applied = ?applied_versions, "Loaded applied migrations");

    for migration in MIGRATIONS {
        if applied_versions.contains(&migration.version) {
            continue;
        }

        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| Error::Store(format!("Failed to begin migration: {}", e)))?;

        sqlx::raw_sql(migration.up_sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Store(format!(
                    "Failed to apply migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query(
            "INSERT INTO searchlog_schema_migrations (version, description) VALUES ($1, $2)
                ON CONFLICT (version) DO NOTHING",
        )
        .bind(migration.version)
        .bind(migration.description)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            Error::Store(format!(
                "Failed to record migration {}: {}",
                migration.version, e
            ))
        })?;

        tx.commit().await.map_err(|e| {
            Error::Store(format!(
                "Failed to commit migration {}: {}",
                migration.version, e
            ))
        })?;
    }

    Ok(())
}
