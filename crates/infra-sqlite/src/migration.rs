// Migration Runner

use crate::error::map_sqlx_error;
use jobharvest_core::port::StoreError;
use sqlx::SqlitePool;
use tracing::info;

/// Create the schema if it is missing
///
/// Safe to run on every start: each step is skipped once recorded in
/// `schema_version`.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), StoreError> {
    info!("Running database migrations...");

    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    let current_version: i64 = if table_exists > 0 {
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(map_sqlx_error)?
            .unwrap_or(0)
    } else {
        0
    };

    info!("Current schema version: {}", current_version);

    if current_version < 1 {
        info!("Applying migration 001: Initial schema");
        apply_migration(pool, include_str!("../migrations/001_initial_schema.sql")).await?;
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Apply a single migration SQL file in one transaction
///
/// The file goes to SQLite as one script, so comments and string literals
/// are parsed by SQLite itself.
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<(), StoreError> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::raw_sql(sql)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    tx.commit().await.map_err(map_sqlx_error)?;
    Ok(())
}
