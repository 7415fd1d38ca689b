//! Database migration management.
//!
//! Embeds SQL migrations and provides functions to apply them automatically.
//! Uses `SQLx`'s built-in migration support with compile-time embedding.

use crate::error::{DatabaseError, Result};
use sqlx::{Pool, Sqlite};

/// Run all pending database migrations.
///
/// Applies every migration in the `migrations/` directory that has not been
/// applied yet. `SQLx` tracks applied migrations in a `_sqlx_migrations`
/// table, so repeated calls are no-ops.
///
/// # Errors
/// Returns `DatabaseError::Migration` if any migration fails to execute.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration execution failed: {e}")))?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Get the current schema version.
///
/// Returns the highest applied migration version, or 0 when no migrations
/// have been applied yet.
///
/// # Errors
/// Returns `DatabaseError` if the migrations table cannot be queried.
pub async fn get_schema_version(pool: &Pool<Sqlite>) -> Result<i64> {
    let table_exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
    )
    .fetch_one(pool)
    .await?
        > 0;

    if !table_exists {
        return Ok(0);
    }

    let version =
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(version), 0) FROM _sqlx_migrations")
            .fetch_optional(pool)
            .await?
            .unwrap_or(0);

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::open_pool;

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = open_pool(":memory:").await.expect("open pool");

        run_migrations(&pool).await.expect("run migrations");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name"
        )
        .fetch_all(&pool)
        .await
        .expect("query tables");

        assert_eq!(tables, vec!["data_checks", "organizations", "scheduled_jobs"]);
    }

    #[tokio::test]
    async fn test_get_schema_version() {
        let pool = open_pool(":memory:").await.expect("open pool");

        let version = get_schema_version(&pool).await.expect("get version");
        assert_eq!(version, 0);

        run_migrations(&pool).await.expect("run migrations");

        let version = get_schema_version(&pool).await.expect("get version");
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let pool = open_pool(":memory:").await.expect("open pool");

        run_migrations(&pool).await.expect("first migration run");
        run_migrations(&pool)
            .await
            .expect("second migration run should be idempotent");

        let version = get_schema_version(&pool).await.expect("get version");
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn test_default_jobs_seeded() {
        let pool = open_pool(":memory:").await.expect("open pool");
        run_migrations(&pool).await.expect("run migrations");

        let job_types: Vec<String> =
            sqlx::query_scalar("SELECT job_type FROM scheduled_jobs ORDER BY job_type")
                .fetch_all(&pool)
                .await
                .expect("query jobs");

        assert_eq!(job_types, vec!["CheckDns", "CheckWebsite"]);
    }
}
