//! Presence Database Layer
//!
//! Provides `SQLite` access for the check result store. Uses `SQLx` with
//! embedded, versioned migrations.
//!
//! # Architecture
//!
//! - **Migrations**: SQL migrations are embedded and applied automatically
//! - **Idempotent writes**: check verdicts are upserts on `(siret, check_type)`
//! - **Connection pooling**: WAL-mode pool with a small connection limit
//!
//! # Example
//!
//! ```ignore
//! use presence_db::Database;
//!
//! let db = Database::new("presence.db").await?;
//! db.run_migrations().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod connection;
pub mod data_checks;
pub mod error;
pub mod migrations;
pub mod organizations;

pub use data_checks::{CombinedChecks, DataCheck};
pub use error::{DatabaseError, Result};

use sqlx::{Pool, Sqlite};
use std::path::Path;

/// High-level database interface.
///
/// Convenience wrapper around the connection pool that handles
/// initialization and migration.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open the database at the specified path, creating it if missing.
    ///
    /// Pass `:memory:` for an in-memory database.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let pool = connection::open_pool(path).await?;
        Ok(Self { pool })
    }

    /// Run all pending database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get the current schema version (highest applied migration).
    pub async fn get_schema_version(&self) -> Result<i64> {
        migrations::get_schema_version(&self.pool).await
    }

    /// Get a reference to the underlying connection pool.
    ///
    /// Allows direct access to the `SQLx` pool for custom queries.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the database connection gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_creation() {
        let db = Database::new(":memory:").await.expect("create database");

        let version = db.get_schema_version().await.expect("get version");
        assert_eq!(version, 0);
    }

    #[tokio::test]
    async fn test_database_migrations() {
        let db = Database::new(":memory:").await.expect("create database");

        db.run_migrations().await.expect("run migrations");

        let version = db.get_schema_version().await.expect("get version");
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn test_database_close() {
        let db = Database::new(":memory:").await.expect("create database");

        db.close().await; // Should not panic
    }
}
