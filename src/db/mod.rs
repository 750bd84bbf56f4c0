//! Database module - SQLite storage for permission rows

use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

#[cfg(test)]
pub mod test_utils;

/// Database handle wrapping SQLite connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection, creating the file if needed.
    /// If path is None, uses in-memory database (for testing)
    pub async fn new(path: Option<&Path>) -> Result<Self> {
        let options = match path {
            Some(p) => SqliteConnectOptions::new().filename(p),
            None => SqliteConnectOptions::from_str("sqlite::memory:")?,
        }
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true);

        // Each in-memory connection is its own database
        let max_connections = if path.is_some() { 10 } else { 1 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Open an existing database file
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Database file not found: {}", path.display());
        }
        Self::new(Some(path)).await
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        // One row per granted path; world '' is global scope
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS permissions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL,
                value INTEGER NOT NULL,
                owner TEXT NOT NULL,
                owner_kind TEXT NOT NULL CHECK (owner_kind IN ('player', 'group')),
                world TEXT NOT NULL DEFAULT '',
                granted_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(path, owner, owner_kind, world)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_permissions_owner ON permissions(owner, owner_kind, world)",
        )
        .execute(&self.pool)
        .await?;

        info!("Database migrations complete");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
