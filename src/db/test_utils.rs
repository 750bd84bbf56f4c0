//! Shared test utilities for database operations
//!
//! Provides test_pool(), an in-memory database with the full schema,
//! so store tests run against the same migrations as production.

use sqlx::SqlitePool;

use super::Database;

/// Create an in-memory test database pool with full schema
pub async fn test_pool() -> SqlitePool {
    let db = Database::new(None)
        .await
        .expect("Failed to create test database");
    db.pool().clone()
}
