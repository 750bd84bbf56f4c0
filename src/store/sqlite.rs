//! SQLite-backed permission store

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{PermissionRow, PermissionStore, StoreError};
use crate::permissions::ProviderKey;

/// `world` column value for global-scope rows
const GLOBAL_WORLD: &str = "";

/// Permission store on the `permissions` table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store on a pool whose schema has been migrated
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionStore for SqliteStore {
    async fn add_permission(
        &self,
        path: &str,
        value: bool,
        key: &ProviderKey,
    ) -> Result<i64, StoreError> {
        let granted_at = chrono::Utc::now().to_rfc3339();

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO permissions (path, value, owner, owner_kind, world, granted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (path, owner, owner_kind, world)
            DO UPDATE SET value = excluded.value, granted_at = excluded.granted_at
            RETURNING id
            "#,
        )
        .bind(path)
        .bind(value)
        .bind(key.owner())
        .bind(key.kind().as_str())
        .bind(key.world().unwrap_or(GLOBAL_WORLD))
        .bind(&granted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn load_permissions(&self, key: &ProviderKey) -> Result<Vec<PermissionRow>, StoreError> {
        let rows: Vec<PermissionRecord> = sqlx::query_as(
            r#"
            SELECT id, path, value FROM permissions
            WHERE owner = ? AND owner_kind = ? AND world = ?
            ORDER BY id
            "#,
        )
        .bind(key.owner())
        .bind(key.kind().as_str())
        .bind(key.world().unwrap_or(GLOBAL_WORLD))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_row()).collect())
    }
}

/// Row type for permissions queries
#[derive(sqlx::FromRow)]
struct PermissionRecord {
    id: i64,
    path: String,
    value: bool,
}

impl PermissionRecord {
    fn into_row(self) -> PermissionRow {
        PermissionRow {
            id: self.id,
            path: self.path,
            value: self.value,
        }
    }
}
