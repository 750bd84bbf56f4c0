//! Persistent permission storage
//!
//! Providers persist grants through [`PermissionStore`] and rebuild their
//! trees from it on reload. Rows are keyed by `(owner, owner_kind, world)`.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::permissions::ProviderKey;

/// One persisted grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRow {
    /// Durable row id
    pub id: i64,
    /// Dotted permission path
    pub path: String,
    /// Granted (true) or denied (false)
    pub value: bool,
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Backing store for permission rows
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Persist a grant, returning its row id.
    /// Re-granting an existing path updates the value and keeps the id.
    async fn add_permission(
        &self,
        path: &str,
        value: bool,
        key: &ProviderKey,
    ) -> Result<i64, StoreError>;

    /// All rows for exactly this owner, kind and world, in id order
    async fn load_permissions(&self, key: &ProviderKey) -> Result<Vec<PermissionRow>, StoreError>;
}

/// Load rows for enumeration; a failed read means "no permissions"
pub async fn load_or_empty(store: &dyn PermissionStore, key: &ProviderKey) -> Vec<PermissionRow> {
    match store.load_permissions(key).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to load permissions for {}: {}", key, e);
            Vec::new()
        }
    }
}
