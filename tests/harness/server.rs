//! PermTest - registry over an isolated on-disk database
//!
//! Each instance gets its own temp directory, so tests run in parallel
//! without sharing rows. `restart()` drops every loaded provider and
//! reopens the file, the way a fresh process would see it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use permtree::db::Database;
use permtree::permissions::CacheConfig;
use permtree::{PermissionRegistry, SqliteStore};

pub struct PermTest {
    pub registry: PermissionRegistry,
    /// Path to the database file
    pub db_path: PathBuf,
    db: Database,
    cache: CacheConfig,
    /// Cleaned up on drop
    _temp_dir: TempDir,
}

impl PermTest {
    /// Start with the default cache sizing
    pub async fn start() -> Result<Self> {
        Self::start_with_cache(CacheConfig::default()).await
    }

    pub async fn start_with_cache(cache: CacheConfig) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let db_path = temp_dir.path().join("perms.db");

        let db = Database::new(Some(&db_path)).await?;
        let registry = registry_over(&db, cache);

        Ok(Self {
            registry,
            db_path,
            db,
            cache,
            _temp_dir: temp_dir,
        })
    }

    /// Forget all loaded providers and reopen the database file
    pub async fn restart(&mut self) -> Result<()> {
        self.db = Database::open(&self.db_path).await?;
        self.registry = registry_over(&self.db, self.cache);
        Ok(())
    }

    /// Direct pool access for setup and assertions
    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.db.pool()
    }
}

fn registry_over(db: &Database, cache: CacheConfig) -> PermissionRegistry {
    PermissionRegistry::new(Arc::new(SqliteStore::new(db.pool().clone())), cache)
}
