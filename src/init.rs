//! Database initialization
//!
//! Creates a fresh permission database and applies seed grants, e.g.
//!
//! ```toml
//! [[grant]]
//! kind = "group"
//! owner = "admins"
//! path = "*"
//!
//! [[grant]]
//! kind = "group"
//! owner = "visitors"
//! world = "lobby"
//! path = "canary.world.build"
//! value = false
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use figment::providers::{Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Database;
use crate::permissions::{validate_permission_path, OwnerKind, ProviderKey};
use crate::store::{PermissionStore, SqliteStore};

/// One seed grant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedGrant {
    pub kind: OwnerKind,
    pub owner: String,
    #[serde(default)]
    pub world: Option<String>,
    pub path: String,
    #[serde(default = "default_value")]
    pub value: bool,
}

fn default_value() -> bool {
    true
}

/// Seed file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub grant: Vec<SeedGrant>,
}

impl SeedFile {
    /// Read a seed file; the file must exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Seed file not found: {}", path.display());
        }
        Figment::from(Toml::file(path))
            .extract()
            .with_context(|| format!("Invalid seed file {}", path.display()))
    }

    /// Validate every grant, returning the provider key for each
    fn keys(&self) -> Result<Vec<ProviderKey>> {
        self.grant
            .iter()
            .map(|g| {
                validate_permission_path(&g.path)
                    .with_context(|| format!("Invalid seed path '{}'", g.path))?;
                Ok(ProviderKey::new(g.kind, &g.owner, g.world.as_deref())?)
            })
            .collect()
    }
}

/// Initialize a new permission database
///
/// # Arguments
/// * `path` - Path to the SQLite database file (must not exist)
/// * `seed` - Grants to store in the new database
///
/// # Errors
/// * Database file already exists
/// * A seed grant has an invalid path or owner
/// * Database creation fails
pub async fn init_database(path: &Path, seed: &SeedFile) -> Result<usize> {
    // Fail if database already exists
    if path.exists() {
        bail!(
            "Database file already exists: {}. Remove it first or use a different path.",
            path.display()
        );
    }

    // Validate before touching the filesystem
    let keys = seed.keys()?;

    info!("Creating new database at {}", path.display());
    let db = Database::new(Some(path)).await?;
    let store = SqliteStore::new(db.pool().clone());

    if !keys.is_empty() {
        info!("Storing {} seed grants...", keys.len());
        for (grant, key) in seed.grant.iter().zip(&keys) {
            let id = store.add_permission(&grant.path, grant.value, key).await?;
            info!("  {} {} = {} (id {})", key, grant.path, grant.value, id);
        }
    }

    info!("Database initialization complete");
    Ok(keys.len())
}
