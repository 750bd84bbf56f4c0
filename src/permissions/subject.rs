//! Subject resolution across player and group providers
//!
//! A player's own grants come first. When the player's providers have no
//! entry for a path, the player's groups are consulted in order (the
//! player's group, then its ancestors); the first provider with an entry
//! decides. Nothing anywhere denies.

use uuid::Uuid;

use super::key::ProviderKey;
use super::registry::PermissionRegistry;
use crate::store::StoreError;

impl PermissionRegistry {
    /// Check a path for a player, falling back to the player's group chain
    pub async fn check_player(
        &self,
        player: Uuid,
        world: Option<&str>,
        groups: &[String],
        path: &str,
    ) -> Result<bool, StoreError> {
        let chain: Vec<ProviderKey> = std::iter::once(ProviderKey::player(player, world))
            .chain(groups.iter().map(|g| ProviderKey::group(g, world)))
            .collect();
        self.check_chain(&chain, path).await
    }

    /// Check a path for a group, falling back to its ancestors
    pub async fn check_group(
        &self,
        group: &str,
        world: Option<&str>,
        ancestors: &[String],
        path: &str,
    ) -> Result<bool, StoreError> {
        let chain: Vec<ProviderKey> = std::iter::once(group)
            .chain(ancestors.iter().map(String::as_str))
            .map(|g| ProviderKey::group(g, world))
            .collect();
        self.check_chain(&chain, path).await
    }

    /// First provider in the chain with an entry for the path decides
    async fn check_chain(&self, chain: &[ProviderKey], path: &str) -> Result<bool, StoreError> {
        if path.trim().is_empty() {
            return Ok(true);
        }
        for key in chain {
            self.load(key).await?;
        }

        let providers = self.providers.read().await;
        for key in chain {
            let Some(provider) = providers.get(key) else {
                continue;
            };
            if provider.path_exists(path, &*providers) {
                return Ok(provider.query_permission(path, &*providers));
            }
        }
        Ok(false)
    }
}
