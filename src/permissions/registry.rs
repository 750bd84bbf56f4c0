//! Provider registry
//!
//! Holds every loaded provider behind one read-write lock: queries share
//! the read side, grants and reloads take the write side. Loading a
//! world-scoped provider always loads its global parent first, so parent
//! delegation never finds a gap.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::cache::CacheConfig;
use super::key::ProviderKey;
use super::provider::PermissionProvider;
use crate::store::{self, PermissionRow, PermissionStore, StoreError};

pub(crate) type ProviderMap = HashMap<ProviderKey, PermissionProvider>;

/// Registry of loaded permission providers over one store
pub struct PermissionRegistry {
    pub(crate) providers: RwLock<ProviderMap>,
    store: Arc<dyn PermissionStore>,
    cache_config: CacheConfig,
}

impl std::fmt::Debug for PermissionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionRegistry")
            .field("cache_config", &self.cache_config)
            .finish()
    }
}

impl PermissionRegistry {
    /// Create an empty registry; providers load lazily on first use
    pub fn new(store: Arc<dyn PermissionStore>, cache_config: CacheConfig) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            store,
            cache_config,
        }
    }

    /// Create a shared instance
    pub fn shared(store: Arc<dyn PermissionStore>, cache_config: CacheConfig) -> Arc<Self> {
        Arc::new(Self::new(store, cache_config))
    }

    /// The backing store
    pub fn store(&self) -> Arc<dyn PermissionStore> {
        self.store.clone()
    }

    /// Build a provider and fill it from the store
    async fn fetch(&self, key: &ProviderKey) -> Result<PermissionProvider, StoreError> {
        let mut provider = PermissionProvider::new(key.clone(), self.cache_config);
        provider.reload(self.store.as_ref()).await?;
        debug!(
            "Loaded permission provider {} ({} roots)",
            key,
            provider.permission_map().len()
        );
        Ok(provider)
    }

    /// Get a provider from the locked map, loading it (and its parent) if absent
    async fn provider_mut<'a>(
        &self,
        providers: &'a mut ProviderMap,
        key: &ProviderKey,
    ) -> Result<&'a mut PermissionProvider, StoreError> {
        if let Some(parent) = key.parent() {
            if !providers.contains_key(&parent) {
                let provider = self.fetch(&parent).await?;
                providers.insert(parent, provider);
            }
        }

        match providers.entry(key.clone()) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => {
                let provider = self.fetch(key).await?;
                Ok(slot.insert(provider))
            }
        }
    }

    /// Ensure a provider and its parent are loaded. Idempotent.
    pub async fn load(&self, key: &ProviderKey) -> Result<(), StoreError> {
        {
            let providers = self.providers.read().await;
            let parent_loaded = key.parent().map_or(true, |p| providers.contains_key(&p));
            if parent_loaded && providers.contains_key(key) {
                return Ok(());
            }
        }

        let mut providers = self.providers.write().await;
        self.provider_mut(&mut providers, key).await?;
        Ok(())
    }

    /// Check a permission for a provider, delegating to its parent as needed
    pub async fn query_permission(&self, key: &ProviderKey, path: &str) -> Result<bool, StoreError> {
        if path.trim().is_empty() {
            return Ok(true);
        }
        self.load(key).await?;

        let providers = self.providers.read().await;
        Ok(providers
            .get(key)
            .is_some_and(|p| p.query_permission(path, &*providers)))
    }

    /// Whether the provider or its parent has an entry covering the path
    pub async fn path_exists(&self, key: &ProviderKey, path: &str) -> Result<bool, StoreError> {
        if path.trim().is_empty() {
            return Ok(true);
        }
        self.load(key).await?;

        let providers = self.providers.read().await;
        Ok(providers
            .get(key)
            .is_some_and(|p| p.path_exists(path, &*providers)))
    }

    /// Persist a grant for a provider and apply it to the loaded tree
    pub async fn add_permission(
        &self,
        key: &ProviderKey,
        path: &str,
        value: bool,
    ) -> Result<i64, StoreError> {
        let mut providers = self.providers.write().await;
        let provider = self.provider_mut(&mut providers, key).await?;
        provider.add_permission(path, value, self.store.as_ref()).await
    }

    /// Rebuild one provider from the store. Its parent is left alone.
    pub async fn reload(&self, key: &ProviderKey) -> Result<(), StoreError> {
        let mut providers = self.providers.write().await;
        match providers.get_mut(key) {
            Some(provider) => provider.reload(self.store.as_ref()).await,
            None => self.provider_mut(&mut providers, key).await.map(|_| ()),
        }
    }

    /// Rebuild every loaded provider from the store.
    /// A provider that fails to reload keeps its tree; the first error is returned
    /// after all providers have been tried.
    pub async fn reload_all(&self) -> Result<(), StoreError> {
        let mut providers = self.providers.write().await;
        let mut first_error = None;
        let mut failed = 0;
        for (key, provider) in providers.iter_mut() {
            if let Err(e) = provider.reload(self.store.as_ref()).await {
                warn!("Failed to reload permissions for {}: {}", key, e);
                failed += 1;
                first_error.get_or_insert(e);
            }
        }
        info!(
            "Reloaded {} permission providers ({} failed)",
            providers.len() - failed,
            failed
        );
        first_error.map_or(Ok(()), Err)
    }

    /// Drop a loaded provider, returning whether it was loaded.
    /// It is loaded again from the store on next use.
    pub async fn unload(&self, key: &ProviderKey) -> bool {
        let removed = self.providers.write().await.remove(key).is_some();
        if removed {
            debug!("Unloaded permission provider {}", key);
        }
        removed
    }

    /// Clear one provider's result cache, if it is loaded
    pub async fn flush_cache(&self, key: &ProviderKey) {
        if let Some(provider) = self.providers.read().await.get(key) {
            provider.flush_cache();
        }
    }

    /// Full dotted path of every node in the provider's tree
    pub async fn permissions_as_string_list(
        &self,
        key: &ProviderKey,
    ) -> Result<Vec<String>, StoreError> {
        self.load(key).await?;
        let providers = self.providers.read().await;
        Ok(providers
            .get(key)
            .map(|p| p.permissions_as_string_list())
            .unwrap_or_default())
    }

    /// Rows persisted for a provider; empty when the store cannot be read
    pub async fn stored_permissions(&self, key: &ProviderKey) -> Vec<PermissionRow> {
        store::load_or_empty(self.store.as_ref(), key).await
    }

    /// Number of loaded providers
    pub async fn loaded_count(&self) -> usize {
        self.providers.read().await.len()
    }
}
