//! Permission provider: one owner's tree, cache and parent link
//!
//! A world-scoped provider delegates to the same owner's global provider
//! whenever its own tree has nothing covering the queried path. The parent
//! is held as a key and resolved through a [`ProviderLookup`] per query.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use super::cache::{CacheConfig, PermissionCache};
use super::key::ProviderKey;
use super::node::PermissionNode;
use super::path::split_segments;
use super::resolver;
use crate::store::{self, PermissionRow, PermissionStore, StoreError};

/// Resolves provider keys to loaded providers, for parent delegation
pub trait ProviderLookup {
    fn provider(&self, key: &ProviderKey) -> Option<&PermissionProvider>;
}

impl ProviderLookup for HashMap<ProviderKey, PermissionProvider> {
    fn provider(&self, key: &ProviderKey) -> Option<&PermissionProvider> {
        self.get(key)
    }
}

/// Permission tree plus result cache for one owner in one scope
#[derive(Debug)]
pub struct PermissionProvider {
    key: ProviderKey,
    parent: Option<ProviderKey>,
    permissions: Vec<PermissionNode>,
    cache: Mutex<PermissionCache>,
}

impl PermissionProvider {
    /// Create an empty provider. World-scoped keys get the global key as parent.
    pub fn new(key: ProviderKey, cache: CacheConfig) -> Self {
        Self {
            parent: key.parent(),
            key,
            permissions: Vec::new(),
            cache: Mutex::new(PermissionCache::new(cache)),
        }
    }

    pub fn key(&self) -> &ProviderKey {
        &self.key
    }

    pub fn owner(&self) -> &str {
        self.key.owner()
    }

    pub fn is_player_provider(&self) -> bool {
        self.key.is_player()
    }

    pub fn world(&self) -> Option<&str> {
        self.key.world()
    }

    pub fn parent(&self) -> Option<&ProviderKey> {
        self.parent.as_ref()
    }

    /// Check a permission path.
    ///
    /// Blank paths are always granted. Paths the local tree does not cover are
    /// answered entirely by the parent, if one is loaded, and are not cached
    /// here. Everything else resolves locally, denying when nothing matches.
    pub fn query_permission<L>(&self, path: &str, lookup: &L) -> bool
    where
        L: ProviderLookup + ?Sized,
    {
        if path.trim().is_empty() {
            return true;
        }
        if let Some(cached) = self.cache.lock().get(path) {
            return cached;
        }

        let segments = split_segments(path);
        if !resolver::has_path(&self.permissions, &segments) {
            if let Some(parent) = self.parent.as_ref().and_then(|k| lookup.provider(k)) {
                debug!("{} has no entry for {}, asking {}", self.key, path, parent.key());
                return parent.query_permission(path, lookup);
            }
        }

        let result = resolver::resolve_path(&self.permissions, &segments);
        self.cache.lock().insert(path, result);
        result
    }

    /// Whether the path is blank, covered locally, or covered up the parent chain
    pub fn path_exists<L>(&self, path: &str, lookup: &L) -> bool
    where
        L: ProviderLookup + ?Sized,
    {
        if path.trim().is_empty() || resolver::has_path(&self.permissions, &split_segments(path)) {
            return true;
        }
        self.parent
            .as_ref()
            .and_then(|k| lookup.provider(k))
            .is_some_and(|parent| parent.path_exists(path, lookup))
    }

    /// Grant or deny a path: persist it, insert it into the tree, flush the cache.
    /// Returns the store id of the row.
    pub async fn add_permission(
        &mut self,
        path: &str,
        value: bool,
        store: &dyn PermissionStore,
    ) -> Result<i64, StoreError> {
        let id = store.add_permission(path, value, &self.key).await?;
        self.insert_loaded(path, value, id);
        self.flush_cache();
        debug!("{} set {} = {} (id {})", self.key, path, value, id);
        Ok(id)
    }

    /// Insert a path that already has a store id, without persisting
    pub fn insert_loaded(&mut self, path: &str, value: bool, id: i64) {
        let node = resolver::add_path(&mut self.permissions, &split_segments(path), value);
        node.set_id(id);
    }

    /// Rebuild the tree from the store and clear the cache.
    /// On a failed read the current tree is kept.
    pub async fn reload(&mut self, store: &dyn PermissionStore) -> Result<(), StoreError> {
        let rows = store.load_permissions(&self.key).await?;

        self.permissions.clear();
        self.flush_cache();
        for row in &rows {
            self.insert_loaded(&row.path, row.value, row.id);
        }
        debug!("Loaded {} permission rows for {}", rows.len(), self.key);
        Ok(())
    }

    pub fn flush_cache(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached results
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }

    /// Root nodes of the tree
    pub fn permission_map(&self) -> &[PermissionNode] {
        &self.permissions
    }

    /// Every node in the tree, pre-order
    pub fn all_nodes(&self) -> Vec<&PermissionNode> {
        let mut acc = Vec::new();
        for root in &self.permissions {
            root.get_child_nodes(&mut acc);
        }
        acc
    }

    /// Full dotted path of every node in the tree, pre-order
    pub fn permissions_as_string_list(&self) -> Vec<String> {
        self.entries().into_iter().map(|(path, _)| path).collect()
    }

    /// Full dotted path and value of every node in the tree, pre-order
    pub fn entries(&self) -> Vec<(String, bool)> {
        resolver::collect_entries(&self.permissions)
    }

    /// Rows as persisted in the store; empty if they cannot be read
    pub async fn stored_permissions(&self, store: &dyn PermissionStore) -> Vec<PermissionRow> {
        store::load_or_empty(store, &self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::cache::{DEFAULT_PRUNE_TO, DEFAULT_SOFT_CAP};
    use crate::store::MemoryStore;

    fn no_parents() -> HashMap<ProviderKey, PermissionProvider> {
        HashMap::new()
    }

    fn group(world: Option<&str>) -> PermissionProvider {
        PermissionProvider::new(ProviderKey::group("players", world), CacheConfig::default())
    }

    #[test]
    fn test_blank_paths_grant() {
        let provider = group(None);
        assert!(provider.query_permission("", &no_parents()));
        assert!(provider.query_permission(" ", &no_parents()));
        assert!(provider.query_permission("\t", &no_parents()));
        assert!(provider.path_exists("", &no_parents()));
    }

    #[test]
    fn test_empty_tree_denies() {
        let provider = group(None);
        assert!(!provider.query_permission("canary.command.help", &no_parents()));
        assert!(!provider.path_exists("canary.command.help", &no_parents()));
    }

    #[tokio::test]
    async fn test_add_then_query() {
        let store = MemoryStore::new();
        let mut provider = group(None);

        provider.add_permission("canary.command.help", true, &store).await.unwrap();
        assert!(provider.query_permission("canary.command.help", &no_parents()));

        provider.add_permission("canary.command.help", false, &store).await.unwrap();
        assert!(!provider.query_permission("canary.command.help", &no_parents()));
    }

    #[tokio::test]
    async fn test_add_assigns_store_id() {
        let store = MemoryStore::new();
        let mut provider = group(None);

        let id = provider.add_permission("canary.a.b", true, &store).await.unwrap();
        let nodes = provider.all_nodes();
        let leaf = nodes.iter().find(|n| n.name() == "b").unwrap();
        assert_eq!(leaf.id(), Some(id));
    }

    #[tokio::test]
    async fn test_add_flushes_cache() {
        let store = MemoryStore::new();
        let mut provider = group(None);

        provider.add_permission("canary.*", true, &store).await.unwrap();
        assert!(provider.query_permission("canary.command.foo", &no_parents()));
        assert_eq!(provider.cached_count(), 1);

        provider.add_permission("canary.command.foo", false, &store).await.unwrap();
        assert_eq!(provider.cached_count(), 0);
        assert!(!provider.query_permission("canary.command.foo", &no_parents()));
        assert!(provider.query_permission("canary.command.bar", &no_parents()));
    }

    #[tokio::test]
    async fn test_cache_eviction_keeps_answers() {
        let store = MemoryStore::new();
        let mut provider = group(None);
        provider.add_permission("canary.*", true, &store).await.unwrap();
        provider.add_permission("canary.deny", false, &store).await.unwrap();

        for i in 0..=DEFAULT_SOFT_CAP {
            provider.query_permission(&format!("canary.p{}", i), &no_parents());
        }
        assert_eq!(provider.cached_count(), DEFAULT_SOFT_CAP + 1);

        assert!(!provider.query_permission("canary.deny", &no_parents()));
        assert_eq!(provider.cached_count(), DEFAULT_PRUNE_TO + 1);

        for i in 0..=DEFAULT_SOFT_CAP {
            assert!(provider.query_permission(&format!("canary.p{}", i), &no_parents()));
        }
        assert!(!provider.query_permission("canary.deny", &no_parents()));
    }

    #[tokio::test]
    async fn test_world_provider_delegates_to_parent() {
        let store = MemoryStore::new();
        let mut global = group(None);
        global.add_permission("canary.build", true, &store).await.unwrap();

        let mut world = group(Some("nether"));
        assert_eq!(world.parent(), Some(global.key()));
        world.add_permission("canary.fly", false, &store).await.unwrap();

        let mut lookup = HashMap::new();
        lookup.insert(global.key().clone(), global);

        assert!(world.query_permission("canary.build", &lookup));
        assert!(!world.query_permission("canary.fly", &lookup));
        assert!(!world.query_permission("canary.swim", &lookup));

        // Delegated answers are not cached under the world scope
        assert_eq!(world.cached_count(), 1);
        assert!(world.path_exists("canary.build", &lookup));
        assert!(!world.path_exists("canary.swim", &lookup));
    }

    #[tokio::test]
    async fn test_local_wildcard_shadows_parent() {
        let store = MemoryStore::new();
        let mut global = group(None);
        global.add_permission("canary.command.kill", true, &store).await.unwrap();

        let mut world = group(Some("creative"));
        world.add_permission("canary.*", false, &store).await.unwrap();

        let mut lookup = HashMap::new();
        lookup.insert(global.key().clone(), global);

        assert!(!world.query_permission("canary.command.kill", &lookup));
    }

    #[tokio::test]
    async fn test_unloaded_parent_resolves_locally() {
        let store = MemoryStore::new();
        let mut world = group(Some("nether"));
        world.add_permission("canary.fly", true, &store).await.unwrap();

        assert!(world.query_permission("canary.fly", &no_parents()));
        assert!(!world.query_permission("canary.build", &no_parents()));
    }

    #[tokio::test]
    async fn test_reload_rebuilds_from_store() {
        let store = MemoryStore::new();
        let key = ProviderKey::group("players", None);
        store.add_permission("canary.a", true, &key).await.unwrap();
        store.add_permission("canary.b", false, &key).await.unwrap();

        let mut provider = group(None);
        provider.insert_loaded("stale.path", true, 99);
        provider.reload(&store).await.unwrap();

        assert_eq!(
            provider.permissions_as_string_list(),
            vec!["canary", "canary.a", "canary.b"]
        );
        assert!(provider.query_permission("canary.a", &no_parents()));
        assert!(!provider.query_permission("canary.b", &no_parents()));
        assert!(!provider.query_permission("stale.path", &no_parents()));
    }

    #[tokio::test]
    async fn test_reload_failure_keeps_tree() {
        let store = MemoryStore::new();
        let mut provider = group(None);
        provider.add_permission("canary.a", true, &store).await.unwrap();

        store.set_fail_reads(true);
        assert!(provider.reload(&store).await.is_err());
        assert!(provider.query_permission("canary.a", &no_parents()));
    }

    #[tokio::test]
    async fn test_stored_permissions_recovers_from_read_failure() {
        let store = MemoryStore::new();
        let mut provider = group(None);
        provider.add_permission("canary.a", true, &store).await.unwrap();

        assert_eq!(provider.stored_permissions(&store).await.len(), 1);

        store.set_fail_reads(true);
        assert!(provider.stored_permissions(&store).await.is_empty());
    }
}
