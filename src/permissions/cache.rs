//! Bounded permission result cache
//!
//! Batch eviction, not LRU: once the map grows past the soft cap, arbitrary
//! entries are dropped until it is back down to the prune target. Cache
//! contents never change an answer, only how fast it is computed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Default soft cap on cached entries
pub const DEFAULT_SOFT_CAP: usize = 35;

/// Default size the cache is pruned down to on overflow
pub const DEFAULT_PRUNE_TO: usize = 10;

/// Cache sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prune when an insert finds more than this many entries
    pub soft_cap: usize,
    /// Entry count left after pruning
    pub prune_to: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            soft_cap: DEFAULT_SOFT_CAP,
            prune_to: DEFAULT_PRUNE_TO,
        }
    }
}

/// Cache sizing that would never evict
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cache prune_to ({prune_to}) must be less than soft_cap ({soft_cap})")]
pub struct InvalidCacheConfig {
    pub soft_cap: usize,
    pub prune_to: usize,
}

impl CacheConfig {
    /// Pruning must shrink the cache
    pub fn validate(&self) -> Result<(), InvalidCacheConfig> {
        if self.prune_to >= self.soft_cap {
            return Err(InvalidCacheConfig {
                soft_cap: self.soft_cap,
                prune_to: self.prune_to,
            });
        }
        Ok(())
    }
}

/// Path -> resolved value cache, private to one provider
#[derive(Debug, Default)]
pub struct PermissionCache {
    entries: HashMap<String, bool>,
    config: CacheConfig,
}

impl PermissionCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
        }
    }

    pub fn get(&self, path: &str) -> Option<bool> {
        self.entries.get(path).copied()
    }

    /// Cache a result, pruning first if the cache is over its soft cap
    pub fn insert(&mut self, path: &str, value: bool) {
        if self.entries.len() > self.config.soft_cap {
            self.prune();
        }
        self.entries.insert(path.to_string(), value);
    }

    fn prune(&mut self) {
        // Unvalidated sizing still has to shrink the map
        let target = self.config.prune_to.min(self.config.soft_cap);
        let excess = self.entries.len().saturating_sub(target);
        let victims: Vec<String> = self.entries.keys().take(excess).cloned().collect();
        for key in &victims {
            self.entries.remove(key);
        }
        debug!(
            "Pruned {} cached permissions, {} left",
            victims.len(),
            self.entries.len()
        );
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
