//! In-process permission store

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{PermissionRow, PermissionStore, StoreError};
use crate::permissions::ProviderKey;

#[derive(Debug)]
struct StoredGrant {
    key: ProviderKey,
    row: PermissionRow,
}

#[derive(Debug, Default)]
struct Inner {
    grants: Vec<StoredGrant>,
    next_id: i64,
    fail_reads: bool,
    failing_keys: HashSet<ProviderKey>,
}

/// Permission store kept in memory, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent loads fail, to exercise recovery paths
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().fail_reads = fail;
    }

    /// Make subsequent loads fail for one provider only
    pub fn set_fail_reads_for(&self, key: &ProviderKey, fail: bool) {
        let mut inner = self.inner.lock();
        if fail {
            inner.failing_keys.insert(key.clone());
        } else {
            inner.failing_keys.remove(key);
        }
    }

    /// Number of stored rows across all owners
    pub fn len(&self) -> usize {
        self.inner.lock().grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn add_permission(
        &self,
        path: &str,
        value: bool,
        key: &ProviderKey,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.lock();

        if let Some(existing) = inner
            .grants
            .iter_mut()
            .find(|g| &g.key == key && g.row.path == path)
        {
            existing.row.value = value;
            return Ok(existing.row.id);
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.grants.push(StoredGrant {
            key: key.clone(),
            row: PermissionRow {
                id,
                path: path.to_string(),
                value,
            },
        });
        Ok(id)
    }

    async fn load_permissions(&self, key: &ProviderKey) -> Result<Vec<PermissionRow>, StoreError> {
        let inner = self.inner.lock();
        if inner.fail_reads || inner.failing_keys.contains(key) {
            return Err(StoreError::Unavailable("simulated read failure".to_string()));
        }

        Ok(inner
            .grants
            .iter()
            .filter(|g| &g.key == key)
            .map(|g| g.row.clone())
            .collect())
    }
}
