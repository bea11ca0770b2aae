// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grant value types and the in-memory grant store.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use crate::permission::{PermissionSet, PermissionType};
use crate::traits::{GrantIndex, GrantStore, PrincipalId, ResourceId};

/// How often a batch commit is attempted before a transient store failure is surfaced.
pub const MAX_COMMIT_ATTEMPTS: usize = 3;

/// A direct permission: one `(principal, resource, permission)` tuple.
///
/// Grants form a set. There is no ordering, no duplicate and no count; granting the same tuple
/// twice is indistinguishable from granting it once.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Grant<P, R> {
    pub principal: P,
    pub resource: R,
    pub permission: PermissionType,
}

impl<P, R> Grant<P, R> {
    pub fn new(principal: P, resource: R, permission: PermissionType) -> Self {
        Self {
            principal,
            resource,
            permission,
        }
    }
}

/// A staged set of grant mutations, committed as one atomic unit.
///
/// Batches are built fully before anything is written. A cascade aborted mid-staging therefore
/// leaves the store exactly as it was.
#[derive(Clone, Debug, Default)]
pub struct GrantBatch<P, R> {
    pub adds: Vec<Grant<P, R>>,
    pub removes: Vec<Grant<P, R>>,
}

impl<P, R> GrantBatch<P, R> {
    pub fn new() -> Self {
        Self {
            adds: Vec::new(),
            removes: Vec::new(),
        }
    }

    pub fn add(&mut self, grant: Grant<P, R>) {
        self.adds.push(grant);
    }

    pub fn remove(&mut self, grant: Grant<P, R>) {
        self.removes.push(grant);
    }

    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.removes.is_empty()
    }
}

/// Commit a batch, retrying a bounded number of times on transient store failures.
///
/// Validation and rejection errors are surfaced immediately.
pub(crate) fn commit_with_retry<P, R, S>(
    store: &mut S,
    batch: GrantBatch<P, R>,
) -> Result<(), S::Error>
where
    P: PrincipalId,
    R: ResourceId,
    S: GrantStore<P, R>,
{
    let mut attempt = 1;
    loop {
        match store.commit_batch(batch.clone()) {
            Ok(()) => return Ok(()),
            Err(error) if attempt < MAX_COMMIT_ATTEMPTS && store.is_transient(&error) => {
                warn!(attempt, "transient store failure during batch commit: {error}");
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct InnerGrantStore<P, R> {
    // (principal, resource) to permission set, for O(1) direct lookup.
    index: HashMap<(P, R), PermissionSet>,
}

/// An in-memory grant store.
///
/// Supports usage in multi-threaded contexts by wrapping the inner index with an `RwLock` and
/// `Arc`. Batch commits apply under a single write lock and are therefore atomic by
/// construction.
#[derive(Clone, Debug)]
pub struct MemoryGrantStore<P, R> {
    inner: Arc<RwLock<InnerGrantStore<P, R>>>,
}

impl<P, R> MemoryGrantStore<P, R>
where
    P: PrincipalId,
    R: ResourceId,
{
    /// Create a new in-memory store with no grants.
    pub fn new() -> Self {
        let inner = InnerGrantStore {
            index: HashMap::new(),
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }

    fn read_store(&self) -> RwLockReadGuard<'_, InnerGrantStore<P, R>> {
        self.inner
            .read()
            .expect("acquire shared read access on store")
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, InnerGrantStore<P, R>> {
        self.inner
            .write()
            .expect("acquire exclusive write access on store")
    }
}

impl<P, R> Default for MemoryGrantStore<P, R>
where
    P: PrincipalId,
    R: ResourceId,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, R> GrantIndex<P, R> for MemoryGrantStore<P, R>
where
    P: PrincipalId,
    R: ResourceId,
{
    fn direct(&self, resource: &R, principal: &P) -> PermissionSet {
        self.read_store()
            .index
            .get(&(*principal, *resource))
            .cloned()
            .unwrap_or_default()
    }

    fn grants_for(&self, principal: &P) -> Vec<Grant<P, R>> {
        self.read_store()
            .index
            .iter()
            .filter(|((p, _), _)| p == principal)
            .flat_map(|((p, r), permissions)| {
                permissions
                    .iter()
                    .map(|permission| Grant::new(*p, *r, *permission))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn grants_at(&self, resource: &R) -> Vec<Grant<P, R>> {
        self.read_store()
            .index
            .iter()
            .filter(|((_, r), _)| r == resource)
            .flat_map(|((p, r), permissions)| {
                permissions
                    .iter()
                    .map(|permission| Grant::new(*p, *r, *permission))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl<P, R> GrantStore<P, R> for MemoryGrantStore<P, R>
where
    P: PrincipalId,
    R: ResourceId,
{
    type Error = Infallible;

    fn insert(&mut self, grant: Grant<P, R>) -> Result<bool, Self::Error> {
        let mut store = self.write_store();
        let inserted = store
            .index
            .entry((grant.principal, grant.resource))
            .or_default()
            .insert(grant.permission);

        Ok(inserted)
    }

    fn remove(&mut self, grant: Grant<P, R>) -> Result<bool, Self::Error> {
        let mut store = self.write_store();
        let key = (grant.principal, grant.resource);
        let Some(permissions) = store.index.get_mut(&key) else {
            return Ok(false);
        };

        let removed = permissions.remove(&grant.permission);
        if permissions.is_empty() {
            store.index.remove(&key);
        }

        Ok(removed)
    }

    fn commit_batch(&mut self, batch: GrantBatch<P, R>) -> Result<(), Self::Error> {
        let mut store = self.write_store();

        for grant in &batch.removes {
            let key = (grant.principal, grant.resource);
            if let Some(permissions) = store.index.get_mut(&key) {
                permissions.remove(&grant.permission);
                if permissions.is_empty() {
                    store.index.remove(&key);
                }
            }
        }

        for grant in &batch.adds {
            store
                .index
                .entry((grant.principal, grant.resource))
                .or_default()
                .insert(grant.permission);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::permission::PermissionType;
    use crate::traits::{GrantIndex, GrantStore};

    use super::{Grant, GrantBatch, MemoryGrantStore};

    #[test]
    fn insert_is_idempotent() {
        let mut store = MemoryGrantStore::new();
        let grant = Grant::new('u', "P1", PermissionType::View);

        assert!(store.insert(grant).unwrap());
        assert!(!store.insert(grant).unwrap());

        let direct = store.direct(&"P1", &'u');
        assert_eq!(direct.len(), 1);
        assert!(direct.contains(&PermissionType::View));
    }

    #[test]
    fn remove_of_absent_grant_is_a_no_op() {
        let mut store = MemoryGrantStore::new();
        let grant = Grant::new('u', "P1", PermissionType::View);

        assert!(!store.remove(grant).unwrap());

        store.insert(grant).unwrap();
        assert!(store.remove(grant).unwrap());
        assert!(!store.remove(grant).unwrap());
        assert!(store.direct(&"P1", &'u').is_empty());
    }

    #[test]
    fn batch_applies_removes_before_adds() {
        let mut store = MemoryGrantStore::new();
        store
            .insert(Grant::new('u', "P1", PermissionType::View))
            .unwrap();

        let mut batch = GrantBatch::new();
        batch.remove(Grant::new('u', "P1", PermissionType::View));
        batch.add(Grant::new('u', "P1", PermissionType::Edit));
        batch.add(Grant::new('u', "C1", PermissionType::Edit));
        store.commit_batch(batch).unwrap();

        assert!(!store.direct(&"P1", &'u').contains(&PermissionType::View));
        assert!(store.direct(&"P1", &'u').contains(&PermissionType::Edit));
        assert!(store.direct(&"C1", &'u').contains(&PermissionType::Edit));
    }

    #[test]
    fn grants_for_and_at_enumerate_the_set() {
        let mut store = MemoryGrantStore::new();
        store
            .insert(Grant::new('u', "P1", PermissionType::View))
            .unwrap();
        store
            .insert(Grant::new('u', "C1", PermissionType::Edit))
            .unwrap();
        store
            .insert(Grant::new('v', "P1", PermissionType::Share))
            .unwrap();

        assert_eq!(store.grants_for(&'u').len(), 2);
        assert_eq!(store.grants_for(&'w').len(), 0);
        assert_eq!(store.grants_at(&"P1").len(), 2);
        assert_eq!(store.grants_at(&"D1").len(), 0);
    }
}
