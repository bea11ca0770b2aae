// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities.

use std::convert::Infallible;

use thiserror::Error;

use crate::catalog::MemoryCatalog;
use crate::directory::MemoryDirectory;
use crate::manager::PermissionManager;
use crate::permission::PermissionSet;
use crate::resource::Resource;
use crate::store::{Grant, GrantBatch, MemoryGrantStore};
use crate::traits::{GrantIndex, GrantStore, PrincipalId, ResourceId};

impl ResourceId for &'static str {}
impl PrincipalId for char {}

pub type TestCatalog = MemoryCatalog<&'static str>;
pub type TestDirectory = MemoryDirectory<char>;
pub type TestStore = MemoryGrantStore<char, &'static str>;
pub type TestManager =
    PermissionManager<char, &'static str, TestCatalog, TestDirectory, TestStore>;

/// Initialise test logging, reading `RUST_LOG` when set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small project tree:
///
/// ```text
///        P1
///       /  \
///      C1   C2
///     /  \
///    D1   D2
/// ```
pub fn project_tree() -> TestCatalog {
    MemoryCatalog::build(vec![
        Resource::project("P1"),
        Resource::contract("C1", "P1"),
        Resource::document("D1", "C1"),
        Resource::document("D2", "C1"),
        Resource::contract("C2", "P1"),
    ])
    .expect("test tree is valid")
}

/// Principals `u`, `v` and `w`.
pub fn project_team() -> TestDirectory {
    MemoryDirectory::new(['u', 'v', 'w'])
}

pub fn manager() -> TestManager {
    PermissionManager::new(project_tree(), project_team(), MemoryGrantStore::new())
}

#[derive(Debug, Error, PartialEq)]
pub enum TestStoreError {
    #[error("transient i/o failure")]
    Transient,

    #[error("batch rejected by backend")]
    Rejected,
}

/// A grant store whose batch commits can be made to fail, for exercising the retry and
/// atomicity behaviour of cascades.
#[derive(Clone, Debug)]
pub struct FlakyGrantStore {
    inner: TestStore,
    transient_failures: usize,
    reject_commits: bool,
}

impl FlakyGrantStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryGrantStore::new(),
            transient_failures: 0,
            reject_commits: false,
        }
    }

    /// Fail the next `count` batch commits with a transient error.
    pub fn fail_transiently(mut self, count: usize) -> Self {
        self.transient_failures = count;
        self
    }

    /// Reject every batch commit outright.
    pub fn reject_commits(mut self) -> Self {
        self.reject_commits = true;
        self
    }
}

impl Default for FlakyGrantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GrantIndex<char, &'static str> for FlakyGrantStore {
    fn direct(&self, resource: &&'static str, principal: &char) -> PermissionSet {
        self.inner.direct(resource, principal)
    }

    fn grants_for(&self, principal: &char) -> Vec<Grant<char, &'static str>> {
        self.inner.grants_for(principal)
    }

    fn grants_at(&self, resource: &&'static str) -> Vec<Grant<char, &'static str>> {
        self.inner.grants_at(resource)
    }
}

impl GrantStore<char, &'static str> for FlakyGrantStore {
    type Error = TestStoreError;

    fn insert(&mut self, grant: Grant<char, &'static str>) -> Result<bool, Self::Error> {
        Ok(infallible(self.inner.insert(grant)))
    }

    fn remove(&mut self, grant: Grant<char, &'static str>) -> Result<bool, Self::Error> {
        Ok(infallible(self.inner.remove(grant)))
    }

    fn commit_batch(&mut self, batch: GrantBatch<char, &'static str>) -> Result<(), Self::Error> {
        if self.reject_commits {
            return Err(TestStoreError::Rejected);
        }
        if self.transient_failures > 0 {
            self.transient_failures -= 1;
            return Err(TestStoreError::Transient);
        }

        infallible(self.inner.commit_batch(batch));
        Ok(())
    }

    fn is_transient(&self, error: &Self::Error) -> bool {
        *error == TestStoreError::Transient
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
    }
}
