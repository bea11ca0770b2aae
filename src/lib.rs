// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resource-scoped permission grants over a containment hierarchy.
//!
//! Resources (projects, contracts, documents) form a tree. Principals hold direct grants at
//! individual resources; under [`ResolutionMode::Inherit`] a grant placed on an ancestor also
//! applies to every resource beneath it. Resolution is a pure, read-time computation: nothing is
//! materialised or invalidated, the effective set is recomputed on demand from the current grant
//! set and tree snapshot.
//!
//! Mutations go the other way. [`CascadeWriter`] fans a set of permissions out across a whole
//! subtree as independent direct grants in one atomic batch, and [`TemplateApplier`] stamps a
//! named permission bundle out for many principals at once. Both validate before staging and
//! stage before committing, so a failed call never leaves a subtree half-written.
//!
//! The containment tree and the principal directory are supplied externally through the
//! read-only [`ResourceCatalog`](traits::ResourceCatalog) and
//! [`PrincipalDirectory`](traits::PrincipalDirectory) traits; grants are persisted through the
//! [`GrantStore`](traits::GrantStore) trait, which requires an atomic batch-commit primitive.
//! In-memory implementations of all three are provided.

pub mod cascade;
pub mod catalog;
mod directory;
mod manager;
mod permission;
mod resource;
pub mod resolver;
pub mod store;
pub mod template;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
pub mod traits;

pub use cascade::{CascadeError, CascadeWriter};
pub use catalog::{CatalogError, MemoryCatalog, descendants};
pub use directory::MemoryDirectory;
pub use manager::{AclError, PermissionManager};
pub use permission::{PermissionSet, PermissionType};
pub use resolver::{
    ResolutionMode, ResolveError, ancestor_chain, effective, inherited, is_revocable,
};
pub use resource::{Resource, ResourceType};
pub use store::{Grant, GrantBatch, MAX_COMMIT_ATTEMPTS, MemoryGrantStore};
pub use template::{PermissionTemplate, TemplateApplier, TemplateError, TemplateRegistry};
