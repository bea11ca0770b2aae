// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write-time fan-out of grants across a subtree.

use std::error::Error as StdError;

use thiserror::Error;
use tracing::debug;

use crate::catalog::descendants;
use crate::permission::PermissionSet;
use crate::store::{Grant, GrantBatch, commit_with_retry};
use crate::traits::{
    GrantStore, PrincipalDirectory, PrincipalId, ResourceCatalog, ResourceId,
};

#[derive(Debug, Error)]
pub enum CascadeError<P, R, E>
where
    P: PrincipalId,
    R: ResourceId,
    E: StdError,
{
    #[error("unknown resource {0}")]
    UnknownResource(R),

    #[error("unknown principal {0}")]
    UnknownPrincipal(P),

    /// The persistence boundary rejected the batch. No grant from this cascade was applied.
    #[error("cascade apply failed: {0}")]
    ApplyFailed(#[source] E),
}

/// Applies or revokes a set of permissions across a whole subtree in one call.
///
/// A cascade is a write-time fan-out, not a live link: every grant it places is an ordinary
/// independent direct grant. Revoking the grant at the subtree root afterwards has no effect on
/// the grants placed at its descendants by the same call.
///
/// The full target tuple set is staged before anything is written and committed as a single
/// batch, so a cascade either applies completely or not at all.
pub struct CascadeWriter;

impl CascadeWriter {
    /// Grant every permission in `permissions` to `principal` at `root` and, when
    /// `include_descendants` is set, at every descendant of `root` down to the leaf documents.
    ///
    /// Tuples already present are skipped; the returned count is the number of grants actually
    /// written. Validation happens before any staging, so a failed call mutates nothing.
    pub fn apply_to_subtree<P, R, C, D, S>(
        catalog: &C,
        directory: &D,
        store: &mut S,
        root: R,
        principal: P,
        permissions: &PermissionSet,
        include_descendants: bool,
    ) -> Result<usize, CascadeError<P, R, S::Error>>
    where
        P: PrincipalId,
        R: ResourceId,
        C: ResourceCatalog<R>,
        D: PrincipalDirectory<P>,
        S: GrantStore<P, R>,
    {
        let targets = Self::targets(catalog, directory, root, principal, include_descendants)?;

        let mut batch = GrantBatch::new();
        for target in targets {
            let existing = store.direct(&target, &principal);
            for permission in permissions {
                if !existing.contains(permission) {
                    batch.add(Grant::new(principal, target, *permission));
                }
            }
        }

        if batch.is_empty() {
            debug!(%root, %principal, "cascade is a no-op, all grants already present");
            return Ok(0);
        }

        let count = batch.adds.len();
        commit_with_retry(store, batch).map_err(CascadeError::ApplyFailed)?;
        debug!(%root, %principal, count, include_descendants, "applied cascade");

        Ok(count)
    }

    /// Revoke every permission in `permissions` from `principal` at `root` and, when
    /// `include_descendants` is set, at every descendant.
    ///
    /// Only direct grants are touched; permissions held through inheritance are unaffected.
    /// Returns the number of grants actually removed.
    pub fn revoke_from_subtree<P, R, C, D, S>(
        catalog: &C,
        directory: &D,
        store: &mut S,
        root: R,
        principal: P,
        permissions: &PermissionSet,
        include_descendants: bool,
    ) -> Result<usize, CascadeError<P, R, S::Error>>
    where
        P: PrincipalId,
        R: ResourceId,
        C: ResourceCatalog<R>,
        D: PrincipalDirectory<P>,
        S: GrantStore<P, R>,
    {
        let targets = Self::targets(catalog, directory, root, principal, include_descendants)?;

        let mut batch = GrantBatch::new();
        for target in targets {
            let existing = store.direct(&target, &principal);
            for permission in permissions {
                if existing.contains(permission) {
                    batch.remove(Grant::new(principal, target, *permission));
                }
            }
        }

        if batch.is_empty() {
            debug!(%root, %principal, "cascade revoke is a no-op, no matching direct grants");
            return Ok(0);
        }

        let count = batch.removes.len();
        commit_with_retry(store, batch).map_err(CascadeError::ApplyFailed)?;
        debug!(%root, %principal, count, include_descendants, "applied cascade revoke");

        Ok(count)
    }

    fn targets<P, R, C, D, E>(
        catalog: &C,
        directory: &D,
        root: R,
        principal: P,
        include_descendants: bool,
    ) -> Result<Vec<R>, CascadeError<P, R, E>>
    where
        P: PrincipalId,
        R: ResourceId,
        C: ResourceCatalog<R>,
        D: PrincipalDirectory<P>,
        E: StdError,
    {
        if !catalog.contains(&root) {
            return Err(CascadeError::UnknownResource(root));
        }
        if !directory.contains(&principal) {
            return Err(CascadeError::UnknownPrincipal(principal));
        }

        let mut targets = vec![root];
        if include_descendants {
            targets.extend(descendants(catalog, root));
        }

        Ok(targets)
    }
}
