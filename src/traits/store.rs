// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error;

use crate::permission::PermissionSet;
use crate::store::{Grant, GrantBatch};
use crate::traits::{PrincipalId, ResourceId};

/// Read-only queries over the current grant set.
///
/// Read and write interfaces are kept strictly separate so resolution stays a pure computation
/// over a snapshot while mutations go through the transactional write interface below.
pub trait GrantIndex<P, R>
where
    P: PrincipalId,
    R: ResourceId,
{
    /// The permissions granted exactly at this resource for this principal, excluding anything
    /// inherited from ancestors. Unknown pairs yield the empty set.
    fn direct(&self, resource: &R, principal: &P) -> PermissionSet;

    /// All grants held by the given principal, across every resource.
    fn grants_for(&self, principal: &P) -> Vec<Grant<P, R>>;

    /// All grants placed at the given resource, across every principal.
    fn grants_at(&self, resource: &R) -> Vec<Grant<P, R>>;
}

/// Write interface over the grant set.
///
/// Implementations must make `commit_batch` atomic: either every tuple in the batch is applied
/// or none are. A plain key/value store without a batch primitive is not a valid backend.
pub trait GrantStore<P, R>: GrantIndex<P, R>
where
    P: PrincipalId,
    R: ResourceId,
{
    type Error: Error;

    /// Insert a single grant.
    ///
    /// Idempotent. Returns `true` when the insert occurred, or `false` when the grant already
    /// existed and state is unchanged.
    fn insert(&mut self, grant: Grant<P, R>) -> Result<bool, Self::Error>;

    /// Remove a single grant.
    ///
    /// Idempotent. Returns `true` when the removal occurred, or `false` when no such grant was
    /// present.
    fn remove(&mut self, grant: Grant<P, R>) -> Result<bool, Self::Error>;

    /// Apply a staged batch of adds and removes as one atomic unit.
    fn commit_batch(&mut self, batch: GrantBatch<P, R>) -> Result<(), Self::Error>;

    /// Return `true` if the given error is a transient I/O failure worth retrying. Validation
    /// and rejection errors must report `false` so callers fail fast.
    fn is_transient(&self, _error: &Self::Error) -> bool {
        false
    }
}
