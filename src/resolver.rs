// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure permission resolution over a catalog and grant snapshot.
//!
//! Nothing in this module mutates state. Every function recomputes its answer from the current
//! grant set and containment tree, so results are deterministic for a given snapshot and safe to
//! cache or recompute at will.

use thiserror::Error;

use crate::permission::{PermissionSet, PermissionType};
use crate::traits::{GrantIndex, PrincipalId, ResourceCatalog, ResourceId};

/// Whether ancestor grants contribute to effective permissions.
///
/// A call-time parameter, never a stored property: the same snapshot can be resolved under
/// either mode without touching any state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolutionMode {
    /// Union direct grants with grants held on any ancestor resource.
    Inherit,

    /// Consider direct grants only.
    ExplicitOnly,
}

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError<R>
where
    R: ResourceId,
{
    #[error("unknown resource {0}")]
    UnknownResource(R),
}

/// The chain of ancestors of the given resource, root-first, excluding the resource itself.
///
/// Cost is linear in the depth of the tree. The root resource has an empty chain.
pub fn ancestor_chain<R, C>(catalog: &C, resource: R) -> Result<Vec<R>, ResolveError<R>>
where
    R: ResourceId,
    C: ResourceCatalog<R>,
{
    let mut current = catalog
        .resource(&resource)
        .ok_or(ResolveError::UnknownResource(resource))?;

    let mut chain = Vec::new();
    while let Some(parent) = current.parent {
        chain.push(parent);
        current = catalog
            .resource(&parent)
            .ok_or(ResolveError::UnknownResource(parent))?;
    }

    chain.reverse();
    Ok(chain)
}

/// The permissions the given principal holds at this resource through its ancestors.
///
/// Under `ExplicitOnly` this is the empty set, unconditionally. Under `Inherit` it is the union
/// of the direct grants on every ancestor. Either way the root resource inherits nothing.
pub fn inherited<P, R, C, I>(
    catalog: &C,
    index: &I,
    resource: R,
    principal: P,
    mode: ResolutionMode,
) -> Result<PermissionSet, ResolveError<R>>
where
    P: PrincipalId,
    R: ResourceId,
    C: ResourceCatalog<R>,
    I: GrantIndex<P, R>,
{
    if mode == ResolutionMode::ExplicitOnly {
        if !catalog.contains(&resource) {
            return Err(ResolveError::UnknownResource(resource));
        }
        return Ok(PermissionSet::new());
    }

    let mut permissions = PermissionSet::new();
    for ancestor in ancestor_chain(catalog, resource)? {
        permissions.extend(index.direct(&ancestor, &principal));
    }

    Ok(permissions)
}

/// The union of direct and (mode-dependent) inherited permissions for a resource/principal
/// pair.
pub fn effective<P, R, C, I>(
    catalog: &C,
    index: &I,
    resource: R,
    principal: P,
    mode: ResolutionMode,
) -> Result<PermissionSet, ResolveError<R>>
where
    P: PrincipalId,
    R: ResourceId,
    C: ResourceCatalog<R>,
    I: GrantIndex<P, R>,
{
    let mut permissions = inherited(catalog, index, resource, principal, mode)?;
    permissions.extend(index.direct(&resource, &principal));

    Ok(permissions)
}

/// Whether the given permission can be individually revoked at this resource.
///
/// Returns `false` exactly when the permission is held through inheritance alone: removing a
/// non-existent direct grant would leave the inherited permission fully in force while appearing
/// revoked, so such a permission must be revoked at whichever ancestor grants it.
pub fn is_revocable<P, R, C, I>(
    catalog: &C,
    index: &I,
    resource: R,
    principal: P,
    permission: PermissionType,
    mode: ResolutionMode,
) -> Result<bool, ResolveError<R>>
where
    P: PrincipalId,
    R: ResourceId,
    C: ResourceCatalog<R>,
    I: GrantIndex<P, R>,
{
    if index.direct(&resource, &principal).contains(&permission) {
        return Ok(true);
    }

    let inherited = inherited(catalog, index, resource, principal, mode)?;
    Ok(!inherited.contains(&permission))
}
