// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::resource::Resource;
use crate::traits::ResourceId;

/// Read-only view onto the containment hierarchy.
///
/// The catalog is supplied externally (project, contract and document listings live elsewhere in
/// the application); the resolution core never creates, renames or deletes a resource.
pub trait ResourceCatalog<R>
where
    R: ResourceId,
{
    /// Return `true` if the given resource exists in the catalog.
    fn contains(&self, id: &R) -> bool;

    /// Get a resource by id.
    fn resource(&self, id: &R) -> Option<&Resource<R>>;

    /// Direct children of the given resource, in stable order.
    fn children(&self, id: &R) -> Vec<R>;

    /// The root resource of the tree.
    fn root(&self) -> R;
}
