// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory containment hierarchy with build-time invariant checks.

use std::collections::HashMap;

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;
use thiserror::Error;

use crate::resource::{Resource, ResourceType};
use crate::traits::{ResourceCatalog, ResourceId};

/// Violations of the containment hierarchy invariants, detected when a catalog is built.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError<R>
where
    R: ResourceId,
{
    #[error("resource {0} appears more than once")]
    DuplicateResource(R),

    #[error("resource {child} references missing parent {parent}")]
    MissingParent { child: R, parent: R },

    #[error("no root resource found")]
    NoRoot,

    #[error("both {0} and {1} claim to be the root")]
    MultipleRoots(R, R),

    #[error("root resource {0} is not a project")]
    RootNotProject(R),

    #[error("document {parent} cannot contain {child}")]
    DocumentParent { child: R, parent: R },

    #[error("resource {0} is part of a parent cycle")]
    CycleDetected(R),
}

/// A validated, immutable snapshot of one containment tree.
///
/// Built from a flat resource listing as supplied by the external catalog boundary. Parent
/// lookups go through the id map; child traversal goes through a directed graph of containment
/// edges so subtree walks stay linear in subtree size.
#[derive(Clone, Debug)]
pub struct MemoryCatalog<R>
where
    R: ResourceId,
{
    resources: HashMap<R, Resource<R>>,
    tree: DiGraphMap<R, ()>,
    root: R,
}

impl<R> MemoryCatalog<R>
where
    R: ResourceId,
{
    /// Build a catalog from a flat listing, validating every tree invariant.
    ///
    /// Exactly one resource must be the root (no parent) and it must be a project; every parent
    /// reference must resolve; documents are leaves; the parent chain must be acyclic.
    pub fn build(listing: Vec<Resource<R>>) -> Result<Self, CatalogError<R>> {
        let mut resources: HashMap<R, Resource<R>> = HashMap::with_capacity(listing.len());
        let mut order = Vec::with_capacity(listing.len());
        let mut root = None;

        for resource in listing {
            let id = resource.id;
            if resource.is_root() {
                match root {
                    None => root = Some(id),
                    Some(existing) => {
                        return Err(CatalogError::MultipleRoots(existing, id));
                    }
                }
            }
            order.push(id);
            if resources.insert(id, resource).is_some() {
                return Err(CatalogError::DuplicateResource(id));
            }
        }

        let root = root.ok_or(CatalogError::NoRoot)?;
        let root_resource = &resources[&root];
        if root_resource.resource_type != ResourceType::Project {
            return Err(CatalogError::RootNotProject(root));
        }

        // Containment edges are added in listing order so child traversal is stable.
        let mut tree = DiGraphMap::new();
        tree.add_node(root);

        for id in &order {
            let resource = &resources[id];
            let Some(parent) = resource.parent else {
                continue;
            };
            let parent_resource =
                resources
                    .get(&parent)
                    .ok_or(CatalogError::MissingParent {
                        child: resource.id,
                        parent,
                    })?;
            if parent_resource.resource_type == ResourceType::Document {
                return Err(CatalogError::DocumentParent {
                    child: resource.id,
                    parent,
                });
            }
            tree.add_edge(parent, resource.id, ());
        }

        // Every resource has a resolvable parent at this point, so any node unreachable from the
        // root sits on a parent cycle.
        let mut reachable = 0;
        let mut dfs = Dfs::new(&tree, root);
        while dfs.next(&tree).is_some() {
            reachable += 1;
        }
        if reachable != resources.len() {
            let orphan = order
                .iter()
                .find(|id| !dfs.discovered.contains(*id))
                .copied()
                .ok_or(CatalogError::NoRoot)?;
            return Err(CatalogError::CycleDetected(orphan));
        }

        Ok(Self {
            resources,
            tree,
            root,
        })
    }

    /// Number of resources in the tree.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl<R> ResourceCatalog<R> for MemoryCatalog<R>
where
    R: ResourceId,
{
    fn contains(&self, id: &R) -> bool {
        self.resources.contains_key(id)
    }

    fn resource(&self, id: &R) -> Option<&Resource<R>> {
        self.resources.get(id)
    }

    fn children(&self, id: &R) -> Vec<R> {
        if !self.tree.contains_node(*id) {
            return Vec::new();
        }
        self.tree.neighbors(*id).collect()
    }

    fn root(&self) -> R {
        self.root
    }
}

/// Every descendant of the given resource in pre-order, excluding the resource itself.
///
/// Works over any catalog implementation via its `children` accessor.
pub fn descendants<R, C>(catalog: &C, id: R) -> Vec<R>
where
    R: ResourceId,
    C: ResourceCatalog<R>,
{
    let mut stack = catalog.children(&id);
    stack.reverse();

    let mut collected = Vec::new();
    while let Some(next) = stack.pop() {
        collected.push(next);
        let mut children = catalog.children(&next);
        children.reverse();
        stack.append(&mut children);
    }

    collected
}
