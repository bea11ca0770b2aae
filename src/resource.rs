// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;

use crate::traits::ResourceId;

/// Kinds of nodes in the containment hierarchy.
///
/// Projects contain contracts, contracts contain documents. Documents are always leaves.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceType {
    Project,
    Contract,
    Document,
}

impl Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResourceType::Project => "project",
            ResourceType::Contract => "contract",
            ResourceType::Document => "document",
        };

        write!(f, "{}", s)
    }
}

/// A node in the containment hierarchy.
///
/// Resources are created and owned by external collaborators; this crate only reads them. The
/// root of a tree is the single resource with no parent.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resource<R> {
    pub id: R,
    pub resource_type: ResourceType,
    pub parent: Option<R>,
}

impl<R> Resource<R>
where
    R: ResourceId,
{
    /// A root project resource.
    pub fn project(id: R) -> Self {
        Self {
            id,
            resource_type: ResourceType::Project,
            parent: None,
        }
    }

    /// A contract resource contained in the given parent.
    pub fn contract(id: R, parent: R) -> Self {
        Self {
            id,
            resource_type: ResourceType::Contract,
            parent: Some(parent),
        }
    }

    /// A document resource contained in the given parent.
    pub fn document(id: R, parent: R) -> Self {
        Self {
            id,
            resource_type: ResourceType::Document,
            parent: Some(parent),
        }
    }

    /// Resource is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
