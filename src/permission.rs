// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::HashSet;
use std::fmt::Display;

use crate::resource::ResourceType;

/// The closed set of actions a principal can be granted on a resource. Permission types are
/// independent of each other; holding one never implies holding another.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PermissionType {
    /// Permission to view a resource.
    View,

    /// Permission to edit a resource.
    Edit,

    /// Permission to download a resource's content.
    Download,

    /// Permission to delete a resource.
    Delete,

    /// Permission to share a resource with others.
    Share,

    /// Permission to approve a resource, only meaningful on containers.
    Approve,
}

/// An unordered set of permission types held by a principal at one resource.
pub type PermissionSet = HashSet<PermissionType>;

impl PermissionType {
    /// All permission types in the vocabulary.
    pub fn all() -> [PermissionType; 6] {
        [
            PermissionType::View,
            PermissionType::Edit,
            PermissionType::Download,
            PermissionType::Delete,
            PermissionType::Share,
            PermissionType::Approve,
        ]
    }

    /// Return `true` if this permission type is meaningful on the given resource type.
    ///
    /// `Approve` targets review flows on projects and contracts; a single document cannot be
    /// approved on its own.
    pub fn supported_on(&self, resource_type: ResourceType) -> bool {
        match self {
            PermissionType::Approve => !matches!(resource_type, ResourceType::Document),
            _ => true,
        }
    }
}

impl Display for PermissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PermissionType::View => "view",
            PermissionType::Edit => "edit",
            PermissionType::Download => "download",
            PermissionType::Delete => "delete",
            PermissionType::Share => "share",
            PermissionType::Approve => "approve",
        };

        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use crate::resource::ResourceType;

    use super::PermissionType;

    #[test]
    fn approve_is_container_only() {
        assert!(PermissionType::Approve.supported_on(ResourceType::Project));
        assert!(PermissionType::Approve.supported_on(ResourceType::Contract));
        assert!(!PermissionType::Approve.supported_on(ResourceType::Document));
    }

    #[test]
    fn everything_else_is_unrestricted() {
        for permission in PermissionType::all() {
            if permission == PermissionType::Approve {
                continue;
            }
            assert!(permission.supported_on(ResourceType::Document));
        }
    }
}
