// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named permission bundles, stamped into grants at apply time.

use std::collections::HashMap;
use std::error::Error as StdError;

use thiserror::Error;
use tracing::debug;

use crate::permission::{PermissionSet, PermissionType};
use crate::resource::ResourceType;
use crate::store::{Grant, GrantBatch, commit_with_retry};
use crate::traits::{
    GrantStore, PrincipalDirectory, PrincipalId, ResourceCatalog, ResourceId,
};

/// A named bundle of permission types.
///
/// Templates are copied into grants when applied; editing or deleting a template afterwards
/// never affects grants already created from it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PermissionTemplate {
    pub id: String,
    pub name: String,
    pub permissions: PermissionSet,
}

impl PermissionTemplate {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = PermissionType>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions: permissions.into_iter().collect(),
        }
    }
}

/// Registry of known templates, keyed by template id.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, PermissionTemplate>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Insert a template, replacing any previous template with the same id.
    pub fn insert(&mut self, template: PermissionTemplate) -> Option<PermissionTemplate> {
        self.templates.insert(template.id.clone(), template)
    }

    pub fn get(&self, id: &str) -> Option<&PermissionTemplate> {
        self.templates.get(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<PermissionTemplate> {
        self.templates.remove(id)
    }
}

#[derive(Debug, Error)]
pub enum TemplateError<P, R, E>
where
    P: PrincipalId,
    R: ResourceId,
    E: StdError,
{
    #[error("unknown template {0}")]
    UnknownTemplate(String),

    #[error("unknown resource {0}")]
    UnknownResource(R),

    #[error("unknown principal {0}")]
    UnknownPrincipal(P),

    #[error("permission {permission} is not supported on {resource_type} resources")]
    UnsupportedPermission {
        permission: PermissionType,
        resource_type: ResourceType,
    },

    #[error("template apply failed: {0}")]
    ApplyFailed(#[source] E),
}

/// Expands a template into direct grants for many principals at once.
pub struct TemplateApplier;

impl TemplateApplier {
    /// Grant every permission in the template to every given principal at `resource`.
    ///
    /// Produces up to `principals × permissions` grants, fewer when some already existed. The
    /// expansion does not cascade to descendants; callers wanting both compose this with
    /// [`CascadeWriter`](crate::cascade::CascadeWriter).
    ///
    /// All validation, including the compatibility of every permission type with the target
    /// resource's type, happens before any grant is staged.
    pub fn apply<P, R, C, D, S>(
        registry: &TemplateRegistry,
        catalog: &C,
        directory: &D,
        store: &mut S,
        template_id: &str,
        principals: &[P],
        resource: R,
    ) -> Result<usize, TemplateError<P, R, S::Error>>
    where
        P: PrincipalId,
        R: ResourceId,
        C: ResourceCatalog<R>,
        D: PrincipalDirectory<P>,
        S: GrantStore<P, R>,
    {
        let template = registry
            .get(template_id)
            .ok_or_else(|| TemplateError::UnknownTemplate(template_id.to_string()))?;
        let target = catalog
            .resource(&resource)
            .ok_or(TemplateError::UnknownResource(resource))?;

        for principal in principals {
            if !directory.contains(principal) {
                return Err(TemplateError::UnknownPrincipal(*principal));
            }
        }
        for permission in &template.permissions {
            if !permission.supported_on(target.resource_type) {
                return Err(TemplateError::UnsupportedPermission {
                    permission: *permission,
                    resource_type: target.resource_type,
                });
            }
        }

        let mut batch = GrantBatch::new();
        for principal in principals {
            let existing = store.direct(&resource, principal);
            for permission in &template.permissions {
                if !existing.contains(permission) {
                    batch.add(Grant::new(*principal, resource, *permission));
                }
            }
        }

        if batch.is_empty() {
            debug!(template_id, %resource, "template apply is a no-op");
            return Ok(0);
        }

        let count = batch.adds.len();
        commit_with_retry(store, batch).map_err(TemplateError::ApplyFailed)?;
        debug!(template_id, %resource, count, "applied template");

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::permission::PermissionType;
    use crate::resource::ResourceType;
    use crate::store::MemoryGrantStore;
    use crate::test_utils::{project_team, project_tree};
    use crate::traits::GrantIndex;

    use super::{PermissionTemplate, TemplateApplier, TemplateError, TemplateRegistry};

    fn reviewer_registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry.insert(PermissionTemplate::new(
            "reviewer",
            "Reviewer",
            [PermissionType::View, PermissionType::Download],
        ));
        registry.insert(PermissionTemplate::new(
            "approver",
            "Approver",
            [PermissionType::View, PermissionType::Approve],
        ));
        registry
    }

    #[test]
    fn fans_out_per_principal_and_permission() {
        let registry = reviewer_registry();
        let catalog = project_tree();
        let directory = project_team();
        let mut store = MemoryGrantStore::new();

        let count = TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "reviewer",
            &['u', 'v'],
            "C1",
        )
        .unwrap();

        // 2 principals x 2 permission types.
        assert_eq!(count, 4);
        assert_eq!(store.direct(&"C1", &'u').len(), 2);
        assert_eq!(store.direct(&"C1", &'v').len(), 2);
        // No cascade: the documents under C1 got nothing.
        assert!(store.direct(&"D1", &'u').is_empty());
    }

    #[test]
    fn pre_existing_grants_reduce_the_count() {
        let registry = reviewer_registry();
        let catalog = project_tree();
        let directory = project_team();
        let mut store = MemoryGrantStore::new();

        let first = TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "reviewer",
            &['u'],
            "C1",
        )
        .unwrap();
        assert_eq!(first, 2);

        // Applying again changes nothing; grants form a set.
        let second = TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "reviewer",
            &['u', 'v'],
            "C1",
        )
        .unwrap();
        assert_eq!(second, 2);
        assert_eq!(store.direct(&"C1", &'u').len(), 2);
    }

    #[test]
    fn rejects_unknown_template_and_ids() {
        let registry = reviewer_registry();
        let catalog = project_tree();
        let directory = project_team();
        let mut store = MemoryGrantStore::new();

        let err = TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "owner",
            &['u'],
            "C1",
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownTemplate(id) if id == "owner"));

        let err = TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "reviewer",
            &['u'],
            "C9",
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownResource("C9")));

        let err = TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "reviewer",
            &['u', 'z'],
            "C1",
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPrincipal('z')));

        // Validation happens before any mutation.
        assert!(store.grants_at(&"C1").is_empty());
    }

    #[test]
    fn rejects_approval_bundle_on_a_document() {
        let registry = reviewer_registry();
        let catalog = project_tree();
        let directory = project_team();
        let mut store = MemoryGrantStore::new();

        let err = TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "approver",
            &['u'],
            "D1",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UnsupportedPermission {
                permission: PermissionType::Approve,
                resource_type: ResourceType::Document,
            }
        ));
        assert!(store.grants_at(&"D1").is_empty());

        // The same bundle is fine one level up.
        TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "approver",
            &['u'],
            "C1",
        )
        .unwrap();
        assert_eq!(store.direct(&"C1", &'u').len(), 2);
    }

    #[test]
    fn later_template_edits_do_not_touch_existing_grants() {
        let mut registry = reviewer_registry();
        let catalog = project_tree();
        let directory = project_team();
        let mut store = MemoryGrantStore::new();

        TemplateApplier::apply(
            &registry,
            &catalog,
            &directory,
            &mut store,
            "reviewer",
            &['u'],
            "C1",
        )
        .unwrap();

        registry.remove("reviewer");

        assert_eq!(store.direct(&"C1", &'u').len(), 2);
    }
}
