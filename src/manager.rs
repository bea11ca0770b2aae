// SPDX-License-Identifier: MIT OR Apache-2.0

use std::error::Error as StdError;
use std::marker::PhantomData;

use thiserror::Error;
use tracing::debug;

use crate::cascade::{CascadeError, CascadeWriter};
use crate::permission::{PermissionSet, PermissionType};
use crate::resolver::{self, ResolutionMode, ResolveError};
use crate::store::{Grant, GrantBatch, commit_with_retry};
use crate::template::{PermissionTemplate, TemplateApplier, TemplateError, TemplateRegistry};
use crate::traits::{
    GrantStore, PrincipalDirectory, PrincipalId, ResourceCatalog, ResourceId,
};

/// Union of everything a permission mutation or resolution call can fail with.
#[derive(Debug, Error)]
pub enum AclError<P, R, E>
where
    P: PrincipalId,
    R: ResourceId,
    E: StdError,
{
    #[error("unknown resource {0}")]
    UnknownResource(R),

    #[error("unknown principal {0}")]
    UnknownPrincipal(P),

    #[error(transparent)]
    Resolve(#[from] ResolveError<R>),

    #[error(transparent)]
    Cascade(#[from] CascadeError<P, R, E>),

    #[error(transparent)]
    Template(#[from] TemplateError<P, R, E>),

    #[error("store error: {0}")]
    Store(#[source] E),

    #[error("purge failed: {0}")]
    PurgeFailed(#[source] E),
}

/// Composition seam over catalog, directory, grant store and template registry.
///
/// Callers that already hold the individual components can use the free functions in
/// [`resolver`](crate::resolver) and the associated functions on
/// [`CascadeWriter`](crate::cascade::CascadeWriter) and
/// [`TemplateApplier`](crate::template::TemplateApplier) directly; the manager adds id
/// validation in front of single-grant mutations and threads the components through for
/// everything else.
#[derive(Clone, Debug)]
pub struct PermissionManager<P, R, C, D, S> {
    catalog: C,
    directory: D,
    store: S,
    templates: TemplateRegistry,
    _marker: PhantomData<(P, R)>,
}

impl<P, R, C, D, S> PermissionManager<P, R, C, D, S>
where
    P: PrincipalId,
    R: ResourceId,
    C: ResourceCatalog<R>,
    D: PrincipalDirectory<P>,
    S: GrantStore<P, R>,
{
    pub fn new(catalog: C, directory: D, store: S) -> Self {
        Self {
            catalog,
            directory,
            store,
            templates: TemplateRegistry::new(),
            _marker: PhantomData,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a template, replacing any previous one with the same id. Grants already stamped
    /// out from the replaced template are unaffected.
    pub fn register_template(&mut self, template: PermissionTemplate) -> Option<PermissionTemplate> {
        self.templates.insert(template)
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    fn ensure_known(&self, principal: P, resource: R) -> Result<(), AclError<P, R, S::Error>> {
        if !self.catalog.contains(&resource) {
            return Err(AclError::UnknownResource(resource));
        }
        if !self.directory.contains(&principal) {
            return Err(AclError::UnknownPrincipal(principal));
        }
        Ok(())
    }

    /// Grant a single permission directly at a resource.
    ///
    /// Idempotent; returns `false` when the grant already existed.
    pub fn grant(
        &mut self,
        principal: P,
        resource: R,
        permission: PermissionType,
    ) -> Result<bool, AclError<P, R, S::Error>> {
        self.ensure_known(principal, resource)?;
        let inserted = self
            .store
            .insert(Grant::new(principal, resource, permission))
            .map_err(AclError::Store)?;
        debug!(%principal, %resource, %permission, inserted, "grant");

        Ok(inserted)
    }

    /// Revoke a single direct grant.
    ///
    /// Revoking a grant that does not exist on a known resource/principal is a successful no-op
    /// returning `false`; only unknown ids are errors. Permissions held through inheritance are
    /// not touched, they must be revoked at the ancestor granting them.
    pub fn revoke(
        &mut self,
        principal: P,
        resource: R,
        permission: PermissionType,
    ) -> Result<bool, AclError<P, R, S::Error>> {
        self.ensure_known(principal, resource)?;
        let removed = self
            .store
            .remove(Grant::new(principal, resource, permission))
            .map_err(AclError::Store)?;
        debug!(%principal, %resource, %permission, removed, "revoke");

        Ok(removed)
    }

    /// The permissions granted exactly at this resource for this principal.
    pub fn direct(&self, resource: R, principal: P) -> PermissionSet {
        self.store.direct(&resource, &principal)
    }

    /// The permissions held at this resource through its ancestors, under the given mode.
    pub fn inherited(
        &self,
        resource: R,
        principal: P,
        mode: ResolutionMode,
    ) -> Result<PermissionSet, AclError<P, R, S::Error>> {
        Ok(resolver::inherited(
            &self.catalog,
            &self.store,
            resource,
            principal,
            mode,
        )?)
    }

    /// The union of direct and (mode-dependent) inherited permissions.
    pub fn effective(
        &self,
        resource: R,
        principal: P,
        mode: ResolutionMode,
    ) -> Result<PermissionSet, AclError<P, R, S::Error>> {
        Ok(resolver::effective(
            &self.catalog,
            &self.store,
            resource,
            principal,
            mode,
        )?)
    }

    /// Whether a permission can be individually revoked at this resource.
    pub fn is_revocable(
        &self,
        resource: R,
        principal: P,
        permission: PermissionType,
        mode: ResolutionMode,
    ) -> Result<bool, AclError<P, R, S::Error>> {
        Ok(resolver::is_revocable(
            &self.catalog,
            &self.store,
            resource,
            principal,
            permission,
            mode,
        )?)
    }

    /// Fan a set of permissions out over a subtree as independent direct grants.
    pub fn apply_to_subtree(
        &mut self,
        root: R,
        principal: P,
        permissions: &PermissionSet,
        include_descendants: bool,
    ) -> Result<usize, AclError<P, R, S::Error>> {
        Ok(CascadeWriter::apply_to_subtree(
            &self.catalog,
            &self.directory,
            &mut self.store,
            root,
            principal,
            permissions,
            include_descendants,
        )?)
    }

    /// Remove a set of direct grants across a subtree.
    pub fn revoke_from_subtree(
        &mut self,
        root: R,
        principal: P,
        permissions: &PermissionSet,
        include_descendants: bool,
    ) -> Result<usize, AclError<P, R, S::Error>> {
        Ok(CascadeWriter::revoke_from_subtree(
            &self.catalog,
            &self.directory,
            &mut self.store,
            root,
            principal,
            permissions,
            include_descendants,
        )?)
    }

    /// Stamp a registered template out into direct grants for many principals at once.
    pub fn apply_template(
        &mut self,
        template_id: &str,
        principals: &[P],
        resource: R,
    ) -> Result<usize, AclError<P, R, S::Error>> {
        Ok(TemplateApplier::apply(
            &self.templates,
            &self.catalog,
            &self.directory,
            &mut self.store,
            template_id,
            principals,
            resource,
        )?)
    }

    /// Delete every grant placed at the given resource, across all principals.
    ///
    /// Clean-up hook for resource deletion, which happens outside this crate: the catalog owner
    /// calls this when a resource leaves the tree so its grants are not orphaned. The resource
    /// is deliberately not required to still exist in the catalog. Returns the number of grants
    /// removed.
    pub fn purge_resource(&mut self, resource: R) -> Result<usize, AclError<P, R, S::Error>> {
        let mut batch = GrantBatch::new();
        for grant in self.store.grants_at(&resource) {
            batch.remove(grant);
        }

        if batch.is_empty() {
            return Ok(0);
        }

        let count = batch.removes.len();
        commit_with_retry(&mut self.store, batch).map_err(AclError::PurgeFailed)?;
        debug!(%resource, count, "purged resource grants");

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::permission::PermissionType;
    use crate::resolver::ResolutionMode;
    use crate::test_utils::manager;

    use super::AclError;

    #[test]
    fn unknown_ids_fail_before_any_mutation() {
        let mut manager = manager();

        let err = manager.grant('u', "D9", PermissionType::View).unwrap_err();
        assert!(matches!(err, AclError::UnknownResource("D9")));

        let err = manager.grant('z', "D1", PermissionType::View).unwrap_err();
        assert!(matches!(err, AclError::UnknownPrincipal('z')));

        let err = manager.revoke('z', "D1", PermissionType::View).unwrap_err();
        assert!(matches!(err, AclError::UnknownPrincipal('z')));

        assert!(manager.direct("D1", 'u').is_empty());
    }

    #[test]
    fn revoking_an_absent_grant_on_known_ids_is_ok() {
        let mut manager = manager();

        assert!(!manager.revoke('u', "D1", PermissionType::View).unwrap());
    }

    #[test]
    fn grant_twice_equals_grant_once() {
        let mut manager = manager();

        assert!(manager.grant('u', "C1", PermissionType::Edit).unwrap());
        assert!(!manager.grant('u', "C1", PermissionType::Edit).unwrap());
        assert_eq!(manager.direct("C1", 'u').len(), 1);
    }

    #[test]
    fn purge_removes_grants_for_every_principal() {
        let mut manager = manager();
        manager.grant('u', "C1", PermissionType::View).unwrap();
        manager.grant('v', "C1", PermissionType::Edit).unwrap();
        manager.grant('u', "D1", PermissionType::View).unwrap();

        assert_eq!(manager.purge_resource("C1").unwrap(), 2);
        assert!(manager.direct("C1", 'u').is_empty());
        assert!(manager.direct("C1", 'v').is_empty());
        // Grants at other resources stay.
        assert_eq!(manager.direct("D1", 'u').len(), 1);

        // Purging again is a no-op.
        assert_eq!(manager.purge_resource("C1").unwrap(), 0);
    }

    #[test]
    fn inherited_permissions_survive_a_descendant_revoke() {
        let mut manager = manager();
        manager.grant('u', "P1", PermissionType::View).unwrap();

        // Nothing to remove at the document; the inherited permission stays in force.
        assert!(!manager.revoke('u', "D1", PermissionType::View).unwrap());
        let effective = manager
            .effective("D1", 'u', ResolutionMode::Inherit)
            .unwrap();
        assert!(effective.contains(&PermissionType::View));
        assert!(
            !manager
                .is_revocable("D1", 'u', PermissionType::View, ResolutionMode::Inherit)
                .unwrap()
        );
    }
}
