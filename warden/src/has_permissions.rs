use tokio::sync::RwLock;
use warden_core::{EntityId, Holder, PermissionError};
use warden_data::{DataError, Permission, Role};

use crate::engine::Warden;
use crate::reference::PermissionRef;
use crate::subject::Authorizable;

/// Permission operations for one holder: a subject or a role.
///
/// Built by [`Warden::permissions_of`] or [`Warden::role_permissions`].
/// Every grant, revoke, and sync invalidates the registrar cache, even when
/// the store write fails.
///
/// The holder's direct permission ids and held role ids are loaded once per
/// handle and reused by later checks. Writes through this handle reload them;
/// writes made elsewhere are seen by a fresh handle.
pub struct HasPermissions {
    warden: Warden,
    holder: Holder,
    guard_names: Vec<String>,
    default_guard: String,
    direct: RwLock<Option<Vec<EntityId>>>,
    held_roles: RwLock<Option<Vec<EntityId>>>,
}

impl HasPermissions {
    pub(crate) fn for_subject<S: Authorizable + ?Sized>(warden: Warden, subject: &S) -> Self {
        let guard_names = warden.guards().names_for(subject);
        let default_guard = warden.guards().default_name_for(subject);
        Self {
            holder: Holder::Subject(subject.subject_key()),
            warden,
            guard_names,
            default_guard,
            direct: RwLock::new(None),
            held_roles: RwLock::new(None),
        }
    }

    pub(crate) fn for_role(warden: Warden, role: &Role) -> Self {
        Self {
            warden,
            holder: Holder::role(role.id),
            guard_names: vec![role.guard_name.clone()],
            default_guard: role.guard_name.clone(),
            direct: RwLock::new(None),
            held_roles: RwLock::new(None),
        }
    }

    pub fn holder(&self) -> &Holder {
        &self.holder
    }

    pub fn guard_names(&self) -> &[String] {
        &self.guard_names
    }

    pub fn default_guard(&self) -> &str {
        &self.default_guard
    }

    fn is_role(&self) -> bool {
        matches!(self.holder, Holder::Role { .. })
    }

    async fn resolve(&self, reference: PermissionRef, guard_name: &str) -> Result<Permission, PermissionError> {
        let snapshot = self.warden.registrar().register_permissions().await?;
        self.warden
            .permissions()
            .resolve_in(&snapshot, reference, guard_name)
    }

    async fn resolve_all(&self, references: Vec<PermissionRef>) -> Result<Vec<Permission>, PermissionError> {
        let snapshot = self.warden.registrar().register_permissions().await?;
        let permissions = self.warden.permissions();
        references
            .into_iter()
            .map(|r| permissions.resolve_in(&snapshot, r, &self.default_guard))
            .collect()
    }

    fn ensure_shares_guard(&self, permission: &Permission) -> Result<(), PermissionError> {
        if self.guard_names.contains(&permission.guard_name) {
            return Ok(());
        }
        Err(PermissionError::GuardDoesNotMatch {
            expected: self.guard_names.clone(),
            given: permission.guard_name.clone(),
        })
    }

    async fn direct_ids(&self) -> Result<Vec<EntityId>, PermissionError> {
        if let Some(ids) = self.direct.read().await.as_ref() {
            return Ok(ids.clone());
        }
        let ids = self.warden.store().permission_ids_of(&self.holder).await?;
        *self.direct.write().await = Some(ids.clone());
        Ok(ids)
    }

    async fn held_role_ids(&self) -> Result<Vec<EntityId>, PermissionError> {
        let Holder::Subject(subject) = &self.holder else {
            return Ok(Vec::new());
        };
        if let Some(ids) = self.held_roles.read().await.as_ref() {
            return Ok(ids.clone());
        }
        let ids = self.warden.store().role_ids_of(subject).await?;
        *self.held_roles.write().await = Some(ids.clone());
        Ok(ids)
    }

    async fn unload_direct(&self) {
        *self.direct.write().await = None;
    }

    /// The holder's direct permissions, in grant order.
    pub async fn permissions(&self) -> Result<Vec<Permission>, PermissionError> {
        let ids = self.direct_ids().await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut permissions = self.warden.store().find_permissions_by_ids(&ids).await?;
        permissions.sort_by_key(|p| ids.iter().position(|id| *id == p.id));
        Ok(permissions)
    }

    /// Alias of [`permissions`](Self::permissions).
    pub async fn get_direct_permissions(&self) -> Result<Vec<Permission>, PermissionError> {
        self.permissions().await
    }

    /// Grant permissions. All of them are resolved and guard-checked before
    /// any is written; already granted ones are skipped.
    pub async fn give_permission_to<I, P>(&self, permissions: I) -> Result<&Self, PermissionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionRef>,
    {
        let references: Vec<PermissionRef> = permissions.into_iter().map(Into::into).collect();
        let resolved = self.resolve_all(references).await?;
        for permission in &resolved {
            self.ensure_shares_guard(permission)?;
        }
        let ids: Vec<EntityId> = resolved.iter().map(|p| p.id).collect();

        let attached = self.warden.store().attach_permissions(&self.holder, &ids).await;
        self.unload_direct().await;
        self.warden.registrar().forget_cached_permissions().await;
        attached?;

        tracing::debug!(holder = %self.holder, count = ids.len(), "permissions granted");
        Ok(self)
    }

    /// Replace the direct permissions with exactly the given set.
    pub async fn sync_permissions<I, P>(&self, permissions: I) -> Result<&Self, PermissionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionRef>,
    {
        let references: Vec<PermissionRef> = permissions.into_iter().map(Into::into).collect();
        let resolved = self.resolve_all(references).await?;
        for permission in &resolved {
            self.ensure_shares_guard(permission)?;
        }
        let ids: Vec<EntityId> = resolved.iter().map(|p| p.id).collect();

        let store = self.warden.store();
        let synced: Result<(), DataError> = async {
            store.detach_all_permissions(&self.holder).await?;
            if ids.is_empty() {
                return Ok(());
            }
            store.attach_permissions(&self.holder, &ids).await
        }
        .await;
        self.unload_direct().await;
        self.warden.registrar().forget_cached_permissions().await;
        synced?;

        tracing::debug!(holder = %self.holder, count = ids.len(), "permissions synced");
        Ok(self)
    }

    /// Revoke permissions. Ones not held are ignored.
    pub async fn revoke_permission_to<I, P>(&self, permissions: I) -> Result<&Self, PermissionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionRef>,
    {
        let references: Vec<PermissionRef> = permissions.into_iter().map(Into::into).collect();
        let resolved = self.resolve_all(references).await?;
        let ids: Vec<EntityId> = resolved.iter().map(|p| p.id).collect();

        let detached = self.warden.store().detach_permissions(&self.holder, &ids).await;
        self.unload_direct().await;
        self.warden.registrar().forget_cached_permissions().await;
        detached?;

        tracing::debug!(holder = %self.holder, count = ids.len(), "permissions revoked");
        Ok(self)
    }

    /// Remove every direct permission. Call before deleting the holder.
    pub async fn detach_all(&self) -> Result<(), PermissionError> {
        let detached = self.warden.store().detach_all_permissions(&self.holder).await;
        self.unload_direct().await;
        self.warden.registrar().forget_cached_permissions().await;
        detached?;
        Ok(())
    }

    /// Whether the holder may perform `permission`, resolved under its default guard.
    ///
    /// Subjects: a direct grant, or else a role owning the permission.
    /// Roles: a direct grant only. A permission from a guard the holder does
    /// not belong to is [`PermissionError::GuardDoesNotMatch`].
    pub async fn has_permission_to(&self, permission: impl Into<PermissionRef>) -> Result<bool, PermissionError> {
        self.check(permission.into(), &self.default_guard).await
    }

    /// Like [`has_permission_to`](Self::has_permission_to), resolving names under `guard_name`.
    pub async fn has_permission_to_in_guard(
        &self,
        permission: impl Into<PermissionRef>,
        guard_name: &str,
    ) -> Result<bool, PermissionError> {
        self.check(permission.into(), guard_name).await
    }

    async fn check(&self, reference: PermissionRef, guard_name: &str) -> Result<bool, PermissionError> {
        let permission = self.resolve(reference, guard_name).await?;
        self.ensure_shares_guard(&permission)?;

        let allowed = self.direct_ids().await?.contains(&permission.id)
            || self.via_role(&permission).await?;
        tracing::trace!(
            holder = %self.holder,
            permission = %permission.name,
            guard = %permission.guard_name,
            allowed,
            "authorization decision"
        );
        Ok(allowed)
    }

    pub async fn has_direct_permission(&self, permission: impl Into<PermissionRef>) -> Result<bool, PermissionError> {
        let permission = self.resolve(permission.into(), &self.default_guard).await?;
        self.ensure_shares_guard(&permission)?;
        Ok(self.direct_ids().await?.contains(&permission.id))
    }

    pub async fn has_permission_via_role(&self, permission: impl Into<PermissionRef>) -> Result<bool, PermissionError> {
        let permission = self.resolve(permission.into(), &self.default_guard).await?;
        self.ensure_shares_guard(&permission)?;
        self.via_role(&permission).await
    }

    async fn via_role(&self, permission: &Permission) -> Result<bool, PermissionError> {
        if self.is_role() {
            return Ok(false);
        }
        let owners = self
            .warden
            .registrar()
            .register_permissions()
            .await?
            .role_ids_with_permission(permission.id);
        if owners.is_empty() {
            return Ok(false);
        }
        let held = self.held_role_ids().await?;
        Ok(held.iter().any(|id| owners.contains(id)))
    }

    /// True on the first permission held, in input order.
    pub async fn has_any_permission<I, P>(&self, permissions: I) -> Result<bool, PermissionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionRef>,
    {
        let references: Vec<PermissionRef> = permissions.into_iter().map(Into::into).collect();
        for reference in references {
            if self.has_permission_to(reference).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// False on the first permission not held, in input order.
    pub async fn has_all_permissions<I, P>(&self, permissions: I) -> Result<bool, PermissionError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PermissionRef>,
    {
        let references: Vec<PermissionRef> = permissions.into_iter().map(Into::into).collect();
        for reference in references {
            if !self.has_permission_to(reference).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Permissions held through roles, deduplicated and sorted by name.
    pub async fn get_permissions_via_roles(&self) -> Result<Vec<Permission>, PermissionError> {
        let store = self.warden.store();
        let role_ids = self.held_role_ids().await?;
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<EntityId> = Vec::new();
        for entry in store.load_roles_with_permissions(&role_ids).await? {
            for id in entry.permission_ids {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut permissions = store.find_permissions_by_ids(&ids).await?;
        sort_by_name(&mut permissions);
        Ok(permissions)
    }

    /// Direct permissions plus those held through roles, deduplicated and
    /// sorted by name.
    pub async fn get_all_permissions(&self) -> Result<Vec<Permission>, PermissionError> {
        let mut all = self.permissions().await?;
        for permission in self.get_permissions_via_roles().await? {
            if !all.iter().any(|p| p.id == permission.id) {
                all.push(permission);
            }
        }
        sort_by_name(&mut all);
        Ok(all)
    }

    /// Names of [`get_all_permissions`](Self::get_all_permissions).
    pub async fn get_permission_names(&self) -> Result<Vec<String>, PermissionError> {
        Ok(self
            .get_all_permissions()
            .await?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }
}

fn sort_by_name(permissions: &mut [Permission]) {
    permissions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.guard_name.cmp(&b.guard_name)));
}

impl std::fmt::Debug for HasPermissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HasPermissions")
            .field("holder", &self.holder)
            .field("guard_names", &self.guard_names)
            .field("default_guard", &self.default_guard)
            .finish_non_exhaustive()
    }
}
