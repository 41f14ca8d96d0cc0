use warden_core::{EntityId, PermissionError, SubjectKey};
use warden_data::{DataError, Role};

use crate::engine::Warden;
use crate::reference::RoleRef;
use crate::subject::Authorizable;

/// Role operations for one subject.
///
/// Role assignment does not touch the registrar cache: the snapshot only
/// holds role/permission rows, never subject data.
pub struct HasRoles {
    warden: Warden,
    subject: SubjectKey,
    guard_names: Vec<String>,
    default_guard: String,
}

impl HasRoles {
    pub(crate) fn new<S: Authorizable + ?Sized>(warden: Warden, subject: &S) -> Self {
        let guard_names = warden.guards().names_for(subject);
        let default_guard = warden.guards().default_name_for(subject);
        Self {
            subject: subject.subject_key(),
            warden,
            guard_names,
            default_guard,
        }
    }

    pub fn subject(&self) -> &SubjectKey {
        &self.subject
    }

    async fn resolve_all(&self, references: Vec<RoleRef>) -> Result<Vec<Role>, PermissionError> {
        let roles = self.warden.roles();
        let mut resolved = Vec::with_capacity(references.len());
        for reference in references {
            resolved.push(roles.resolve(reference, &self.default_guard).await?);
        }
        Ok(resolved)
    }

    fn ensure_shares_guard(&self, role: &Role) -> Result<(), PermissionError> {
        if self.guard_names.contains(&role.guard_name) {
            return Ok(());
        }
        Err(PermissionError::GuardDoesNotMatch {
            expected: self.guard_names.clone(),
            given: role.guard_name.clone(),
        })
    }

    /// The subject's roles, in assignment order.
    pub async fn roles(&self) -> Result<Vec<Role>, PermissionError> {
        let store = self.warden.store();
        let ids = store.role_ids_of(&self.subject).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut roles = store.find_roles_by_ids(&ids).await?;
        roles.sort_by_key(|r| ids.iter().position(|id| *id == r.id));
        Ok(roles)
    }

    /// Assign roles. All are resolved and guard-checked before any is written.
    pub async fn assign_role<I, R>(&self, roles: I) -> Result<&Self, PermissionError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        let references: Vec<RoleRef> = roles.into_iter().map(Into::into).collect();
        let resolved = self.resolve_all(references).await?;
        for role in &resolved {
            self.ensure_shares_guard(role)?;
        }
        let ids: Vec<EntityId> = resolved.iter().map(|r| r.id).collect();
        self.warden.store().attach_roles(&self.subject, &ids).await?;

        tracing::debug!(subject = %self.subject, count = ids.len(), "roles assigned");
        Ok(self)
    }

    pub async fn remove_role<I, R>(&self, roles: I) -> Result<&Self, PermissionError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        let references: Vec<RoleRef> = roles.into_iter().map(Into::into).collect();
        let resolved = self.resolve_all(references).await?;
        let ids: Vec<EntityId> = resolved.iter().map(|r| r.id).collect();
        self.warden.store().detach_roles(&self.subject, &ids).await?;

        tracing::debug!(subject = %self.subject, count = ids.len(), "roles removed");
        Ok(self)
    }

    /// Replace the subject's roles with exactly the given set.
    pub async fn sync_roles<I, R>(&self, roles: I) -> Result<&Self, PermissionError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        let references: Vec<RoleRef> = roles.into_iter().map(Into::into).collect();
        let resolved = self.resolve_all(references).await?;
        for role in &resolved {
            self.ensure_shares_guard(role)?;
        }
        let ids: Vec<EntityId> = resolved.iter().map(|r| r.id).collect();

        let store = self.warden.store();
        let synced: Result<(), DataError> = async {
            store.detach_all_roles(&self.subject).await?;
            if ids.is_empty() {
                return Ok(());
            }
            store.attach_roles(&self.subject, &ids).await
        }
        .await;
        synced?;

        tracing::debug!(subject = %self.subject, count = ids.len(), "roles synced");
        Ok(self)
    }

    /// Remove every role. Call before deleting the subject.
    pub async fn detach_all(&self) -> Result<(), PermissionError> {
        Ok(self.warden.store().detach_all_roles(&self.subject).await?)
    }

    /// True if the subject holds any of the given roles.
    ///
    /// Names match held roles by name without resolving them, so an unknown
    /// name is simply not held.
    pub async fn has_role<I, R>(&self, roles: I) -> Result<bool, PermissionError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        let references: Vec<RoleRef> = roles.into_iter().map(Into::into).collect();
        let held = self.roles().await?;
        let allowed = references.iter().any(|r| holds(&held, r));
        tracing::trace!(subject = %self.subject, allowed, "role decision");
        Ok(allowed)
    }

    pub async fn has_any_role<I, R>(&self, roles: I) -> Result<bool, PermissionError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        self.has_role(roles).await
    }

    pub async fn has_all_roles<I, R>(&self, roles: I) -> Result<bool, PermissionError>
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleRef>,
    {
        let references: Vec<RoleRef> = roles.into_iter().map(Into::into).collect();
        let held = self.roles().await?;
        Ok(references.iter().all(|r| holds(&held, r)))
    }

    pub async fn get_role_names(&self) -> Result<Vec<String>, PermissionError> {
        Ok(self.roles().await?.into_iter().map(|r| r.name).collect())
    }
}

fn holds(held: &[Role], reference: &RoleRef) -> bool {
    match reference {
        RoleRef::Name(name) => held.iter().any(|r| &r.name == name),
        RoleRef::Id(id) => held.iter().any(|r| r.id == *id),
        RoleRef::Entity(role) => held.iter().any(|r| r.id == role.id),
    }
}

impl std::fmt::Debug for HasRoles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HasRoles")
            .field("subject", &self.subject)
            .field("guard_names", &self.guard_names)
            .field("default_guard", &self.default_guard)
            .finish_non_exhaustive()
    }
}
