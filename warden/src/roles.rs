use warden_core::{EntityId, PermissionError, SubjectKey};
use warden_data::{DataError, Role};

use crate::engine::Warden;
use crate::reference::{PermissionRef, RoleRef};

/// Role factory and lookups. Lookups query the store directly.
pub struct Roles<'w> {
    warden: &'w Warden,
}

fn already_exists(name: &str, guard_name: &str) -> PermissionError {
    PermissionError::RoleAlreadyExists {
        name: name.to_string(),
        guard_name: guard_name.to_string(),
    }
}

fn does_not_exist(name: &str, guard_name: &str) -> PermissionError {
    PermissionError::RoleDoesNotExist {
        name: name.to_string(),
        guard_name: guard_name.to_string(),
    }
}

fn map_conflict(err: DataError, name: &str, guard_name: &str) -> PermissionError {
    match err {
        DataError::Conflict(_) => already_exists(name, guard_name),
        other => other.into(),
    }
}

impl<'w> Roles<'w> {
    pub(crate) fn new(warden: &'w Warden) -> Self {
        Self { warden }
    }

    pub fn default_guard(&self) -> String {
        self.warden.guards().default_name_for_type::<Role>()
    }

    fn guard_or_default(&self, guard_name: Option<&str>) -> String {
        guard_name
            .map(str::to_string)
            .unwrap_or_else(|| self.default_guard())
    }

    /// Create a role. Fails if `(name, guard)` already exists.
    pub async fn create(&self, name: &str, guard_name: Option<&str>) -> Result<Role, PermissionError> {
        let guard_name = self.guard_or_default(guard_name);
        let store = self.warden.store();
        if store.find_role(name, &guard_name).await?.is_some() {
            return Err(already_exists(name, &guard_name));
        }

        let inserted = store.insert_role(Role::new(name, guard_name.as_str())).await;
        self.warden.registrar().forget_cached_permissions().await;
        let role = inserted.map_err(|e| map_conflict(e, name, &guard_name))?;

        tracing::debug!(role = %role.name, guard = %role.guard_name, "role created");
        Ok(role)
    }

    pub async fn find_by_name(&self, name: &str, guard_name: Option<&str>) -> Result<Role, PermissionError> {
        let guard_name = self.guard_or_default(guard_name);
        self.warden
            .store()
            .find_role(name, &guard_name)
            .await?
            .ok_or_else(|| does_not_exist(name, &guard_name))
    }

    pub async fn find_by_id(&self, id: EntityId, guard_name: Option<&str>) -> Result<Role, PermissionError> {
        let guard_name = self.guard_or_default(guard_name);
        self.warden
            .store()
            .find_roles_by_ids(&[id])
            .await?
            .into_iter()
            .find(|r| r.guard_name == guard_name)
            .ok_or_else(|| does_not_exist(&id.to_string(), &guard_name))
    }

    /// Find a role, creating it when missing. Never reports `DoesNotExist`.
    pub async fn find_or_create(&self, name: &str, guard_name: Option<&str>) -> Result<Role, PermissionError> {
        let guard_name = self.guard_or_default(guard_name);
        match self.warden.store().find_role(name, &guard_name).await? {
            Some(role) => Ok(role),
            None => self.create(name, Some(&guard_name)).await,
        }
    }

    /// Rename a role, keeping its guard.
    pub async fn rename(&self, role: &Role, new_name: &str) -> Result<Role, PermissionError> {
        let renamed = Role {
            name: new_name.to_string(),
            ..role.clone()
        };
        let updated = self.warden.store().update_role(&renamed).await;
        self.warden.registrar().forget_cached_permissions().await;
        updated.map_err(|e| map_conflict(e, new_name, &renamed.guard_name))?;

        tracing::debug!(from = %role.name, to = %renamed.name, guard = %renamed.guard_name, "role renamed");
        Ok(renamed)
    }

    /// Detach the role from its permissions and subjects, then delete it.
    pub async fn delete(&self, role: &Role) -> Result<(), PermissionError> {
        let store = self.warden.store();
        let deleted: Result<(), DataError> = async {
            store.detach_role_everywhere(role.id).await?;
            store.delete_role(role.id).await
        }
        .await;
        self.warden.registrar().forget_cached_permissions().await;
        deleted?;

        tracing::debug!(role = %role.name, guard = %role.guard_name, "role deleted");
        Ok(())
    }

    /// Whether the role owns the permission directly.
    ///
    /// Names resolve under the role's guard; a permission from another guard
    /// is a [`PermissionError::GuardDoesNotMatch`].
    pub async fn has_permission_to(
        &self,
        role: &Role,
        permission: impl Into<PermissionRef>,
    ) -> Result<bool, PermissionError> {
        self.warden
            .role_permissions(role)
            .has_permission_to(permission)
            .await
    }

    /// Subjects holding the role, limited to the model bound to its guard.
    pub async fn users(&self, role: &Role) -> Result<Vec<SubjectKey>, PermissionError> {
        let Some(model) = self.warden.config().auth.model_for_guard(&role.guard_name) else {
            return Ok(Vec::new());
        };
        Ok(self
            .warden
            .store()
            .subjects_with_role(role.id, Some(model))
            .await?)
    }

    /// Resolve a reference under `guard_name`. Entities pass through.
    pub async fn resolve(&self, reference: RoleRef, guard_name: &str) -> Result<Role, PermissionError> {
        match reference {
            RoleRef::Entity(role) => Ok(role),
            RoleRef::Name(name) => self.find_by_name(&name, Some(guard_name)).await,
            RoleRef::Id(id) => self.find_by_id(id, Some(guard_name)).await,
        }
    }
}
