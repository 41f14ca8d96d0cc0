use warden_core::{EntityId, PermissionError, SubjectKey};
use warden_data::{DataError, Permission, Role};

use crate::engine::Warden;
use crate::reference::PermissionRef;
use crate::registrar::PermissionSnapshot;

/// Permission factory and lookups.
///
/// Lookups by name or id are served from the registrar snapshot, so they
/// cost no store query while the cache is valid.
pub struct Permissions<'w> {
    warden: &'w Warden,
}

fn already_exists(name: &str, guard_name: &str) -> PermissionError {
    PermissionError::PermissionAlreadyExists {
        name: name.to_string(),
        guard_name: guard_name.to_string(),
    }
}

fn does_not_exist(name: &str, guard_name: &str) -> PermissionError {
    PermissionError::PermissionDoesNotExist {
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

impl<'w> Permissions<'w> {
    pub(crate) fn new(warden: &'w Warden) -> Self {
        Self { warden }
    }

    /// Guard used when none is given.
    pub fn default_guard(&self) -> String {
        self.warden.guards().default_name_for_type::<Permission>()
    }

    fn guard_or_default(&self, guard_name: Option<&str>) -> String {
        guard_name
            .map(str::to_string)
            .unwrap_or_else(|| self.default_guard())
    }

    /// Create a permission. Fails if `(name, guard)` already exists.
    pub async fn create(&self, name: &str, guard_name: Option<&str>) -> Result<Permission, PermissionError> {
        let guard_name = self.guard_or_default(guard_name);
        let snapshot = self.warden.registrar().register_permissions().await?;
        if snapshot.find_permission(name, &guard_name).is_some() {
            return Err(already_exists(name, &guard_name));
        }

        let inserted = self
            .warden
            .store()
            .insert_permission(Permission::new(name, guard_name.as_str()))
            .await;
        self.warden.registrar().forget_cached_permissions().await;
        let permission = inserted.map_err(|e| map_conflict(e, name, &guard_name))?;

        tracing::debug!(permission = %permission.name, guard = %permission.guard_name, "permission created");
        Ok(permission)
    }

    pub async fn find_by_name(&self, name: &str, guard_name: Option<&str>) -> Result<Permission, PermissionError> {
        let guard_name = self.guard_or_default(guard_name);
        let snapshot = self.warden.registrar().register_permissions().await?;
        snapshot
            .find_permission(name, &guard_name)
            .cloned()
            .ok_or_else(|| does_not_exist(name, &guard_name))
    }

    pub async fn find_by_id(&self, id: EntityId, guard_name: Option<&str>) -> Result<Permission, PermissionError> {
        let guard_name = self.guard_or_default(guard_name);
        let snapshot = self.warden.registrar().register_permissions().await?;
        self.resolve_in(&snapshot, PermissionRef::Id(id), &guard_name)
    }

    /// Find a permission, creating it when missing. Never reports `DoesNotExist`.
    pub async fn find_or_create(&self, name: &str, guard_name: Option<&str>) -> Result<Permission, PermissionError> {
        let guard_name = self.guard_or_default(guard_name);
        let snapshot = self.warden.registrar().register_permissions().await?;
        match snapshot.find_permission(name, &guard_name) {
            Some(permission) => Ok(permission.clone()),
            None => self.create(name, Some(&guard_name)).await,
        }
    }

    /// Rename a permission, keeping its guard.
    pub async fn rename(&self, permission: &Permission, new_name: &str) -> Result<Permission, PermissionError> {
        let renamed = Permission {
            name: new_name.to_string(),
            ..permission.clone()
        };
        let updated = self.warden.store().update_permission(&renamed).await;
        self.warden.registrar().forget_cached_permissions().await;
        updated.map_err(|e| map_conflict(e, new_name, &renamed.guard_name))?;

        tracing::debug!(from = %permission.name, to = %renamed.name, guard = %renamed.guard_name, "permission renamed");
        Ok(renamed)
    }

    /// Detach the permission from every role and subject, then delete it.
    pub async fn delete(&self, permission: &Permission) -> Result<(), PermissionError> {
        let store = self.warden.store();
        let deleted: Result<(), DataError> = async {
            store.detach_permission_everywhere(permission.id).await?;
            store.delete_permission(permission.id).await
        }
        .await;
        self.warden.registrar().forget_cached_permissions().await;
        deleted?;

        tracing::debug!(permission = %permission.name, guard = %permission.guard_name, "permission deleted");
        Ok(())
    }

    /// Every permission known to the registrar.
    pub async fn all(&self) -> Result<Vec<Permission>, PermissionError> {
        self.warden.registrar().get_permissions().await
    }

    /// Roles owning the permission.
    pub async fn roles(&self, permission: &Permission) -> Result<Vec<Role>, PermissionError> {
        let snapshot = self.warden.registrar().register_permissions().await?;
        Ok(snapshot.roles_with_permission(permission.id))
    }

    /// Subjects holding the permission directly, limited to the model bound
    /// to the permission's guard.
    pub async fn users(&self, permission: &Permission) -> Result<Vec<SubjectKey>, PermissionError> {
        let Some(model) = self.warden.config().auth.model_for_guard(&permission.guard_name) else {
            return Ok(Vec::new());
        };
        Ok(self
            .warden
            .store()
            .subjects_with_permission(permission.id, Some(model))
            .await?)
    }

    /// Resolve a reference against a snapshot under `guard_name`.
    ///
    /// Entities pass through untouched; their guard is checked by the caller.
    pub fn resolve_in(
        &self,
        snapshot: &PermissionSnapshot,
        reference: PermissionRef,
        guard_name: &str,
    ) -> Result<Permission, PermissionError> {
        match reference {
            PermissionRef::Entity(permission) => Ok(permission),
            PermissionRef::Name(name) => snapshot
                .find_permission(&name, guard_name)
                .cloned()
                .ok_or_else(|| does_not_exist(&name, guard_name)),
            PermissionRef::Id(id) => snapshot
                .find_permission_by_id(id)
                .filter(|p| p.guard_name == guard_name)
                .cloned()
                .ok_or_else(|| does_not_exist(&id.to_string(), guard_name)),
        }
    }
}
