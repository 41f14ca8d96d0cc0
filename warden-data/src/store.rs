use async_trait::async_trait;
use warden_core::{EntityId, Holder, SubjectKey};

use crate::entity::{Permission, PermissionGraph, Role, RoleWithPermissions, SubjectFilter};
use crate::error::DataError;

/// Pivot collection linking roles to permissions.
pub const ROLE_HAS_PERMISSIONS: &str = "role_has_permissions";
/// Pivot collection linking subjects to permissions.
pub const MODEL_HAS_PERMISSIONS: &str = "model_has_permissions";
/// Pivot collection linking subjects to roles.
pub const MODEL_HAS_ROLES: &str = "model_has_roles";

/// Backing store for roles, permissions, and their associations.
///
/// Implementations own query execution, timeouts, and retries. Every method
/// is one round-trip; callers rely on that when counting store work.
#[async_trait]
pub trait AuthorizationStore: Send + Sync {
    // --- roles ---

    /// Persist a new role. `DataError::Conflict` if `(name, guard_name)` is taken.
    async fn insert_role(&self, role: Role) -> Result<Role, DataError>;
    async fn find_role(&self, name: &str, guard_name: &str) -> Result<Option<Role>, DataError>;
    async fn find_roles_by_ids(&self, ids: &[EntityId]) -> Result<Vec<Role>, DataError>;
    /// Overwrite name and guard of an existing role.
    async fn update_role(&self, role: &Role) -> Result<(), DataError>;
    async fn delete_role(&self, id: EntityId) -> Result<(), DataError>;

    // --- permissions ---

    async fn insert_permission(&self, permission: Permission) -> Result<Permission, DataError>;
    async fn find_permission(
        &self,
        name: &str,
        guard_name: &str,
    ) -> Result<Option<Permission>, DataError>;
    async fn find_permissions_by_ids(&self, ids: &[EntityId]) -> Result<Vec<Permission>, DataError>;
    async fn update_permission(&self, permission: &Permission) -> Result<(), DataError>;
    async fn delete_permission(&self, id: EntityId) -> Result<(), DataError>;

    // --- eager loads ---

    /// Every permission and every role with its permission ids, in one query.
    async fn load_permission_graph(&self) -> Result<PermissionGraph, DataError>;
    /// The given roles with their permission ids, in one query.
    async fn load_roles_with_permissions(
        &self,
        role_ids: &[EntityId],
    ) -> Result<Vec<RoleWithPermissions>, DataError>;

    // --- holder <-> permission ---

    async fn permission_ids_of(&self, holder: &Holder) -> Result<Vec<EntityId>, DataError>;
    /// Attach permissions; already attached ids are left as is.
    async fn attach_permissions(&self, holder: &Holder, ids: &[EntityId]) -> Result<(), DataError>;
    async fn detach_permissions(&self, holder: &Holder, ids: &[EntityId]) -> Result<(), DataError>;
    async fn detach_all_permissions(&self, holder: &Holder) -> Result<(), DataError>;

    // --- subject <-> role ---

    async fn role_ids_of(&self, subject: &SubjectKey) -> Result<Vec<EntityId>, DataError>;
    async fn attach_roles(&self, subject: &SubjectKey, ids: &[EntityId]) -> Result<(), DataError>;
    async fn detach_roles(&self, subject: &SubjectKey, ids: &[EntityId]) -> Result<(), DataError>;
    async fn detach_all_roles(&self, subject: &SubjectKey) -> Result<(), DataError>;

    // --- cascades ---

    /// Remove the role from every permission and every subject.
    async fn detach_role_everywhere(&self, role_id: EntityId) -> Result<(), DataError>;
    /// Remove the permission from every role and every subject.
    async fn detach_permission_everywhere(&self, permission_id: EntityId) -> Result<(), DataError>;

    // --- reverse lookups ---

    async fn subjects_with_role(
        &self,
        role_id: EntityId,
        model_type: Option<&str>,
    ) -> Result<Vec<SubjectKey>, DataError>;
    async fn subjects_with_permission(
        &self,
        permission_id: EntityId,
        model_type: Option<&str>,
    ) -> Result<Vec<SubjectKey>, DataError>;
    async fn find_subjects(&self, filter: &SubjectFilter) -> Result<Vec<SubjectKey>, DataError>;
}
