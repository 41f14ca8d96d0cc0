use serde::{Deserialize, Serialize};
use warden_core::{EntityId, GuardScoped};

/// A named, guard-scoped record: the shape shared by roles and permissions.
pub trait Entity: Send + Sync + 'static {
    /// Singular noun used in log events and messages.
    const KIND: &'static str;

    fn id(&self) -> EntityId;
    fn name(&self) -> &str;
    fn guard_name(&self) -> &str;
}

/// A role record. Unique on `(name, guard_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: EntityId,
    pub name: String,
    pub guard_name: String,
}

impl Role {
    pub fn new(name: impl Into<String>, guard_name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            guard_name: guard_name.into(),
        }
    }
}

impl Entity for Role {
    const KIND: &'static str = "role";

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn guard_name(&self) -> &str {
        &self.guard_name
    }
}

/// A permission record. Unique on `(name, guard_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: EntityId,
    pub name: String,
    pub guard_name: String,
}

impl Permission {
    pub fn new(name: impl Into<String>, guard_name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            guard_name: guard_name.into(),
        }
    }
}

impl Entity for Permission {
    const KIND: &'static str = "permission";

    fn id(&self) -> EntityId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn guard_name(&self) -> &str {
        &self.guard_name
    }
}

/// A role together with the ids of the permissions it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleWithPermissions {
    pub role: Role,
    pub permission_ids: Vec<EntityId>,
}

/// The whole role/permission graph, loaded in a single store round-trip.
///
/// `permissions` lists every permission, including ones no role owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGraph {
    pub permissions: Vec<Permission>,
    pub roles: Vec<RoleWithPermissions>,
}

/// Selects subjects holding any of the given permissions directly or any of
/// the given roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectFilter {
    pub model_type: Option<String>,
    pub permission_ids: Vec<EntityId>,
    pub role_ids: Vec<EntityId>,
}

impl SubjectFilter {
    pub fn is_empty(&self) -> bool {
        self.permission_ids.is_empty() && self.role_ids.is_empty()
    }
}

impl GuardScoped for Role {
    const MODEL_TYPE: &'static str = "role";

    fn guard_name(&self) -> Option<&str> {
        Some(&self.guard_name)
    }
}

impl GuardScoped for Permission {
    const MODEL_TYPE: &'static str = "permission";

    fn guard_name(&self) -> Option<&str> {
        Some(&self.guard_name)
    }
}
