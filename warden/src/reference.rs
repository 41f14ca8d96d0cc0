use warden_core::EntityId;
use warden_data::{Permission, Role};

/// A permission given by name, by id, or as a loaded record.
///
/// Names and ids are resolved against the guard of the operation that
/// receives them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionRef {
    Name(String),
    Id(EntityId),
    Entity(Permission),
}

/// A role given by name, by id, or as a loaded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRef {
    Name(String),
    Id(EntityId),
    Entity(Role),
}

macro_rules! impl_ref_from {
    ($target:ident, $entity:ty) => {
        impl From<&str> for $target {
            fn from(name: &str) -> Self {
                $target::Name(name.to_string())
            }
        }

        impl From<String> for $target {
            fn from(name: String) -> Self {
                $target::Name(name)
            }
        }

        impl From<&String> for $target {
            fn from(name: &String) -> Self {
                $target::Name(name.clone())
            }
        }

        impl From<EntityId> for $target {
            fn from(id: EntityId) -> Self {
                $target::Id(id)
            }
        }

        impl From<$entity> for $target {
            fn from(entity: $entity) -> Self {
                $target::Entity(entity)
            }
        }

        impl From<&$entity> for $target {
            fn from(entity: &$entity) -> Self {
                $target::Entity(entity.clone())
            }
        }
    };
}

impl_ref_from!(PermissionRef, Permission);
impl_ref_from!(RoleRef, Role);
