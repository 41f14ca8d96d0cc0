pub mod entity;
pub mod error;
pub mod memory;
pub mod store;

pub use entity::{Entity, Permission, PermissionGraph, Role, RoleWithPermissions, SubjectFilter};
pub use error::DataError;
pub use memory::{InMemoryStore, QueryRecord};
pub use store::AuthorizationStore;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{AuthorizationStore, DataError, Entity, InMemoryStore, Permission, Role};
}
