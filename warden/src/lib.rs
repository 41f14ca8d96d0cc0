//! Role-based access control with guard-scoped subjects.
//!
//! Warden answers whether a subject (a user, an admin, any model) may perform
//! a named permission, either directly or through one of its roles. Roles and
//! permissions live in a pluggable [`AuthorizationStore`]; the
//! [`PermissionRegistrar`] caches the full role/permission mapping and drops
//! it whenever a role, a permission, or an assignment between them changes.
//!
//! # Setup
//!
//! ```ignore
//! use warden::prelude::*;
//!
//! let warden = Warden::builder()
//!     .config(WardenConfig::load("dev")?)
//!     .build()?;
//!
//! let editor = warden.roles().create("editor", None).await?;
//! warden.permissions().create("edit-articles", None).await?;
//! warden.role_permissions(&editor).give_permission_to(["edit-articles"]).await?;
//! ```
//!
//! # Subjects
//!
//! Any type implementing [`Authorizable`] can hold roles and permissions.
//! Guards are resolved from the instance, the type, or the configured auth
//! providers (see [`GuardResolver`]).
//!
//! ```ignore
//! struct User { id: u64 }
//!
//! impl GuardScoped for User {
//!     const MODEL_TYPE: &'static str = "user";
//! }
//!
//! impl Authorizable for User {
//!     fn subject_id(&self) -> String { self.id.to_string() }
//! }
//!
//! let user = User { id: 1 };
//! user.roles(&warden).assign_role(["editor"]).await?;
//! assert!(user.permissions(&warden).has_permission_to("edit-articles").await?);
//! ```
//!
//! # Gates
//!
//! ```ignore
//! RequirePermission::parse("edit-articles|publish-articles")
//!     .check(&warden, &auth)
//!     .await?;
//! ```
//!
//! With the `axum` feature, [`PermissionError`] implements `IntoResponse`,
//! answering `{"error": "..."}` with its status code.

pub mod engine;
pub mod gate;
pub mod has_permissions;
pub mod has_roles;
pub mod permissions;
pub mod reference;
pub mod registrar;
pub mod roles;
pub mod subject;

pub use warden_cache::{CacheStore, InMemoryCache};
pub use warden_core::{
    ConfigError, EntityId, GuardResolver, GuardScoped, Holder, PermissionError, SubjectKey,
    WardenConfig,
};
pub use warden_data::{
    AuthorizationStore, DataError, InMemoryStore, Permission, Role, SubjectFilter,
};

pub use engine::{Warden, WardenBuilder};
pub use gate::{AuthContext, RequirePermission, RequireRole};
pub use has_permissions::HasPermissions;
pub use has_roles::HasRoles;
pub use permissions::Permissions;
pub use reference::{PermissionRef, RoleRef};
pub use registrar::{PermissionRegistrar, PermissionSnapshot, RolePermissionRow};
pub use roles::Roles;
pub use subject::Authorizable;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::engine::Warden;
    pub use crate::gate::{AuthContext, RequirePermission, RequireRole};
    pub use crate::subject::Authorizable;
    pub use warden_core::{GuardScoped, PermissionError, WardenConfig};
    pub use warden_data::{Permission, Role};
}
