use warden_core::{GuardScoped, SubjectKey};

use crate::engine::Warden;
use crate::has_permissions::HasPermissions;
use crate::has_roles::HasRoles;

/// A subject that can hold roles and permissions.
///
/// ```ignore
/// struct User { id: u64 }
///
/// impl GuardScoped for User {
///     const MODEL_TYPE: &'static str = "user";
/// }
///
/// impl Authorizable for User {
///     fn subject_id(&self) -> String { self.id.to_string() }
/// }
///
/// user.permissions(&warden).give_permission_to(["edit-articles"]).await?;
/// ```
pub trait Authorizable: GuardScoped + Send + Sync {
    /// The subject's own id within its model type.
    fn subject_id(&self) -> String;

    fn subject_key(&self) -> SubjectKey {
        SubjectKey::new(Self::MODEL_TYPE, self.subject_id())
    }

    fn permissions(&self, warden: &Warden) -> HasPermissions
    where
        Self: Sized,
    {
        warden.permissions_of(self)
    }

    fn roles(&self, warden: &Warden) -> HasRoles
    where
        Self: Sized,
    {
        warden.roles_of(self)
    }
}
