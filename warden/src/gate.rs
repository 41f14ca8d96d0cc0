//! Request gates: permission and role checks for the calling subject.
//!
//! Gates are transport-agnostic. They read the current subject from an
//! [`AuthContext`] and return a [`PermissionError`] whose
//! [`status_code`](PermissionError::status_code) is 403 on rejection.

use warden_core::PermissionError;

use crate::engine::Warden;
use crate::subject::Authorizable;

/// Source of the authenticated subject for the current request.
pub trait AuthContext {
    type Subject: Authorizable;

    fn user(&self) -> Option<&Self::Subject>;

    fn guest(&self) -> bool {
        self.user().is_none()
    }
}

fn split_names(list: &str) -> Vec<String> {
    list.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Passes when the subject holds any of the listed permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirePermission {
    permissions: Vec<String>,
}

impl RequirePermission {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a `"a|b"` list.
    pub fn parse(list: &str) -> Self {
        Self {
            permissions: split_names(list),
        }
    }

    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    pub async fn check<A: AuthContext>(&self, warden: &Warden, auth: &A) -> Result<(), PermissionError> {
        let Some(user) = auth.user() else {
            tracing::debug!("permission gate rejected guest");
            return Err(PermissionError::NotLoggedIn);
        };
        if warden
            .permissions_of(user)
            .has_any_permission(self.permissions.iter())
            .await?
        {
            return Ok(());
        }
        tracing::debug!(subject = %user.subject_key(), required = ?self.permissions, "permission gate rejected subject");
        Err(PermissionError::UnauthorizedPermission(self.permissions.clone()))
    }
}

/// Passes when the subject holds any of the listed roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireRole {
    roles: Vec<String>,
}

impl RequireRole {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a `"a|b"` list.
    pub fn parse(list: &str) -> Self {
        Self {
            roles: split_names(list),
        }
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub async fn check<A: AuthContext>(&self, warden: &Warden, auth: &A) -> Result<(), PermissionError> {
        let Some(user) = auth.user() else {
            tracing::debug!("role gate rejected guest");
            return Err(PermissionError::NotLoggedIn);
        };
        if warden.roles_of(user).has_any_role(self.roles.iter()).await? {
            return Ok(());
        }
        tracing::debug!(subject = %user.subject_key(), required = ?self.roles, "role gate rejected subject");
        Err(PermissionError::UnauthorizedRole(self.roles.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_pipe() {
        let gate = RequirePermission::parse("edit articles|publish articles");
        assert_eq!(gate.permissions(), ["edit articles", "publish articles"]);
    }

    #[test]
    fn parse_skips_empty_segments() {
        assert_eq!(RequireRole::parse("admin||").roles(), ["admin"]);
        assert!(RequireRole::parse("").roles().is_empty());
    }
}
