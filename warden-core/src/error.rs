use std::fmt;

/// Errors raised by role, permission, and authorization operations.
///
/// Authorization variants carry the names that were required so that
/// callers can report them; none of them are retried internally.
#[derive(Debug)]
pub enum PermissionError {
    RoleAlreadyExists { name: String, guard_name: String },
    RoleDoesNotExist { name: String, guard_name: String },
    PermissionAlreadyExists { name: String, guard_name: String },
    PermissionDoesNotExist { name: String, guard_name: String },
    /// A role or permission from one guard was used with a holder of another.
    GuardDoesNotMatch { expected: Vec<String>, given: String },
    NotLoggedIn,
    UnauthorizedPermission(Vec<String>),
    UnauthorizedRole(Vec<String>),
    /// The backing store failed.
    Store(String),
    /// The registrar cache failed.
    Cache(String),
}

impl PermissionError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            PermissionError::GuardDoesNotMatch { .. }
            | PermissionError::NotLoggedIn
            | PermissionError::UnauthorizedPermission(_)
            | PermissionError::UnauthorizedRole(_) => 403,
            PermissionError::RoleDoesNotExist { .. }
            | PermissionError::PermissionDoesNotExist { .. } => 404,
            PermissionError::RoleAlreadyExists { .. }
            | PermissionError::PermissionAlreadyExists { .. } => 409,
            PermissionError::Store(_) | PermissionError::Cache(_) => 500,
        }
    }

    /// The required names carried by an `Unauthorized*` error.
    pub fn required(&self) -> &[String] {
        match self {
            PermissionError::UnauthorizedPermission(names)
            | PermissionError::UnauthorizedRole(names) => names,
            _ => &[],
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == 403
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::RoleAlreadyExists { name, guard_name } => {
                write!(f, "A role `{name}` already exists for guard `{guard_name}`.")
            }
            PermissionError::RoleDoesNotExist { name, guard_name } => {
                write!(f, "There is no role named `{name}` for guard `{guard_name}`.")
            }
            PermissionError::PermissionAlreadyExists { name, guard_name } => {
                write!(f, "A permission `{name}` already exists for guard `{guard_name}`.")
            }
            PermissionError::PermissionDoesNotExist { name, guard_name } => {
                write!(f, "There is no permission named `{name}` for guard `{guard_name}`.")
            }
            PermissionError::GuardDoesNotMatch { expected, given } => write!(
                f,
                "The given role or permission should use guard `{}` instead of `{given}`.",
                expected.join(", ")
            ),
            PermissionError::NotLoggedIn => write!(f, "User is not logged in."),
            PermissionError::UnauthorizedPermission(names) => {
                write!(f, "User does not have the right permissions {}.", names.join(", "))
            }
            PermissionError::UnauthorizedRole(names) => {
                write!(f, "User does not have the right roles {}.", names.join(", "))
            }
            PermissionError::Store(msg) => write!(f, "Store error: {msg}"),
            PermissionError::Cache(msg) => write!(f, "Cache error: {msg}"),
        }
    }
}

impl std::error::Error for PermissionError {}
