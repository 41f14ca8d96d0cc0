use warden_core::error::PermissionError;

#[test]
fn test_already_exists_messages() {
    let role = PermissionError::RoleAlreadyExists {
        name: "editor".into(),
        guard_name: "web".into(),
    };
    assert_eq!(role.to_string(), "A role `editor` already exists for guard `web`.");
    assert_eq!(role.status_code(), 409);

    let perm = PermissionError::PermissionAlreadyExists {
        name: "edit-articles".into(),
        guard_name: "web".into(),
    };
    assert_eq!(
        perm.to_string(),
        "A permission `edit-articles` already exists for guard `web`."
    );
}

#[test]
fn test_does_not_exist_messages() {
    let err = PermissionError::PermissionDoesNotExist {
        name: "fly".into(),
        guard_name: "api".into(),
    };
    assert_eq!(err.to_string(), "There is no permission named `fly` for guard `api`.");
    assert_eq!(err.status_code(), 404);

    let err = PermissionError::RoleDoesNotExist {
        name: "pilot".into(),
        guard_name: "web".into(),
    };
    assert_eq!(err.to_string(), "There is no role named `pilot` for guard `web`.");
}

#[test]
fn test_guard_mismatch_lists_expected_guards() {
    let err = PermissionError::GuardDoesNotMatch {
        expected: vec!["web".into(), "api".into()],
        given: "admin".into(),
    };
    assert_eq!(
        err.to_string(),
        "The given role or permission should use guard `web, api` instead of `admin`."
    );
    assert_eq!(err.status_code(), 403);
}

#[test]
fn test_unauthorized_carries_required_names() {
    let err = PermissionError::UnauthorizedPermission(vec!["a".into(), "b".into()]);
    assert_eq!(err.to_string(), "User does not have the right permissions a, b.");
    assert_eq!(err.required(), ["a".to_string(), "b".to_string()]);
    assert!(err.is_unauthorized());

    let err = PermissionError::UnauthorizedRole(vec!["admin".into()]);
    assert_eq!(err.to_string(), "User does not have the right roles admin.");
}

#[test]
fn test_not_logged_in() {
    let err = PermissionError::NotLoggedIn;
    assert_eq!(err.to_string(), "User is not logged in.");
    assert_eq!(err.status_code(), 403);
    assert!(err.required().is_empty());
}

#[test]
fn test_infrastructure_errors_are_500() {
    assert_eq!(PermissionError::Store("down".into()).status_code(), 500);
    assert_eq!(PermissionError::Cache("bad".into()).status_code(), 500);
}
