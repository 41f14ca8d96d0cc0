mod common;

use common::{setup, Admin, User};
use warden::prelude::*;

#[tokio::test]
async fn test_role_uniqueness_is_per_guard() {
    let fx = setup();
    let roles = fx.warden.roles();
    roles.create("editor", None).await.unwrap();
    roles.create("editor", Some("api")).await.unwrap();

    let err = roles.create("editor", Some("web")).await.unwrap_err();
    assert!(matches!(err, PermissionError::RoleAlreadyExists { .. }));
    assert_eq!(err.to_string(), "A role `editor` already exists for guard `web`.");
}

#[tokio::test]
async fn test_duplicate_permission_creation() {
    let fx = setup();
    let permissions = fx.warden.permissions();
    permissions.create("edit-articles", None).await.unwrap();

    let err = permissions.create("edit-articles", None).await.unwrap_err();
    assert!(matches!(err, PermissionError::PermissionAlreadyExists { .. }));
    assert_eq!(
        err.to_string(),
        "A permission `edit-articles` already exists for guard `web`."
    );
    assert!(permissions.create("edit-articles", Some("api")).await.is_ok());
}

#[tokio::test]
async fn test_default_guard_comes_from_config() {
    let fx = setup();
    let role = fx.warden.roles().create("editor", None).await.unwrap();
    let permission = fx.warden.permissions().create("edit", None).await.unwrap();
    assert_eq!(role.guard_name, "web");
    assert_eq!(permission.guard_name, "web");
}

#[tokio::test]
async fn test_find_by_name_is_guard_isolated() {
    let fx = setup();
    fx.warden.permissions().create("edit", Some("api")).await.unwrap();

    let err = fx.warden.permissions().find_by_name("edit", None).await.unwrap_err();
    assert_eq!(err.to_string(), "There is no permission named `edit` for guard `web`.");
    assert!(fx.warden.permissions().find_by_name("edit", Some("api")).await.is_ok());

    let err = fx.warden.roles().find_by_name("missing", None).await.unwrap_err();
    assert!(matches!(err, PermissionError::RoleDoesNotExist { .. }));
}

#[tokio::test]
async fn test_find_or_create_never_fails_on_missing() {
    let fx = setup();
    let first = fx.warden.roles().find_or_create("editor", None).await.unwrap();
    let second = fx.warden.roles().find_or_create("editor", None).await.unwrap();
    assert_eq!(first.id, second.id);

    let p1 = fx.warden.permissions().find_or_create("edit", None).await.unwrap();
    let p2 = fx.warden.permissions().find_or_create("edit", None).await.unwrap();
    assert_eq!(p1.id, p2.id);
}

#[tokio::test]
async fn test_find_by_id_respects_guard() {
    let fx = setup();
    let permission = fx.warden.permissions().create("edit", None).await.unwrap();
    let role = fx.warden.roles().create("editor", None).await.unwrap();

    assert_eq!(fx.warden.permissions().find_by_id(permission.id, None).await.unwrap(), permission);
    assert!(fx.warden.permissions().find_by_id(permission.id, Some("api")).await.is_err());
    assert_eq!(fx.warden.roles().find_by_id(role.id, Some("web")).await.unwrap(), role);
}

#[tokio::test]
async fn test_rename_checks_uniqueness() {
    let fx = setup();
    let roles = fx.warden.roles();
    let editor = roles.create("editor", None).await.unwrap();
    roles.create("writer", None).await.unwrap();

    let err = roles.rename(&editor, "writer").await.unwrap_err();
    assert!(matches!(err, PermissionError::RoleAlreadyExists { .. }));

    let renamed = roles.rename(&editor, "author").await.unwrap();
    assert_eq!(renamed.id, editor.id);
    assert!(roles.find_by_name("author", None).await.is_ok());
    assert!(roles.find_by_name("editor", None).await.is_err());
}

#[tokio::test]
async fn test_permission_rename_is_visible_through_cache() {
    let fx = setup();
    let permissions = fx.warden.permissions();
    let edit = permissions.create("edit", None).await.unwrap();
    permissions.find_by_name("edit", None).await.unwrap();

    permissions.rename(&edit, "modify").await.unwrap();
    assert!(permissions.find_by_name("modify", None).await.is_ok());
    assert!(permissions.find_by_name("edit", None).await.is_err());
}

#[tokio::test]
async fn test_role_has_permission_to() {
    let fx = setup();
    let w = &fx.warden;
    let editor = w.roles().create("editor", None).await.unwrap();
    let edit = w.permissions().create("edit", None).await.unwrap();
    w.permissions().create("publish", None).await.unwrap();
    w.role_permissions(&editor).give_permission_to([&edit]).await.unwrap();

    assert!(w.roles().has_permission_to(&editor, "edit").await.unwrap());
    assert!(w.roles().has_permission_to(&editor, edit.id).await.unwrap());
    assert!(!w.roles().has_permission_to(&editor, "publish").await.unwrap());
}

#[tokio::test]
async fn test_role_has_permission_to_foreign_guard_is_mismatch() {
    let fx = setup();
    let w = &fx.warden;
    let editor = w.roles().create("editor", Some("web")).await.unwrap();
    let api_edit = w.permissions().create("edit", Some("api")).await.unwrap();

    let err = w.roles().has_permission_to(&editor, &api_edit).await.unwrap_err();
    match err {
        PermissionError::GuardDoesNotMatch { expected, given } => {
            assert_eq!(expected, vec!["web".to_string()]);
            assert_eq!(given, "api");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_delete_role_detaches_everything() {
    let fx = setup();
    let w = &fx.warden;
    let editor = w.roles().create("editor", None).await.unwrap();
    w.permissions().create("edit", None).await.unwrap();
    w.role_permissions(&editor).give_permission_to(["edit"]).await.unwrap();
    let user = User::new(1);
    user.roles(w).assign_role(["editor"]).await.unwrap();
    assert!(user.permissions(w).has_permission_to("edit").await.unwrap());

    w.roles().delete(&editor).await.unwrap();

    assert!(user.roles(w).roles().await.unwrap().is_empty());
    assert!(!user.permissions(w).has_permission_to("edit").await.unwrap());
    assert!(w.registrar().register_permissions().await.unwrap().rows.is_empty());
}

#[tokio::test]
async fn test_delete_permission_detaches_everything() {
    let fx = setup();
    let w = &fx.warden;
    let editor = w.roles().create("editor", None).await.unwrap();
    let edit = w.permissions().create("edit", None).await.unwrap();
    w.role_permissions(&editor).give_permission_to(["edit"]).await.unwrap();
    let user = User::new(1);
    user.permissions(w).give_permission_to(["edit"]).await.unwrap();

    w.permissions().delete(&edit).await.unwrap();

    assert!(user.permissions(w).get_direct_permissions().await.unwrap().is_empty());
    assert!(w.role_permissions(&editor).permissions().await.unwrap().is_empty());
    let err = w.permissions().find_by_name("edit", None).await.unwrap_err();
    assert!(matches!(err, PermissionError::PermissionDoesNotExist { .. }));
}

#[tokio::test]
async fn test_permission_roles_and_users() {
    let fx = setup();
    let w = &fx.warden;
    let editor = w.roles().create("editor", None).await.unwrap();
    let writer = w.roles().create("writer", None).await.unwrap();
    let edit = w.permissions().create("edit", None).await.unwrap();
    w.role_permissions(&editor).give_permission_to(["edit"]).await.unwrap();
    w.role_permissions(&writer).give_permission_to(["edit"]).await.unwrap();
    User::new(7).permissions(w).give_permission_to(["edit"]).await.unwrap();

    let owners: Vec<String> = w
        .permissions()
        .roles(&edit)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(owners, vec!["editor", "writer"]);

    let users = w.permissions().users(&edit).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, "7");
}

#[tokio::test]
async fn test_role_users_limited_to_guard_model() {
    let fx = setup();
    let w = &fx.warden;
    let web_editor = w.roles().create("editor", Some("web")).await.unwrap();
    let admin_editor = w.roles().create("editor", Some("admin")).await.unwrap();

    User::new(1).roles(w).assign_role([&web_editor]).await.unwrap();
    Admin { id: 1 }.roles(w).assign_role([&admin_editor]).await.unwrap();

    let web_users = w.roles().users(&web_editor).await.unwrap();
    assert_eq!(web_users.len(), 1);
    assert_eq!(web_users[0].model_type, "user");

    let admins = w.roles().users(&admin_editor).await.unwrap();
    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].model_type, "admin");
}
