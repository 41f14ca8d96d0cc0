use serial_test::serial;
use warden_core::config::{AuthConfig, ConfigError, WardenConfig};

const MULTI_GUARD: &str = r#"
auth:
  defaults:
    guard: web
  guards:
    web:   { driver: session, provider: users }
    api:   { driver: token,   provider: users }
    admin: { driver: session, provider: admins }
  providers:
    users:  { model: user }
    admins: { model: admin }
"#;

#[test]
fn test_empty_document_uses_defaults() {
    let config = WardenConfig::from_yaml_str("").unwrap();
    assert_eq!(config.permission.collection_names.roles, "roles");
    assert_eq!(config.permission.collection_names.permissions, "permissions");
    assert_eq!(config.permission.cache.key, "warden.permission.cache");
    assert_eq!(config.auth.defaults.guard, "web");
    assert!(config.auth.guards.is_empty());
}

#[test]
fn test_guards_keep_declaration_order() {
    let config = WardenConfig::from_yaml_str(MULTI_GUARD).unwrap();
    let names: Vec<&str> = config.auth.guards.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["web", "api", "admin"]);
    assert_eq!(config.auth.guards[1].1.driver.as_deref(), Some("token"));
}

#[test]
fn test_model_for_guard() {
    let config = WardenConfig::from_yaml_str(MULTI_GUARD).unwrap();
    assert_eq!(config.auth.model_for_guard("api"), Some("user"));
    assert_eq!(config.auth.model_for_guard("admin"), Some("admin"));
    assert_eq!(config.auth.model_for_guard("missing"), None);
}

#[test]
fn test_custom_collection_names() {
    let yaml = r#"
permission:
  collection_names:
    roles: acl_roles
  cache:
    key: custom.key
"#;
    let config = WardenConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.permission.collection_names.roles, "acl_roles");
    assert_eq!(config.permission.collection_names.permissions, "permissions");
    assert_eq!(config.permission.cache.key, "custom.key");
}

#[test]
fn test_undeclared_provider_is_invalid() {
    let yaml = r#"
auth:
  guards:
    web: { provider: nobody }
"#;
    let err = WardenConfig::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("nobody"));
}

#[test]
fn test_empty_default_guard_is_invalid() {
    let err = WardenConfig::from_yaml_str("auth:\n  defaults:\n    guard: \"\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_malformed_yaml_is_load_error() {
    let err = WardenConfig::from_yaml_str("auth: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_builder_matches_yaml() {
    let auth = AuthConfig::new("web")
        .with_guard("web", "users")
        .with_guard("api", "users")
        .with_provider("users", "user");
    let config = WardenConfig::default().with_auth(auth);
    assert!(config.validate().is_ok());
    assert_eq!(config.auth.model_for_guard("web"), Some("user"));
}

#[test]
#[serial]
fn test_load_merges_profile_over_base() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("warden.yaml"), MULTI_GUARD).unwrap();
    std::fs::write(
        dir.path().join("warden-test.yaml"),
        "auth:\n  defaults:\n    guard: api\npermission:\n  cache:\n    key: test.cache\n",
    )
    .unwrap();

    let config = WardenConfig::load_from(dir.path(), "test").unwrap();
    assert_eq!(config.auth.defaults.guard, "api");
    assert_eq!(config.permission.cache.key, "test.cache");
    assert_eq!(config.auth.guards.len(), 3);
}

#[test]
#[serial]
fn test_env_overrides_default_guard() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("warden.yaml"), MULTI_GUARD).unwrap();

    std::env::set_var("WARDEN_DEFAULT_GUARD", "admin");
    let config = WardenConfig::load_from(dir.path(), "dev");
    std::env::remove_var("WARDEN_DEFAULT_GUARD");

    assert_eq!(config.unwrap().auth.defaults.guard, "admin");
}

#[test]
#[serial]
fn test_missing_files_yield_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = WardenConfig::from_file(&dir.path().join("absent.yaml")).unwrap();
    assert_eq!(config.auth.defaults.guard, "web");
}
