mod loader;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

fn default_roles_collection() -> String { "roles".to_string() }
fn default_permissions_collection() -> String { "permissions".to_string() }
fn default_cache_key() -> String { "warden.permission.cache".to_string() }
fn default_guard() -> String { "web".to_string() }

/// Error type for configuration operations.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O or YAML parsing error occurred while loading config files.
    Load(String),
    /// The configuration was parsed but is not usable.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Load(msg) => write!(f, "Config load error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level Warden configuration.
///
/// Every section has defaults, so an empty document is a valid config that
/// uses the `web` guard and the `roles` / `permissions` collections.
///
/// ```yaml
/// permission:
///   collection_names:
///     roles: roles
///     permissions: permissions
///   cache:
///     key: warden.permission.cache
/// auth:
///   defaults:
///     guard: web
///   guards:
///     web: { driver: session, provider: users }
///     api: { driver: token, provider: users }
///   providers:
///     users: { model: user }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub permission: PermissionConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Storage and cache settings for the permission subsystem.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionConfig {
    #[serde(default)]
    pub collection_names: CollectionNames,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Names of the backing collections (or tables) for roles and permissions.
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionNames {
    #[serde(default = "default_roles_collection")]
    pub roles: String,
    #[serde(default = "default_permissions_collection")]
    pub permissions: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            roles: default_roles_collection(),
            permissions: default_permissions_collection(),
        }
    }
}

/// Registrar cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Key under which the role/permission snapshot is stored.
    #[serde(default = "default_cache_key")]
    pub key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: default_cache_key(),
        }
    }
}

/// Authentication guards and providers, consumed (not owned) by Warden.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub defaults: AuthDefaults,
    /// Guards in declaration order.
    #[serde(default, deserialize_with = "ordered_guards")]
    pub guards: Vec<(String, GuardConfig)>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthDefaults {
    #[serde(default = "default_guard")]
    pub guard: String,
}

impl Default for AuthDefaults {
    fn default() -> Self {
        Self {
            guard: default_guard(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardConfig {
    pub driver: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    pub driver: Option<String>,
    /// Subject model type authenticated by this provider (e.g. `user`).
    pub model: Option<String>,
}

impl AuthConfig {
    /// Create an auth config with the given default guard and no guards.
    pub fn new(default_guard: impl Into<String>) -> Self {
        Self {
            defaults: AuthDefaults {
                guard: default_guard.into(),
            },
            guards: Vec::new(),
            providers: HashMap::new(),
        }
    }

    /// Declare a guard backed by `provider`. Declaration order is preserved.
    pub fn with_guard(mut self, name: impl Into<String>, provider: impl Into<String>) -> Self {
        self.guards.push((
            name.into(),
            GuardConfig {
                driver: None,
                provider: Some(provider.into()),
            },
        ));
        self
    }

    /// Declare a provider authenticating subjects of `model`.
    pub fn with_provider(mut self, name: impl Into<String>, model: impl Into<String>) -> Self {
        self.providers.insert(
            name.into(),
            ProviderConfig {
                driver: None,
                model: Some(model.into()),
            },
        );
        self
    }

    /// The subject model bound to `guard` through its provider, if any.
    pub fn model_for_guard(&self, guard: &str) -> Option<&str> {
        self.guards
            .iter()
            .find(|(name, _)| name == guard)
            .and_then(|(_, cfg)| cfg.provider.as_deref())
            .and_then(|provider| self.providers.get(provider))
            .and_then(|provider| provider.model.as_deref())
    }
}

impl WardenConfig {
    /// Load configuration for the given profile from the current directory.
    ///
    /// Resolution order (lowest to highest priority):
    /// 1. `warden.yaml`
    /// 2. `warden-{profile}.yaml` (deep-merged over the base)
    /// 3. `.env` and `.env.{profile}` (never overwrite set variables)
    /// 4. `WARDEN_DEFAULT_GUARD` / `WARDEN_CACHE_KEY` environment variables
    ///
    /// Profile is determined by: `WARDEN_PROFILE` env var > argument.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        Self::load_from(Path::new("."), profile)
    }

    /// Same as [`load`](Self::load) but looks for files in `dir`.
    pub fn load_from(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        let active_profile =
            std::env::var("WARDEN_PROFILE").unwrap_or_else(|_| profile.to_string());

        let mut root = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        loader::merge_yaml_file(&dir.join("warden.yaml"), &mut root)?;
        loader::merge_yaml_file(&dir.join(format!("warden-{active_profile}.yaml")), &mut root)?;

        let _ = dotenvy::from_path(dir.join(".env"));
        let _ = dotenvy::from_path(dir.join(format!(".env.{active_profile}")));

        let mut config: WardenConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        tracing::debug!(profile = %active_profile, guards = config.auth.guards.len(), "loaded warden config");
        Ok(config)
    }

    /// Load a single YAML file, then apply environment overrides.
    ///
    /// A missing file yields the default configuration.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut root = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        loader::merge_yaml_file(path, &mut root)?;
        let mut config: WardenConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML string (useful for testing). No environment overlay.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let mut root = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        loader::merge_yaml_str(yaml, &mut root)?;
        let config: WardenConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the auth section.
    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.defaults.guard.is_empty() {
            return Err(ConfigError::Invalid("auth.defaults.guard cannot be empty".into()));
        }
        if self.permission.collection_names.roles.is_empty()
            || self.permission.collection_names.permissions.is_empty()
        {
            return Err(ConfigError::Invalid("collection names cannot be empty".into()));
        }
        if self.permission.cache.key.is_empty() {
            return Err(ConfigError::Invalid("permission.cache.key cannot be empty".into()));
        }
        for (name, guard) in &self.auth.guards {
            if let Some(provider) = &guard.provider {
                if !self.auth.providers.contains_key(provider) {
                    return Err(ConfigError::Invalid(format!(
                        "guard '{name}' uses undeclared provider '{provider}'"
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(guard) = std::env::var("WARDEN_DEFAULT_GUARD") {
            self.auth.defaults.guard = guard;
        }
        if let Ok(key) = std::env::var("WARDEN_CACHE_KEY") {
            self.permission.cache.key = key;
        }
    }
}

/// Deserialize a guard map into a `Vec`, keeping declaration order.
fn ordered_guards<'de, D>(deserializer: D) -> Result<Vec<(String, GuardConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GuardsVisitor;

    impl<'de> Visitor<'de> for GuardsVisitor {
        type Value = Vec<(String, GuardConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of guard names to guard settings")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut guards = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, guard)) = map.next_entry::<String, GuardConfig>()? {
                guards.push((name, guard));
            }
            Ok(guards)
        }
    }

    deserializer.deserialize_map(GuardsVisitor)
}
