use std::sync::Arc;
use warden_cache::{CacheStore, InMemoryCache};
use warden_core::{ConfigError, GuardResolver, PermissionError, SubjectKey, WardenConfig};
use warden_data::{AuthorizationStore, InMemoryStore, Role, SubjectFilter};

use crate::has_permissions::HasPermissions;
use crate::has_roles::HasRoles;
use crate::permissions::Permissions;
use crate::reference::PermissionRef;
use crate::registrar::PermissionRegistrar;
use crate::roles::Roles;
use crate::subject::Authorizable;

/// Clonable handle to the authorization engine.
///
/// Owns the configuration, the guard resolver, the injected store, and the
/// registrar. Clones share all of them.
///
/// ```ignore
/// let warden = Warden::builder()
///     .config(WardenConfig::load("prod")?)
///     .store(Arc::new(my_store))
///     .build()?;
///
/// warden.permissions().create("edit-articles", None).await?;
/// let editor = warden.roles().create("editor", None).await?;
/// warden.role_permissions(&editor).give_permission_to(["edit-articles"]).await?;
///
/// warden.roles_of(&user).assign_role(["editor"]).await?;
/// assert!(warden.permissions_of(&user).has_permission_to("edit-articles").await?);
/// ```
#[derive(Clone)]
pub struct Warden {
    config: Arc<WardenConfig>,
    guards: Arc<GuardResolver>,
    store: Arc<dyn AuthorizationStore>,
    registrar: PermissionRegistrar,
}

impl Warden {
    pub fn builder() -> WardenBuilder {
        WardenBuilder::default()
    }

    /// Engine over `store` with an in-memory registrar cache.
    pub fn new(config: WardenConfig, store: Arc<dyn AuthorizationStore>) -> Self {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
        Self::assemble(config, store, cache)
    }

    fn assemble(
        config: WardenConfig,
        store: Arc<dyn AuthorizationStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let registrar =
            PermissionRegistrar::new(store.clone(), cache, config.permission.cache.key.clone());
        Self {
            guards: Arc::new(GuardResolver::new(config.auth.clone())),
            config: Arc::new(config),
            store,
            registrar,
        }
    }

    pub fn config(&self) -> &WardenConfig {
        &self.config
    }

    pub fn guards(&self) -> &GuardResolver {
        &self.guards
    }

    pub fn store(&self) -> &dyn AuthorizationStore {
        self.store.as_ref()
    }

    pub fn registrar(&self) -> &PermissionRegistrar {
        &self.registrar
    }

    /// Role factory and lookups.
    pub fn roles(&self) -> Roles<'_> {
        Roles::new(self)
    }

    /// Permission factory and lookups.
    pub fn permissions(&self) -> Permissions<'_> {
        Permissions::new(self)
    }

    /// Permission operations for a subject.
    pub fn permissions_of<S: Authorizable + ?Sized>(&self, subject: &S) -> HasPermissions {
        HasPermissions::for_subject(self.clone(), subject)
    }

    /// Role operations for a subject.
    pub fn roles_of<S: Authorizable + ?Sized>(&self, subject: &S) -> HasRoles {
        HasRoles::new(self.clone(), subject)
    }

    /// Permission operations for a role.
    pub fn role_permissions(&self, role: &Role) -> HasPermissions {
        HasPermissions::for_role(self.clone(), role)
    }

    /// Filter selecting subjects of type `S` that hold any of `permissions`,
    /// directly or through a role owning one of them.
    ///
    /// Names are resolved under the default guard of `S`.
    pub async fn scope_permission<S, I, P>(&self, permissions: I) -> Result<SubjectFilter, PermissionError>
    where
        S: Authorizable + ?Sized,
        I: IntoIterator<Item = P>,
        P: Into<PermissionRef>,
    {
        let refs: Vec<PermissionRef> = permissions.into_iter().map(Into::into).collect();
        let guard = self.guards.default_name_for_type::<S>();
        let snapshot = self.registrar.register_permissions().await?;

        let mut filter = SubjectFilter {
            model_type: Some(S::MODEL_TYPE.to_string()),
            ..SubjectFilter::default()
        };
        for reference in refs {
            let permission = self.permissions().resolve_in(&snapshot, reference, &guard)?;
            for role_id in snapshot.role_ids_with_permission(permission.id) {
                if !filter.role_ids.contains(&role_id) {
                    filter.role_ids.push(role_id);
                }
            }
            if !filter.permission_ids.contains(&permission.id) {
                filter.permission_ids.push(permission.id);
            }
        }
        Ok(filter)
    }

    /// Run [`scope_permission`](Self::scope_permission) against the store.
    pub async fn subjects_with_permissions<S, I, P>(
        &self,
        permissions: I,
    ) -> Result<Vec<SubjectKey>, PermissionError>
    where
        S: Authorizable + ?Sized,
        I: IntoIterator<Item = P>,
        P: Into<PermissionRef>,
    {
        let filter = self.scope_permission::<S, I, P>(permissions).await?;
        if filter.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.find_subjects(&filter).await?)
    }
}

/// Builder for [`Warden`]. Store and cache default to the in-memory backends.
#[derive(Default)]
pub struct WardenBuilder {
    config: Option<WardenConfig>,
    store: Option<Arc<dyn AuthorizationStore>>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl WardenBuilder {
    pub fn config(mut self, config: WardenConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: Arc<dyn AuthorizationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Warden, ConfigError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let store = self.store.unwrap_or_else(|| {
            Arc::new(InMemoryStore::with_collection_names(
                config.permission.collection_names.clone(),
            ))
        });
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryCache::new()));
        tracing::debug!(
            default_guard = %config.auth.defaults.guard,
            cache_key = %config.permission.cache.key,
            "warden initialized"
        );
        Ok(Warden::assemble(config, store, cache))
    }
}
