//! Permission registrar: the cached role/permission snapshot.
//!
//! The registrar is the only owner of the cache entry. Reads go through
//! [`PermissionRegistrar::register_permissions`], which serves the snapshot from
//! the [`CacheStore`] when present and otherwise loads the whole graph with a
//! single store query. Every mutation of roles, permissions, or their
//! associations calls [`PermissionRegistrar::forget_cached_permissions`].

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use warden_cache::{get_json, set_json, CacheStore};
use warden_core::{EntityId, PermissionError};
use warden_data::{AuthorizationStore, Permission, PermissionGraph, Role};

/// One row of the flattened role/permission join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissionRow {
    pub role_id: EntityId,
    pub role_name: String,
    pub role_guard_name: String,
    pub permission_id: EntityId,
    pub permission_name: String,
    pub permission_guard_name: String,
}

impl RolePermissionRow {
    pub fn role(&self) -> Role {
        Role {
            id: self.role_id,
            name: self.role_name.clone(),
            guard_name: self.role_guard_name.clone(),
        }
    }
}

/// The cached snapshot: every permission plus the ordered role/permission rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSnapshot {
    pub permissions: Vec<Permission>,
    pub rows: Vec<RolePermissionRow>,
}

impl PermissionSnapshot {
    /// Flatten a loaded graph, role by role, in store order.
    pub fn from_graph(graph: PermissionGraph) -> Self {
        let mut rows = Vec::new();
        for entry in &graph.roles {
            for permission_id in &entry.permission_ids {
                let Some(permission) = graph.permissions.iter().find(|p| p.id == *permission_id)
                else {
                    continue;
                };
                rows.push(RolePermissionRow {
                    role_id: entry.role.id,
                    role_name: entry.role.name.clone(),
                    role_guard_name: entry.role.guard_name.clone(),
                    permission_id: permission.id,
                    permission_name: permission.name.clone(),
                    permission_guard_name: permission.guard_name.clone(),
                });
            }
        }
        Self {
            permissions: graph.permissions,
            rows,
        }
    }

    pub fn find_permission(&self, name: &str, guard_name: &str) -> Option<&Permission> {
        self.permissions
            .iter()
            .find(|p| p.name == name && p.guard_name == guard_name)
    }

    pub fn find_permission_by_id(&self, id: EntityId) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.id == id)
    }

    /// Roles owning `permission_id`, in row order.
    pub fn roles_with_permission(&self, permission_id: EntityId) -> Vec<Role> {
        self.rows
            .iter()
            .filter(|row| row.permission_id == permission_id)
            .map(RolePermissionRow::role)
            .collect()
    }

    pub fn role_ids_with_permission(&self, permission_id: EntityId) -> Vec<EntityId> {
        self.rows
            .iter()
            .filter(|row| row.permission_id == permission_id)
            .map(|row| row.role_id)
            .collect()
    }
}

/// Clonable handle to the registrar. Clones share the cache and counters.
#[derive(Clone)]
pub struct PermissionRegistrar {
    store: Arc<dyn AuthorizationStore>,
    cache: Arc<dyn CacheStore>,
    key: Arc<str>,
    invalidations: Arc<AtomicU64>,
}

impl PermissionRegistrar {
    pub fn new(
        store: Arc<dyn AuthorizationStore>,
        cache: Arc<dyn CacheStore>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            store,
            cache,
            key: Arc::from(key.into()),
            invalidations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Cache key of the snapshot.
    pub fn cache_key(&self) -> &str {
        &self.key
    }

    /// Return the snapshot, loading it with one store query on a miss.
    ///
    /// While the cache holds a snapshot this touches the store zero times.
    pub async fn register_permissions(&self) -> Result<PermissionSnapshot, PermissionError> {
        match get_json::<PermissionSnapshot>(self.cache.as_ref(), &self.key).await {
            Ok(Some(snapshot)) => {
                tracing::trace!(key = %self.key, rows = snapshot.rows.len(), "permission cache hit");
                return Ok(snapshot);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unreadable permission cache");
            }
        }

        let generation = self.invalidations.load(Ordering::Acquire);
        let graph = self.store.load_permission_graph().await?;
        let snapshot = PermissionSnapshot::from_graph(graph);

        // A graph loaded across an invalidation may be stale: serve it to this
        // caller but never leave it cached. The second check catches an
        // invalidation that lands between the first check and the write.
        if self.invalidations.load(Ordering::Acquire) != generation {
            return Ok(snapshot);
        }
        set_json(self.cache.as_ref(), &self.key, &snapshot)
            .await
            .map_err(|e| PermissionError::Cache(e.to_string()))?;
        if self.invalidations.load(Ordering::Acquire) != generation {
            self.cache.remove(&self.key).await;
            tracing::debug!(key = %self.key, "stale permission cache fill discarded");
            return Ok(snapshot);
        }
        tracing::debug!(
            key = %self.key,
            permissions = snapshot.permissions.len(),
            rows = snapshot.rows.len(),
            "permission cache filled"
        );
        Ok(snapshot)
    }

    /// Every permission, derived from the snapshot.
    pub async fn get_permissions(&self) -> Result<Vec<Permission>, PermissionError> {
        Ok(self.register_permissions().await?.permissions)
    }

    /// Drop the cached snapshot. Unconditional.
    pub async fn forget_cached_permissions(&self) {
        self.invalidations.fetch_add(1, Ordering::AcqRel);
        self.cache.remove(&self.key).await;
        tracing::debug!(key = %self.key, "permission cache invalidated");
    }

    /// Number of invalidations since the registrar was created.
    pub fn invalidation_count(&self) -> u64 {
        self.invalidations.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::AtomicBool;
    use std::sync::OnceLock;
    use warden_cache::InMemoryCache;
    use warden_core::Holder;
    use warden_data::InMemoryStore;

    fn registrar(store: Arc<InMemoryStore>) -> PermissionRegistrar {
        PermissionRegistrar::new(store, Arc::new(InMemoryCache::new()), "test.cache")
    }

    #[tokio::test]
    async fn test_snapshot_rows_follow_role_order() {
        let store = Arc::new(InMemoryStore::new());
        let writer = store.insert_role(Role::new("writer", "web")).await.unwrap();
        let admin = store.insert_role(Role::new("admin", "web")).await.unwrap();
        let edit = store.insert_permission(Permission::new("edit", "web")).await.unwrap();
        let ban = store.insert_permission(Permission::new("ban", "web")).await.unwrap();
        store.attach_permissions(&Holder::role(writer.id), &[edit.id]).await.unwrap();
        store
            .attach_permissions(&Holder::role(admin.id), &[edit.id, ban.id])
            .await
            .unwrap();

        let snapshot = registrar(store).register_permissions().await.unwrap();
        let pairs: Vec<(&str, &str)> = snapshot
            .rows
            .iter()
            .map(|r| (r.role_name.as_str(), r.permission_name.as_str()))
            .collect();
        assert_eq!(pairs, vec![("writer", "edit"), ("admin", "edit"), ("admin", "ban")]);
        assert_eq!(snapshot.role_ids_with_permission(edit.id), vec![writer.id, admin.id]);
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry_is_reloaded() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_permission(Permission::new("edit", "web")).await.unwrap();
        let cache = Arc::new(InMemoryCache::new());
        cache.set("test.cache", bytes_of("garbage")).await;

        let registrar = PermissionRegistrar::new(store, cache, "test.cache");
        let permissions = registrar.get_permissions().await.unwrap();
        assert_eq!(permissions.len(), 1);
    }

    /// Cache whose first write is preceded by an invalidation, as if another
    /// task changed the graph while this one was filling the cache.
    struct InvalidatedDuringFill {
        inner: InMemoryCache,
        registrar: OnceLock<PermissionRegistrar>,
        fired: AtomicBool,
    }

    impl CacheStore for InvalidatedDuringFill {
        fn get<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = Option<bytes::Bytes>> + Send + 'a>> {
            self.inner.get(key)
        }

        fn set<'a>(&'a self, key: &'a str, value: bytes::Bytes) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            Box::pin(async move {
                if !self.fired.swap(true, Ordering::SeqCst) {
                    if let Some(registrar) = self.registrar.get() {
                        registrar.forget_cached_permissions().await;
                    }
                }
                self.inner.set(key, value).await;
            })
        }

        fn remove<'a>(&'a self, key: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
            self.inner.remove(key)
        }

        fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
            self.inner.clear()
        }
    }

    #[tokio::test]
    async fn test_fill_racing_an_invalidation_is_not_kept() {
        let store = Arc::new(InMemoryStore::new());
        store.insert_permission(Permission::new("edit", "web")).await.unwrap();
        let cache = Arc::new(InvalidatedDuringFill {
            inner: InMemoryCache::new(),
            registrar: OnceLock::new(),
            fired: AtomicBool::new(false),
        });
        let registrar = PermissionRegistrar::new(store, cache.clone(), "test.cache");
        let _ = cache.registrar.set(registrar.clone());

        let snapshot = registrar.register_permissions().await.unwrap();
        assert_eq!(snapshot.permissions.len(), 1);
        assert_eq!(registrar.invalidation_count(), 1);
        assert!(!cache.inner.contains_key("test.cache"));
    }

    fn bytes_of(s: &'static str) -> bytes::Bytes {
        bytes::Bytes::from_static(s.as_bytes())
    }
}
