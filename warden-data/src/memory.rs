use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use warden_core::{CollectionNames, EntityId, Holder, SubjectKey};

use crate::entity::{
    Entity, Permission, PermissionGraph, Role, RoleWithPermissions, SubjectFilter,
};
use crate::error::DataError;
use crate::store::{AuthorizationStore, MODEL_HAS_PERMISSIONS, MODEL_HAS_ROLES, ROLE_HAS_PERMISSIONS};

/// One entry of the store's query log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRecord {
    pub collection: String,
    pub operation: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct HolderPermission {
    holder: Holder,
    permission_id: EntityId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SubjectRole {
    subject: SubjectKey,
    role_id: EntityId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct State {
    #[serde(default)]
    roles: Vec<Role>,
    #[serde(default)]
    permissions: Vec<Permission>,
    #[serde(default)]
    holder_permissions: Vec<HolderPermission>,
    #[serde(default)]
    subject_roles: Vec<SubjectRole>,
}

impl State {
    fn permission_ids_of(&self, holder: &Holder) -> Vec<EntityId> {
        self.holder_permissions
            .iter()
            .filter(|row| &row.holder == holder)
            .map(|row| row.permission_id)
            .collect()
    }

    fn with_permissions(&self, role: &Role) -> RoleWithPermissions {
        RoleWithPermissions {
            role: role.clone(),
            permission_ids: self.permission_ids_of(&Holder::role(role.id)),
        }
    }
}

/// In-memory [`AuthorizationStore`] with a query log.
///
/// Every trait call appends one [`QueryRecord`], which lets tests assert how
/// many round-trips an operation cost. When opened with [`open`](Self::open),
/// each mutation also writes a JSON snapshot of the whole store to disk.
pub struct InMemoryStore {
    state: RwLock<State>,
    names: CollectionNames,
    path: Option<PathBuf>,
    log: Mutex<Vec<QueryRecord>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_collection_names(CollectionNames::default())
    }

    pub fn with_collection_names(names: CollectionNames) -> Self {
        Self {
            state: RwLock::new(State::default()),
            names,
            path: None,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Open a file-backed store. A missing file starts an empty store.
    pub async fn open(path: impl AsRef<Path>, names: CollectionNames) -> Result<Self, DataError> {
        let path = path.as_ref().to_path_buf();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(DataError::database)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(e) => return Err(DataError::database(e)),
        };
        tracing::debug!(path = %path.display(), "opened store file");
        Ok(Self {
            state: RwLock::new(state),
            names,
            path: Some(path),
            log: Mutex::new(Vec::new()),
        })
    }

    /// Number of queries executed since creation or the last flush.
    pub fn query_count(&self) -> usize {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn queries(&self) -> Vec<QueryRecord> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn flush_query_log(&self) {
        self.log.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn record(&self, collection: &str, operation: &'static str) {
        tracing::trace!(collection, operation, "store query");
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(QueryRecord {
                collection: collection.to_string(),
                operation,
            });
    }

    fn pivot_for(holder: &Holder) -> &'static str {
        match holder {
            Holder::Role { .. } => ROLE_HAS_PERMISSIONS,
            Holder::Subject(_) => MODEL_HAS_PERMISSIONS,
        }
    }

    async fn mutate<R, F>(&self, f: F) -> Result<R, DataError>
    where
        F: FnOnce(&mut State) -> Result<R, DataError> + Send,
        R: Send,
    {
        let mut state = self.state.write().await;
        let Some(path) = &self.path else {
            return f(&mut *state);
        };
        // File-backed: the change only becomes visible once it is on disk.
        let mut next = state.clone();
        let out = f(&mut next)?;
        let bytes = serde_json::to_vec_pretty(&next).map_err(DataError::database)?;
        tokio::fs::write(path, bytes).await.map_err(DataError::database)?;
        *state = next;
        Ok(out)
    }
}

fn insert_unique<T: Entity + Clone>(items: &mut Vec<T>, item: T) -> Result<T, DataError> {
    if items
        .iter()
        .any(|e| e.name() == item.name() && e.guard_name() == item.guard_name())
    {
        return Err(DataError::Conflict(format!(
            "{} `{}` for guard `{}`",
            T::KIND,
            item.name(),
            item.guard_name()
        )));
    }
    items.push(item.clone());
    Ok(item)
}

fn update_unique<T: Entity + Clone>(items: &mut [T], item: &T) -> Result<(), DataError> {
    if items.iter().any(|e| {
        e.id() != item.id() && e.name() == item.name() && e.guard_name() == item.guard_name()
    }) {
        return Err(DataError::Conflict(format!(
            "{} `{}` for guard `{}`",
            T::KIND,
            item.name(),
            item.guard_name()
        )));
    }
    let slot = items
        .iter_mut()
        .find(|e| e.id() == item.id())
        .ok_or_else(|| DataError::NotFound(format!("{} {}", T::KIND, item.id())))?;
    *slot = item.clone();
    Ok(())
}

fn remove_by_id<T: Entity>(items: &mut Vec<T>, id: EntityId) -> Result<(), DataError> {
    let before = items.len();
    items.retain(|e| e.id() != id);
    if items.len() == before {
        return Err(DataError::NotFound(format!("{} {id}", T::KIND)));
    }
    Ok(())
}

fn find_named<'a, T: Entity>(items: &'a [T], name: &str, guard_name: &str) -> Option<&'a T> {
    items
        .iter()
        .find(|e| e.name() == name && e.guard_name() == guard_name)
}

fn matches_model(subject: &SubjectKey, model_type: Option<&str>) -> bool {
    model_type.map_or(true, |m| subject.model_type == m)
}

fn push_unique(out: &mut Vec<SubjectKey>, subject: &SubjectKey) {
    if !out.contains(subject) {
        out.push(subject.clone());
    }
}

#[async_trait]
impl AuthorizationStore for InMemoryStore {
    async fn insert_role(&self, role: Role) -> Result<Role, DataError> {
        self.record(&self.names.roles, "insert");
        self.mutate(|state| insert_unique(&mut state.roles, role)).await
    }

    async fn find_role(&self, name: &str, guard_name: &str) -> Result<Option<Role>, DataError> {
        self.record(&self.names.roles, "select");
        let state = self.state.read().await;
        Ok(find_named(&state.roles, name, guard_name).cloned())
    }

    async fn find_roles_by_ids(&self, ids: &[EntityId]) -> Result<Vec<Role>, DataError> {
        self.record(&self.names.roles, "select");
        let state = self.state.read().await;
        Ok(state
            .roles
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn update_role(&self, role: &Role) -> Result<(), DataError> {
        self.record(&self.names.roles, "update");
        self.mutate(|state| update_unique(&mut state.roles, role)).await
    }

    async fn delete_role(&self, id: EntityId) -> Result<(), DataError> {
        self.record(&self.names.roles, "delete");
        self.mutate(|state| remove_by_id(&mut state.roles, id)).await
    }

    async fn insert_permission(&self, permission: Permission) -> Result<Permission, DataError> {
        self.record(&self.names.permissions, "insert");
        self.mutate(|state| insert_unique(&mut state.permissions, permission))
            .await
    }

    async fn find_permission(
        &self,
        name: &str,
        guard_name: &str,
    ) -> Result<Option<Permission>, DataError> {
        self.record(&self.names.permissions, "select");
        let state = self.state.read().await;
        Ok(find_named(&state.permissions, name, guard_name).cloned())
    }

    async fn find_permissions_by_ids(&self, ids: &[EntityId]) -> Result<Vec<Permission>, DataError> {
        self.record(&self.names.permissions, "select");
        let state = self.state.read().await;
        Ok(state
            .permissions
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn update_permission(&self, permission: &Permission) -> Result<(), DataError> {
        self.record(&self.names.permissions, "update");
        self.mutate(|state| update_unique(&mut state.permissions, permission))
            .await
    }

    async fn delete_permission(&self, id: EntityId) -> Result<(), DataError> {
        self.record(&self.names.permissions, "delete");
        self.mutate(|state| remove_by_id(&mut state.permissions, id))
            .await
    }

    async fn load_permission_graph(&self) -> Result<PermissionGraph, DataError> {
        self.record(&self.names.permissions, "select_graph");
        let state = self.state.read().await;
        Ok(PermissionGraph {
            permissions: state.permissions.clone(),
            roles: state.roles.iter().map(|r| state.with_permissions(r)).collect(),
        })
    }

    async fn load_roles_with_permissions(
        &self,
        role_ids: &[EntityId],
    ) -> Result<Vec<RoleWithPermissions>, DataError> {
        self.record(&self.names.roles, "select_with_permissions");
        let state = self.state.read().await;
        Ok(state
            .roles
            .iter()
            .filter(|r| role_ids.contains(&r.id))
            .map(|r| state.with_permissions(r))
            .collect())
    }

    async fn permission_ids_of(&self, holder: &Holder) -> Result<Vec<EntityId>, DataError> {
        self.record(Self::pivot_for(holder), "select");
        Ok(self.state.read().await.permission_ids_of(holder))
    }

    async fn attach_permissions(&self, holder: &Holder, ids: &[EntityId]) -> Result<(), DataError> {
        self.record(Self::pivot_for(holder), "insert");
        self.mutate(|state| {
            for id in ids {
                let row = HolderPermission {
                    holder: holder.clone(),
                    permission_id: *id,
                };
                if !state.holder_permissions.contains(&row) {
                    state.holder_permissions.push(row);
                }
            }
            Ok(())
        })
        .await
    }

    async fn detach_permissions(&self, holder: &Holder, ids: &[EntityId]) -> Result<(), DataError> {
        self.record(Self::pivot_for(holder), "delete");
        self.mutate(|state| {
            state
                .holder_permissions
                .retain(|row| &row.holder != holder || !ids.contains(&row.permission_id));
            Ok(())
        })
        .await
    }

    async fn detach_all_permissions(&self, holder: &Holder) -> Result<(), DataError> {
        self.record(Self::pivot_for(holder), "delete");
        self.mutate(|state| {
            state.holder_permissions.retain(|row| &row.holder != holder);
            Ok(())
        })
        .await
    }

    async fn role_ids_of(&self, subject: &SubjectKey) -> Result<Vec<EntityId>, DataError> {
        self.record(MODEL_HAS_ROLES, "select");
        let state = self.state.read().await;
        Ok(state
            .subject_roles
            .iter()
            .filter(|row| &row.subject == subject)
            .map(|row| row.role_id)
            .collect())
    }

    async fn attach_roles(&self, subject: &SubjectKey, ids: &[EntityId]) -> Result<(), DataError> {
        self.record(MODEL_HAS_ROLES, "insert");
        self.mutate(|state| {
            for id in ids {
                let row = SubjectRole {
                    subject: subject.clone(),
                    role_id: *id,
                };
                if !state.subject_roles.contains(&row) {
                    state.subject_roles.push(row);
                }
            }
            Ok(())
        })
        .await
    }

    async fn detach_roles(&self, subject: &SubjectKey, ids: &[EntityId]) -> Result<(), DataError> {
        self.record(MODEL_HAS_ROLES, "delete");
        self.mutate(|state| {
            state
                .subject_roles
                .retain(|row| &row.subject != subject || !ids.contains(&row.role_id));
            Ok(())
        })
        .await
    }

    async fn detach_all_roles(&self, subject: &SubjectKey) -> Result<(), DataError> {
        self.record(MODEL_HAS_ROLES, "delete");
        self.mutate(|state| {
            state.subject_roles.retain(|row| &row.subject != subject);
            Ok(())
        })
        .await
    }

    async fn detach_role_everywhere(&self, role_id: EntityId) -> Result<(), DataError> {
        self.record(MODEL_HAS_ROLES, "delete_cascade");
        let holder = Holder::role(role_id);
        self.mutate(|state| {
            state.holder_permissions.retain(|row| row.holder != holder);
            state.subject_roles.retain(|row| row.role_id != role_id);
            Ok(())
        })
        .await
    }

    async fn detach_permission_everywhere(&self, permission_id: EntityId) -> Result<(), DataError> {
        self.record(MODEL_HAS_PERMISSIONS, "delete_cascade");
        self.mutate(|state| {
            state
                .holder_permissions
                .retain(|row| row.permission_id != permission_id);
            Ok(())
        })
        .await
    }

    async fn subjects_with_role(
        &self,
        role_id: EntityId,
        model_type: Option<&str>,
    ) -> Result<Vec<SubjectKey>, DataError> {
        self.record(MODEL_HAS_ROLES, "select");
        let state = self.state.read().await;
        let mut out = Vec::new();
        for row in &state.subject_roles {
            if row.role_id == role_id && matches_model(&row.subject, model_type) {
                push_unique(&mut out, &row.subject);
            }
        }
        Ok(out)
    }

    async fn subjects_with_permission(
        &self,
        permission_id: EntityId,
        model_type: Option<&str>,
    ) -> Result<Vec<SubjectKey>, DataError> {
        self.record(MODEL_HAS_PERMISSIONS, "select");
        let state = self.state.read().await;
        let mut out = Vec::new();
        for row in &state.holder_permissions {
            if row.permission_id != permission_id {
                continue;
            }
            if let Some(subject) = row.holder.as_subject() {
                if matches_model(subject, model_type) {
                    push_unique(&mut out, subject);
                }
            }
        }
        Ok(out)
    }

    async fn find_subjects(&self, filter: &SubjectFilter) -> Result<Vec<SubjectKey>, DataError> {
        self.record(MODEL_HAS_PERMISSIONS, "select_scope");
        let state = self.state.read().await;
        let model_type = filter.model_type.as_deref();
        let mut out = Vec::new();
        for row in &state.holder_permissions {
            if !filter.permission_ids.contains(&row.permission_id) {
                continue;
            }
            if let Some(subject) = row.holder.as_subject() {
                if matches_model(subject, model_type) {
                    push_unique(&mut out, subject);
                }
            }
        }
        for row in &state.subject_roles {
            if filter.role_ids.contains(&row.role_id) && matches_model(&row.subject, model_type) {
                push_unique(&mut out, &row.subject);
            }
        }
        Ok(out)
    }
}
