#![allow(dead_code)]

use std::sync::Arc;
use warden::prelude::*;
use warden::InMemoryStore;

pub const CONFIG: &str = r#"
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

pub struct User {
    pub id: u32,
    pub guard: Option<String>,
}

impl User {
    pub fn new(id: u32) -> Self {
        Self { id, guard: None }
    }

    pub fn on_guard(id: u32, guard: &str) -> Self {
        Self {
            id,
            guard: Some(guard.to_string()),
        }
    }
}

impl GuardScoped for User {
    const MODEL_TYPE: &'static str = "user";

    fn guard_name(&self) -> Option<&str> {
        self.guard.as_deref()
    }
}

impl Authorizable for User {
    fn subject_id(&self) -> String {
        self.id.to_string()
    }
}

pub struct Admin {
    pub id: u32,
}

impl GuardScoped for Admin {
    const MODEL_TYPE: &'static str = "admin";
}

impl Authorizable for Admin {
    fn subject_id(&self) -> String {
        self.id.to_string()
    }
}

pub struct Fixture {
    pub warden: Warden,
    pub store: Arc<InMemoryStore>,
}

pub fn setup() -> Fixture {
    let config = WardenConfig::from_yaml_str(CONFIG).unwrap();
    let store = Arc::new(InMemoryStore::with_collection_names(
        config.permission.collection_names.clone(),
    ));
    let warden = Warden::builder()
        .config(config)
        .store(store.clone())
        .build()
        .unwrap();
    Fixture { warden, store }
}

/// Run `op` and return how many times it invalidated the registrar cache.
pub async fn invalidations<F, Fut, T>(warden: &Warden, op: F) -> u64
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    let before = warden.registrar().invalidation_count();
    let _ = op().await;
    warden.registrar().invalidation_count() - before
}
