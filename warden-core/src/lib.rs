//! Core types shared by every Warden crate.
//!
//! - [`config`]: YAML configuration with profile overlays and env overrides
//! - [`guards`]: guard resolution for subjects and subject types
//! - [`types`]: entity ids, subject keys, permission holders
//! - [`error`]: the authorization error taxonomy

pub mod config;
pub mod error;
pub mod guards;
#[cfg(feature = "axum")]
mod http;
pub mod types;

pub use config::{
    AuthConfig, AuthDefaults, CacheConfig, CollectionNames, ConfigError, GuardConfig,
    PermissionConfig, ProviderConfig, WardenConfig,
};
pub use error::PermissionError;
pub use guards::{GuardResolver, GuardScoped};
pub use types::{EntityId, Holder, SubjectKey};
