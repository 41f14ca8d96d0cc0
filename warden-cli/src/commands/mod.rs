//! Command implementations for the `warden` CLI.
//!
//! Each submodule corresponds to a top-level CLI command.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use warden::{InMemoryStore, Warden, WardenConfig};

/// Permission creation: `warden create-permission`.
pub mod create_permission;

/// Role creation: `warden create-role`.
///
/// Creates the role, then grants it the `--permission` list.
pub mod create_role;

/// Graph listing: `warden show`.
pub mod show;

pub type CommandResult<T> = Result<T, Box<dyn Error>>;

/// Where a command reads its configuration and persists its store.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: PathBuf,
    pub store: PathBuf,
}

impl Context {
    pub fn new(config: impl Into<PathBuf>, store: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
            store: store.into(),
        }
    }

    /// Build a [`Warden`] over the file-backed store.
    ///
    /// A missing config file falls back to the defaults; a missing store file
    /// starts empty and is created on the first write.
    pub async fn open(&self) -> CommandResult<Warden> {
        let config = WardenConfig::from_file(Path::new(&self.config))?;
        let store = InMemoryStore::open(&self.store, config.permission.collection_names.clone()).await?;
        tracing::debug!(store = %self.store.display(), "store opened");
        let warden = Warden::builder().config(config).store(Arc::new(store)).build()?;
        Ok(warden)
    }
}
