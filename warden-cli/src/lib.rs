//! # warden-cli
//!
//! Command-line tool for managing Warden roles and permissions.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `warden create-permission <name> [guard]` | Create a permission |
//! | `warden create-role <name> [guard] --permission <p>...` | Create a role and grant it permissions |
//! | `warden show` | List roles and their permissions per guard |
//!
//! Every command reads `--config` (default `warden.yaml`) and persists to the
//! JSON store given by `--store` (default `warden-store.json`).

pub mod commands;

use tracing_subscriber::EnvFilter;

/// Install the `fmt` subscriber, filtered by `RUST_LOG` (fallback `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}
