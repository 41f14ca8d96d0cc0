use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warden_cli::commands::{create_permission, create_role, show, Context};

#[derive(Parser)]
#[command(name = "warden", version, about = "Warden CLI: manage roles and permissions")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "warden.yaml")]
    config: PathBuf,

    /// JSON file backing the role/permission store
    #[arg(long, global = true, default_value = "warden-store.json")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a permission
    CreatePermission {
        /// The name of the permission
        name: String,
        /// The name of the guard
        guard: Option<String>,
    },
    /// Create a role
    CreateRole {
        /// The name of the role
        name: String,
        /// The name of the guard
        guard: Option<String>,
        /// The name of a permission to give the role (repeatable)
        #[arg(long = "permission")]
        permissions: Vec<String>,
    },
    /// List roles and their permissions per guard
    Show,
}

#[tokio::main]
async fn main() {
    warden_cli::init_tracing();
    let cli = Cli::parse();
    let ctx = Context::new(cli.config, cli.store);

    let result = match cli.command {
        Commands::CreatePermission { name, guard } => {
            create_permission::run(&ctx, &name, guard.as_deref()).await.map(|_| ())
        }
        Commands::CreateRole {
            name,
            guard,
            permissions,
        } => create_role::run(&ctx, &name, guard.as_deref(), &permissions)
            .await
            .map(|_| ()),
        Commands::Show => show::run(&ctx).await.map(|_| ()),
    };

    if let Err(e) = result {
        eprintln!("{}", colored::Colorize::red(format!("Error: {e}").as_str()));
        std::process::exit(1);
    }
}
