use colored::Colorize;
use warden::Permission;

use super::{CommandResult, Context};

/// Create a permission under `guard`, or the default guard.
///
/// Fails if a permission with that name already exists for the guard.
pub async fn run(ctx: &Context, name: &str, guard: Option<&str>) -> CommandResult<Permission> {
    let warden = ctx.open().await?;
    let permission = warden.permissions().create(name, guard).await?;
    println!(
        "{} Permission `{}` created",
        "✓".green(),
        permission.name.bold()
    );
    Ok(permission)
}
