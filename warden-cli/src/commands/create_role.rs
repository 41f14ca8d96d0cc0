use colored::Colorize;
use warden::{Permission, Role};

use super::{CommandResult, Context};

/// Create a role under `guard` (or the default guard) and give it `permissions`.
///
/// Permissions are looked up by name under the role's guard; an unknown name
/// fails after the role has been created, and nothing is granted.
pub async fn run(
    ctx: &Context,
    name: &str,
    guard: Option<&str>,
    permissions: &[String],
) -> CommandResult<(Role, Vec<Permission>)> {
    let warden = ctx.open().await?;
    let role = warden.roles().create(name, guard).await?;
    println!("{} Role `{}` created", "✓".green(), role.name.bold());

    if permissions.is_empty() {
        return Ok((role, Vec::new()));
    }

    let holder = warden.role_permissions(&role);
    holder.give_permission_to(permissions.iter()).await?;
    let granted = holder.permissions().await?;
    let names: Vec<&str> = granted.iter().map(|p| p.name.as_str()).collect();
    println!(
        "{} Permissions `{}` has been given to role `{}`",
        "✓".green(),
        names.join("`, `"),
        role.name.bold()
    );
    Ok((role, granted))
}
