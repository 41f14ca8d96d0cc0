use std::collections::BTreeMap;

use colored::Colorize;
use warden::{Permission, Role};

use super::{CommandResult, Context};

/// Roles of one guard with the names of their permissions.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GuardListing {
    pub roles: Vec<(String, Vec<String>)>,
    /// Permissions of the guard that no role owns.
    pub unassigned: Vec<String>,
}

/// Print every guard's roles and their permissions, and return the listing.
pub async fn run(ctx: &Context) -> CommandResult<BTreeMap<String, GuardListing>> {
    let warden = ctx.open().await?;
    let graph = warden.store().load_permission_graph().await?;
    let listing = group(&graph.permissions, graph.roles.iter().map(|r| (&r.role, &r.permission_ids[..])));

    if listing.is_empty() {
        println!("{}", "No roles or permissions defined".dimmed());
    }
    for (guard, entry) in &listing {
        println!("{} {}", "Guard".bold(), guard.cyan().bold());
        for (role, permissions) in &entry.roles {
            if permissions.is_empty() {
                println!("  {} {}", role.green(), "(no permissions)".dimmed());
            } else {
                println!("  {} {}", role.green(), permissions.join(", "));
            }
        }
        if !entry.unassigned.is_empty() {
            println!("  {} {}", "unassigned:".yellow(), entry.unassigned.join(", "));
        }
    }
    Ok(listing)
}

fn group<'a>(
    permissions: &[Permission],
    roles: impl Iterator<Item = (&'a Role, &'a [warden::EntityId])>,
) -> BTreeMap<String, GuardListing> {
    let mut listing: BTreeMap<String, GuardListing> = BTreeMap::new();
    let mut owned = Vec::new();

    for (role, ids) in roles {
        let mut names: Vec<String> = permissions
            .iter()
            .filter(|p| ids.contains(&p.id))
            .map(|p| p.name.clone())
            .collect();
        names.sort();
        owned.extend_from_slice(ids);
        listing
            .entry(role.guard_name.clone())
            .or_default()
            .roles
            .push((role.name.clone(), names));
    }
    for permission in permissions {
        if !owned.contains(&permission.id) {
            listing
                .entry(permission.guard_name.clone())
                .or_default()
                .unassigned
                .push(permission.name.clone());
        }
    }
    for entry in listing.values_mut() {
        entry.roles.sort();
        entry.unassigned.sort();
    }
    listing
}
