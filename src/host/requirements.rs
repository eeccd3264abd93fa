//! Permission requirement table
//!
//! Flattens applet permission declarations and the host's role assignments
//! into one table, then folds that table into a [`RoleConfig`].

use std::collections::BTreeMap;

use anyhow::Result;

use crate::access::resolver::RoleConfig;
use crate::host::config::AppletMount;

/// One declared permission and the roles the host assigned it to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRequirement {
    /// Declaring applet
    pub applet_id: String,
    /// Namespaced permission key
    pub permission_key: String,
    /// Roles granted this permission
    pub required_roles: Vec<String>,
}

/// Build the requirement table in applet order, then declaration order.
#[must_use]
pub fn requirement_table(applets: &[AppletMount]) -> Vec<PermissionRequirement> {
    applets
        .iter()
        .flat_map(|applet| {
            applet.permissions.iter().map(|perm| PermissionRequirement {
                applet_id: applet.id.clone(),
                permission_key: perm.key.clone(),
                required_roles: perm.roles.clone(),
            })
        })
        .collect()
}

/// Fold a requirement table into a role configuration.
///
/// A role gains a key iff the key's requirement lists that role. Keys keep
/// requirement-table order within each role. Roles with no assignment stay
/// unmapped.
pub fn build_role_config(
    roles: &[String],
    requirements: &[PermissionRequirement],
) -> Result<RoleConfig> {
    let mut mappings: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for requirement in requirements {
        for role in &requirement.required_roles {
            mappings
                .entry(role.clone())
                .or_default()
                .push(requirement.permission_key.clone());
        }
    }

    RoleConfig::new(roles.to_vec(), mappings)
}
