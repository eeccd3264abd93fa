//! Host configuration parser
//!
//! Parses `applets.toml` into the roles, optional signed-in user and applet
//! mounts the host shell serves.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::access::resolver::RoleConfig;
use crate::access::user::User;
use crate::host::requirements::{build_role_config, requirement_table};

/// Default storage key for the persisted role selection
pub const DEFAULT_STORAGE_KEY: &str = "applet-shell.roles";

/// Per-applet shortcut from a role to the single permission key it unlocks
pub type ShortcutMapping = BTreeMap<String, String>;

/// Host-wide settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostSection {
    /// Every role the host knows, in display order
    pub roles: Vec<String>,
    /// Key the active role selection is persisted under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

/// The signed-in user as supplied by the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserConfig {
    /// Stable user identifier
    pub id: String,
    /// Contact email
    pub email: String,
    /// Display name
    pub name: String,
    /// Roles assigned to this user
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A permission declared by an applet, with the host's role assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionDecl {
    /// Namespaced key, e.g. `users:VIEW_USERS`
    pub key: String,
    /// Human-readable label for the permission matrix
    pub label: String,
    /// Roles the host assigns this permission to
    #[serde(default)]
    pub roles: Vec<String>,
}

/// A navigable path inside an applet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Route {
    /// Path, unique within its applet
    pub path: String,
    /// Navigation label
    pub label: String,
    /// Icon reference for the navigation entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Component reference the renderer mounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Any one of these keys makes the route visible. Empty means always visible.
    #[serde(default, rename = "permissions")]
    pub required_permissions: Vec<String>,
}

/// An applet mounted into the host shell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppletMount {
    /// Unique applet identifier, also the permission namespace
    pub id: String,
    /// Display label
    pub label: String,
    /// Icon reference for the permission matrix group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Declared permissions, in display order
    #[serde(default, rename = "permission")]
    pub permissions: Vec<PermissionDecl>,
    /// Routes, in navigation order
    #[serde(default, rename = "route")]
    pub routes: Vec<Route>,
    /// Optional role → key shortcut used instead of the full role config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_mapping: Option<ShortcutMapping>,
}

impl AppletMount {
    /// Find a declared permission by key
    #[must_use]
    pub fn get_permission(&self, key: &str) -> Option<&PermissionDecl> {
        self.permissions.iter().find(|p| p.key == key)
    }

    /// Whether this applet declares `key`
    #[must_use]
    pub fn declares(&self, key: &str) -> bool {
        self.get_permission(key).is_some()
    }
}

/// Top-level host configuration parsed from applets.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostConfig {
    /// Host-wide settings
    pub host: HostSection,
    /// The signed-in user, if the host supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserConfig>,
    /// Mounted applets, in declaration order
    #[serde(default, rename = "applet")]
    pub applets: Vec<AppletMount>,
}

impl HostConfig {
    /// Parse an applets.toml file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse applets.toml content from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse applets.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Find an applet by id
    #[must_use]
    pub fn get_applet(&self, id: &str) -> Option<&AppletMount> {
        self.applets.iter().find(|a| a.id == id)
    }

    /// Build the role configuration from the host's permission assignments
    pub fn role_config(&self) -> Result<RoleConfig> {
        build_role_config(&self.host.roles, &requirement_table(&self.applets))
    }

    /// The signed-in user with permissions derived from `roles`
    #[must_use]
    pub fn current_user(&self, roles: &RoleConfig) -> Option<User> {
        self.user
            .as_ref()
            .map(|u| User::new(&u.id, &u.email, &u.name, u.roles.clone(), roles))
    }

    fn is_role(&self, role: &str) -> bool {
        self.host.roles.iter().any(|r| r == role)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for role in &self.host.roles {
            if role.trim().is_empty() {
                bail!("Role name cannot be empty");
            }
            if !seen.insert(role) {
                bail!("Duplicate role: '{role}'");
            }
        }

        if self.host.storage_key.trim().is_empty() {
            bail!("Storage key cannot be empty");
        }

        if let Some(user) = &self.user {
            for role in &user.roles {
                if !self.is_role(role) {
                    bail!("User '{}' references unknown role '{role}'", user.id);
                }
            }
        }

        let mut applet_ids = HashSet::new();
        for applet in &self.applets {
            if applet.id.trim().is_empty() {
                bail!("Applet id cannot be empty");
            }
            if !applet_ids.insert(&applet.id) {
                bail!("Duplicate applet id: '{}'", applet.id);
            }
            self.validate_applet(applet)
                .with_context(|| format!("in applet '{}'", applet.id))?;
        }

        Ok(())
    }

    fn validate_applet(&self, applet: &AppletMount) -> Result<()> {
        let mut keys = HashSet::new();
        for perm in &applet.permissions {
            validate_declared_key(&applet.id, &perm.key)?;
            if !keys.insert(&perm.key) {
                bail!("Duplicate permission key: '{}'", perm.key);
            }
            for role in &perm.roles {
                if !self.is_role(role) {
                    bail!(
                        "Permission '{}' is assigned to unknown role '{role}'",
                        perm.key
                    );
                }
            }
        }

        let mut paths = HashSet::new();
        for route in &applet.routes {
            if route.path.trim().is_empty() {
                bail!("Route path cannot be empty");
            }
            if !paths.insert(&route.path) {
                bail!("Duplicate route path: '{}'", route.path);
            }
            for key in &route.required_permissions {
                validate_permission_key(key)
                    .with_context(|| format!("in route '{}'", route.path))?;
            }
        }

        if let Some(mapping) = &applet.permission_mapping {
            for (role, key) in mapping {
                if !self.is_role(role) {
                    bail!("Permission mapping references unknown role '{role}'");
                }
                if !applet.declares(key) {
                    bail!("Permission mapping for '{role}' references undeclared key '{key}'");
                }
            }
        }

        Ok(())
    }
}

/// Validate that a permission key has the form `namespace:NAME` with both
/// parts non-empty and no whitespace.
fn validate_permission_key(key: &str) -> Result<()> {
    let Some((namespace, name)) = key.split_once(':') else {
        bail!("Invalid permission '{key}': expected format 'applet:NAME'");
    };
    if namespace.is_empty() || name.is_empty() {
        bail!("Invalid permission '{key}': namespace and name cannot be empty");
    }
    if key.chars().any(char::is_whitespace) {
        bail!("Invalid permission '{key}': whitespace is not allowed");
    }
    Ok(())
}

/// Declared keys must additionally live in the declaring applet's namespace.
fn validate_declared_key(applet_id: &str, key: &str) -> Result<()> {
    validate_permission_key(key)?;
    if key.split_once(':').map(|(ns, _)| ns) != Some(applet_id) {
        bail!("Invalid permission '{key}': must be namespaced as '{applet_id}:NAME'");
    }
    Ok(())
}
