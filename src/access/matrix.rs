//! Permission matrix for role administration views
//!
//! Groups every declared permission by applet and flags whether the active
//! roles hold it. Pure and cheap enough to rebuild on every render.

use serde::{Deserialize, Serialize};

use crate::access::resolver::{has_permission, RoleConfig};
use crate::host::config::AppletMount;

/// Key of the placeholder row shown for applets that declare no permissions
pub const NO_PERMISSIONS_KEY: &str = "no-permissions";

const NO_PERMISSIONS_LABEL: &str = "No permissions declared";

/// One permission and whether the active roles hold it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionRow {
    /// Namespaced permission key
    pub key: String,
    /// Display label
    pub label: String,
    /// Whether the active roles grant this key
    pub has_access: bool,
}

impl PermissionRow {
    fn placeholder() -> Self {
        Self {
            key: NO_PERMISSIONS_KEY.to_string(),
            label: NO_PERMISSIONS_LABEL.to_string(),
            has_access: false,
        }
    }

    /// Whether this is the placeholder row of an applet with no permissions
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.key == NO_PERMISSIONS_KEY
    }
}

/// The permission rows of one applet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PermissionGroup {
    /// Applet id
    pub applet_id: String,
    /// Applet label
    pub label: String,
    /// Applet icon reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Rows in declaration order
    pub permissions: Vec<PermissionRow>,
}

impl PermissionGroup {
    /// Number of rows the active roles have access to
    #[must_use]
    pub fn granted_count(&self) -> usize {
        self.permissions.iter().filter(|p| p.has_access).count()
    }
}

/// Build one group per mount, in mount order.
#[must_use]
pub fn build_matrix<S: AsRef<str>>(
    mounts: &[AppletMount],
    config: &RoleConfig,
    active_roles: &[S],
) -> Vec<PermissionGroup> {
    mounts
        .iter()
        .map(|mount| {
            let permissions = if mount.permissions.is_empty() {
                vec![PermissionRow::placeholder()]
            } else {
                mount
                    .permissions
                    .iter()
                    .map(|p| PermissionRow {
                        key: p.key.clone(),
                        label: p.label.clone(),
                        has_access: has_permission(&p.key, active_roles, config),
                    })
                    .collect()
            };

            PermissionGroup {
                applet_id: mount.id.clone(),
                label: mount.label.clone(),
                icon: mount.icon.clone(),
                permissions,
            }
        })
        .collect()
}
