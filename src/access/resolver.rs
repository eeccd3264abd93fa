//! Permission resolver for active role selections
//!
//! Resolves the permission keys granted by a set of active roles using an
//! additive model: the granted set is the union of every active role's
//! mapping. Unknown or unmapped roles contribute nothing.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Serialized form of [`RoleConfig`], validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct RawRoleConfig {
    roles: Vec<String>,
    #[serde(default)]
    permission_mappings: BTreeMap<String, Vec<String>>,
}

/// The authoritative role → permission mapping for a host deployment.
///
/// Invariants enforced at construction:
/// - role names are unique and non-empty
/// - every role with a mapping is listed in `roles`
/// - each role's mapping holds every key at most once, in first-seen order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawRoleConfig", into = "RawRoleConfig")]
pub struct RoleConfig {
    roles: Vec<String>,
    permission_mappings: BTreeMap<String, Vec<String>>,
}

impl RoleConfig {
    /// Build a validated role configuration.
    pub fn new(
        roles: Vec<String>,
        permission_mappings: BTreeMap<String, Vec<String>>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for role in &roles {
            if role.trim().is_empty() {
                bail!("Role name cannot be empty");
            }
            if !seen.insert(role.as_str()) {
                bail!("Duplicate role: '{role}'");
            }
        }

        let mut mappings = BTreeMap::new();
        for (role, keys) in permission_mappings {
            if !seen.contains(role.as_str()) {
                bail!("Permission mapping references unknown role '{role}'");
            }
            let mut unique = HashSet::new();
            let keys: Vec<String> = keys
                .into_iter()
                .filter(|k| unique.insert(k.clone()))
                .collect();
            mappings.insert(role, keys);
        }

        Ok(Self {
            roles,
            permission_mappings: mappings,
        })
    }

    /// All declared roles, in declaration order.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Whether `role` is declared.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// The keys mapped to `role`. Empty for unknown or unmapped roles.
    #[must_use]
    pub fn permissions_for(&self, role: &str) -> &[String] {
        self.permission_mappings
            .get(role)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The full mapping, keyed by role.
    #[must_use]
    pub const fn permission_mappings(&self) -> &BTreeMap<String, Vec<String>> {
        &self.permission_mappings
    }
}

impl TryFrom<RawRoleConfig> for RoleConfig {
    type Error = anyhow::Error;

    fn try_from(raw: RawRoleConfig) -> Result<Self> {
        Self::new(raw.roles, raw.permission_mappings)
    }
}

impl From<RoleConfig> for RawRoleConfig {
    fn from(config: RoleConfig) -> Self {
        Self {
            roles: config.roles,
            permission_mappings: config.permission_mappings,
        }
    }
}

/// Union of the permission keys mapped to each active role.
#[must_use]
pub fn granted_permissions<'a, S: AsRef<str>>(
    active_roles: &[S],
    config: &'a RoleConfig,
) -> BTreeSet<&'a str> {
    active_roles
        .iter()
        .flat_map(|role| config.permissions_for(role.as_ref()))
        .map(String::as_str)
        .collect()
}

/// Whether any active role grants `key`.
#[must_use]
pub fn has_permission<S: AsRef<str>>(key: &str, active_roles: &[S], config: &RoleConfig) -> bool {
    active_roles
        .iter()
        .any(|role| config.permissions_for(role.as_ref()).iter().any(|k| k == key))
}

/// Whether the active roles grant at least one of `keys`.
///
/// An empty `keys` set is always satisfied: a route that requires nothing is
/// visible to everyone.
#[must_use]
pub fn has_any_permission<K: AsRef<str>, S: AsRef<str>>(
    keys: &[K],
    active_roles: &[S],
    config: &RoleConfig,
) -> bool {
    if keys.is_empty() {
        return true;
    }
    let granted = granted_permissions(active_roles, config);
    keys.iter().any(|k| granted.contains(k.as_ref()))
}
