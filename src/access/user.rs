//! The signed-in user and the permissions their roles derive.

use serde::{Deserialize, Serialize};

use crate::access::resolver::{granted_permissions, RoleConfig};

/// A user with role-derived permissions.
///
/// `permissions` is computed from `roles` at construction and is not
/// authoritative: the resolver is always consulted for access decisions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Stable user identifier
    pub id: String,
    /// Contact email
    pub email: String,
    /// Display name
    pub name: String,
    /// Assigned roles
    pub roles: Vec<String>,
    /// Keys granted by `roles`, sorted
    pub permissions: Vec<String>,
}

impl User {
    /// Create a user, deriving permissions from `roles` against `config`.
    #[must_use]
    pub fn new(id: &str, email: &str, name: &str, roles: Vec<String>, config: &RoleConfig) -> Self {
        let permissions = granted_permissions(&roles, config)
            .into_iter()
            .map(ToString::to_string)
            .collect();
        Self {
            id: id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            roles,
            permissions,
        }
    }

    /// Roles this user holds that are also in `available`, in the user's order.
    #[must_use]
    pub fn available_roles<'a>(&'a self, available: &[String]) -> Vec<&'a str> {
        self.roles
            .iter()
            .filter(|r| available.contains(*r))
            .map(String::as_str)
            .collect()
    }
}
