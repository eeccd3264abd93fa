//! Shared test utilities
//!
//! Common fixtures used across test modules. Only compiled in test builds.

use std::collections::BTreeMap;

use crate::access::resolver::RoleConfig;

/// A two-applet host: `users` (view + delete) and `reports` (view + an open
/// help page). Admin holds everything, User only `users:VIEW`.
pub const SAMPLE_HOST: &str = r#"
[host]
roles = ["Admin", "User"]

[user]
id = "u-1"
email = "ada@example.com"
name = "Ada"
roles = ["User"]

[[applet]]
id = "users"
label = "Users"
icon = "people"

[[applet.permission]]
key = "users:VIEW"
label = "View users"
roles = ["Admin", "User"]

[[applet.permission]]
key = "users:DELETE"
label = "Delete users"
roles = ["Admin"]

[[applet.route]]
path = "/users"
label = "User list"
component = "UserList"
permissions = ["users:VIEW"]

[[applet.route]]
path = "/users/admin"
label = "User administration"
permissions = ["users:DELETE"]

[[applet]]
id = "reports"
label = "Reports"

[[applet.permission]]
key = "reports:VIEW"
label = "View reports"
roles = ["Admin"]

[[applet.route]]
path = "/reports"
label = "Reports"
permissions = ["reports:VIEW"]

[[applet.route]]
path = "/reports/help"
label = "Help"
"#;

/// Admin holds `users:VIEW` and `users:DELETE`, User holds `users:VIEW`.
#[must_use]
pub fn two_role_config() -> RoleConfig {
    RoleConfig::new(
        vec!["Admin".to_string(), "User".to_string()],
        BTreeMap::from([
            (
                "Admin".to_string(),
                vec!["users:VIEW".to_string(), "users:DELETE".to_string()],
            ),
            ("User".to_string(), vec!["users:VIEW".to_string()]),
        ]),
    )
    .unwrap()
}
