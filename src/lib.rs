//! Applet shell - role-scoped navigation for a micro-frontend host
//!
//! The shell composes independently declared applets into one navigation
//! surface. Roles map to namespaced permissions, routes are filtered by the
//! active roles, and data views track optimistic mutations until their
//! operations commit or roll back.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod access;
pub mod cli;
pub mod dataview;
pub mod doctor;
pub mod host;
pub mod log;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use access::matrix::{build_matrix, PermissionGroup, PermissionRow};
pub use access::resolver::{has_any_permission, has_permission, RoleConfig};
pub use access::routes::{filter_routes, visible_routes, AppletContext, AppletRoute};
pub use access::selection::{MemoryRoleStore, RoleSelection, RoleStorage};
pub use access::user::User;
pub use dataview::bulk::{available_actions, BulkAction};
pub use dataview::record::{EntityKey, PendingRecord};
pub use dataview::transaction::{PendingKind, PendingState, TransactionStore};
pub use doctor::{diagnose, DiagnosticReport, Finding, Severity};
pub use host::config::{AppletMount, HostConfig, PermissionDecl, Route};
pub use log::{FileRoleStore, RoleChange, RoleHistory};
