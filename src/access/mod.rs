//! Role and permission composition
//!
//! This module resolves granted permissions for the active roles, filters
//! applet routes, builds the administrative permission matrix and holds the
//! persisted role selection.

pub mod matrix;
pub mod resolver;
pub mod routes;
pub mod selection;
pub mod user;
