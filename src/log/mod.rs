//! Persistence and audit logging
//!
//! This module provides the file-backed role selection store and JSONL
//! logging of role selection changes.

pub mod jsonl;
pub mod store;

pub use jsonl::{RoleChange, RoleHistory};
pub use store::FileRoleStore;
