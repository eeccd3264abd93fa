//! Host configuration
//!
//! This module handles applets.toml parsing, the permission requirement
//! table, and in-place edits of role assignments.

pub mod config;
pub mod edit;
pub mod requirements;
