//! In-place edits of host role assignments
//!
//! Grants and revokes roles on a declared permission by rewriting only that
//! permission's `roles` array, leaving comments and layout of the rest of
//! applets.toml untouched. The edited document is re-validated before it is
//! returned.

use std::path::Path;

use anyhow::{bail, Context, Result};
use toml_edit::{Array, DocumentMut, Item, TableLike, Value};

use crate::host::config::HostConfig;

/// Whether an edit adds or removes a role assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// Add the role to the permission's `roles`
    Grant,
    /// Remove the role from the permission's `roles`
    Revoke,
}

/// Apply an assignment edit to applets.toml content.
///
/// Returns the edited document and whether anything changed.
pub fn edit_assignment(
    content: &str,
    permission_key: &str,
    role: &str,
    assignment: Assignment,
) -> Result<(String, bool)> {
    let mut doc: DocumentMut = content.parse().context("Failed to parse applets.toml")?;

    let Some((applet_id, _)) = permission_key.split_once(':') else {
        bail!("Invalid permission '{permission_key}': expected format 'applet:NAME'");
    };

    let permission = find_permission(&mut doc, applet_id, permission_key)?;

    if permission.get("roles").is_none() {
        permission.insert("roles", toml_edit::value(Array::new()));
    }
    let roles = permission
        .get_mut("roles")
        .and_then(Item::as_array_mut)
        .with_context(|| format!("'roles' of '{permission_key}' is not an array"))?;

    let present = roles.iter().any(|v| v.as_str() == Some(role));
    let changed = match assignment {
        Assignment::Grant if !present => {
            roles.push(role);
            true
        }
        Assignment::Revoke if present => {
            roles.retain(|v| v.as_str() != Some(role));
            true
        }
        _ => false,
    };

    if !changed {
        return Ok((content.to_string(), false));
    }

    let edited = doc.to_string();
    HostConfig::parse(&edited).context("Edited configuration is invalid")?;
    Ok((edited, true))
}

/// Apply an assignment edit to the config file at `path`, writing only if
/// something changed.
pub fn edit_assignment_in_file<P: AsRef<Path>>(
    path: P,
    permission_key: &str,
    role: &str,
    assignment: Assignment,
) -> Result<bool> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let (edited, changed) = edit_assignment(&content, permission_key, role, assignment)?;
    if changed {
        std::fs::write(path, edited)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    }
    Ok(changed)
}

fn find_permission<'d>(
    doc: &'d mut DocumentMut,
    applet_id: &str,
    permission_key: &str,
) -> Result<&'d mut dyn TableLike> {
    let applets = doc
        .get_mut("applet")
        .map(tables_mut)
        .filter(|tables| !tables.is_empty())
        .context("No applet tables in configuration")?;

    let applet = applets
        .into_iter()
        .find(|t| t.get("id").and_then(Item::as_str) == Some(applet_id))
        .with_context(|| format!("Unknown applet '{applet_id}'"))?;

    applet
        .get_mut("permission")
        .map(tables_mut)
        .unwrap_or_default()
        .into_iter()
        .find(|t| t.get("key").and_then(Item::as_str) == Some(permission_key))
        .with_context(|| format!("Applet '{applet_id}' does not declare '{permission_key}'"))
}

/// The tables of an array, whether written as `[[name]]` sections or as an
/// inline `name = [{ ... }]` array. Other items hold no tables.
fn tables_mut(item: &mut Item) -> Vec<&mut dyn TableLike> {
    match item {
        Item::ArrayOfTables(tables) => tables
            .iter_mut()
            .map(|t| t as &mut dyn TableLike)
            .collect(),
        Item::Value(Value::Array(array)) => array
            .iter_mut()
            .filter_map(Value::as_inline_table_mut)
            .map(|t| t as &mut dyn TableLike)
            .collect(),
        _ => Vec::new(),
    }
}
