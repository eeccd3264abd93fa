//! File-backed role selection storage
//!
//! Manages `<state_dir>/roles.json`: a single JSON object mapping storage
//! keys to role selections. Writes go to a temp file that is renamed over the
//! original so readers never observe a partial document. A document that
//! cannot be loaded is replaced on the next write.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::access::selection::RoleStorage;

type Document = BTreeMap<String, Vec<String>>;

/// [`RoleStorage`] persisted to `roles.json`
#[derive(Debug, Clone)]
pub struct FileRoleStore {
    path: PathBuf,
}

impl FileRoleStore {
    /// Create a store targeting `<state_dir>/roles.json`.
    pub fn new(state_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_dir)
            .with_context(|| format!("Failed to create state directory: {}", state_dir.display()))?;
        Ok(Self {
            path: state_dir.join("roles.json"),
        })
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Document> {
        if !self.path.exists() {
            return Ok(Document::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.path.display()))
    }

    fn save(&self, document: &Document) -> Result<()> {
        let json =
            serde_json::to_string_pretty(document).context("Failed to serialize role selections")?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json.as_bytes())
            .with_context(|| format!("Failed to write temp file: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;
        Ok(())
    }
}

impl RoleStorage for FileRoleStore {
    fn read(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.load()?.remove(key))
    }

    fn write(&mut self, key: &str, roles: &[String]) -> Result<()> {
        let mut document = self.load().unwrap_or_else(|err| {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "discarding unreadable role selections"
            );
            Document::new()
        });
        document.insert(key.to_string(), roles.to_vec());
        self.save(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::selection::RoleSelection;
    use tempfile::TempDir;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_read_missing_file_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRoleStore::new(temp_dir.path()).unwrap();
        assert_eq!(store.read("any").unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileRoleStore::new(temp_dir.path()).unwrap();

        store.write("portal.roles", &roles(&["Admin", "User"])).unwrap();

        assert_eq!(
            store.read("portal.roles").unwrap(),
            Some(roles(&["Admin", "User"]))
        );
        assert_eq!(store.read("other").unwrap(), None);
    }

    #[test]
    fn test_keys_are_independent() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileRoleStore::new(temp_dir.path()).unwrap();

        store.write("a", &roles(&["Admin"])).unwrap();
        store.write("b", &roles(&["User"])).unwrap();
        store.write("a", &roles(&[])).unwrap();

        assert_eq!(store.read("a").unwrap(), Some(vec![]));
        assert_eq!(store.read("b").unwrap(), Some(roles(&["User"])));
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileRoleStore::new(temp_dir.path()).unwrap();
        store.write("a", &roles(&["Admin"])).unwrap();

        assert!(store.path().exists());
        assert!(!temp_dir.path().join("roles.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRoleStore::new(temp_dir.path()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        let err = store.read("a").unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_selection_survives_reload() {
        let temp_dir = TempDir::new().unwrap();
        let available = roles(&["Admin", "User"]);

        let store = FileRoleStore::new(temp_dir.path()).unwrap();
        let mut selection = RoleSelection::initialize(&["User"], available.clone(), "k", store);
        selection.toggle("Admin");

        let reloaded = FileRoleStore::new(temp_dir.path()).unwrap();
        let selection = RoleSelection::initialize(&["User"], available, "k", reloaded);
        assert_eq!(selection.selected(), ["User", "Admin"]);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_user_roles() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileRoleStore::new(temp_dir.path()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        let mut selection =
            RoleSelection::initialize(&["User"], roles(&["Admin", "User"]), "k", store);
        assert_eq!(selection.selected(), ["User"]);

        // The toggle replaces the corrupt document
        assert!(selection.toggle("Admin"));
        assert!(!selection.last_write_failed());
        assert_eq!(selection.selected(), ["User", "Admin"]);

        let reloaded = FileRoleStore::new(temp_dir.path()).unwrap();
        let selection =
            RoleSelection::initialize(&["User"], roles(&["Admin", "User"]), "k", reloaded);
        assert_eq!(selection.selected(), ["User", "Admin"]);
    }

    #[test]
    fn test_write_repairs_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileRoleStore::new(temp_dir.path()).unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        store.write("a", &roles(&["Admin"])).unwrap();

        assert_eq!(store.read("a").unwrap(), Some(roles(&["Admin"])));
        let content = std::fs::read_to_string(store.path()).unwrap();
        let document: Document = serde_json::from_str(&content).unwrap();
        assert_eq!(document.len(), 1);
    }
}
