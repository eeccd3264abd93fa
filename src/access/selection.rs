//! Persisted active-role selection
//!
//! Holds the subset of available roles the user is currently acting as.
//! Every toggle is written through to a [`RoleStorage`] and reported to an
//! optional change callback. Storage failures are logged and swallowed; the
//! in-memory selection stays authoritative for the session.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;

/// Durable key-value storage for role selections
pub trait RoleStorage {
    /// Read the selection stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<Vec<String>>>;

    /// Store `roles` under `key`, replacing any previous value.
    fn write(&mut self, key: &str, roles: &[String]) -> Result<()>;
}

/// In-process storage, lost when dropped
#[derive(Debug, Clone, Default)]
pub struct MemoryRoleStore {
    entries: HashMap<String, Vec<String>>,
}

impl MemoryRoleStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleStorage for MemoryRoleStore {
    fn read(&self, key: &str) -> Result<Option<Vec<String>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, roles: &[String]) -> Result<()> {
        self.entries.insert(key.to_string(), roles.to_vec());
        Ok(())
    }
}

type RolesChangeCallback = Box<dyn FnMut(&[String])>;

/// The active role selection, persisted under a storage key
pub struct RoleSelection<S: RoleStorage> {
    selected: Vec<String>,
    available: Vec<String>,
    storage_key: String,
    storage: S,
    on_roles_change: Option<RolesChangeCallback>,
    last_write_failed: bool,
}

impl<S: RoleStorage> RoleSelection<S> {
    /// Seed the selection from storage, falling back to the user's roles.
    ///
    /// The stored selection is used only if it exists, can be read, and every
    /// role in it is still available. Otherwise the selection is
    /// `user_roles ∩ available_roles`, in `user_roles` order.
    pub fn initialize<R: AsRef<str>>(
        user_roles: &[R],
        available_roles: Vec<String>,
        storage_key: &str,
        storage: S,
    ) -> Self {
        let stored = match storage.read(storage_key) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(storage_key, error = %err, "failed to read role selection");
                None
            }
        };

        let selected = match stored {
            Some(roles) if roles.iter().all(|r| available_roles.contains(r)) => dedup(roles),
            Some(roles) => {
                tracing::debug!(
                    storage_key,
                    ?roles,
                    "stored role selection references unavailable roles, reseeding"
                );
                seed(user_roles, &available_roles)
            }
            None => seed(user_roles, &available_roles),
        };

        Self {
            selected,
            available: available_roles,
            storage_key: storage_key.to_string(),
            storage,
            on_roles_change: None,
            last_write_failed: false,
        }
    }

    /// Register a callback invoked with the new selection after every change.
    #[must_use]
    pub fn on_roles_change(mut self, callback: impl FnMut(&[String]) + 'static) -> Self {
        self.on_roles_change = Some(Box::new(callback));
        self
    }

    /// The active roles, in selection order
    #[must_use]
    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// The roles that may be selected
    #[must_use]
    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// The storage key this selection persists under
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Whether `role` is currently active
    #[must_use]
    pub fn is_selected(&self, role: &str) -> bool {
        self.selected.iter().any(|r| r == role)
    }

    /// Whether the most recent write to storage failed
    #[must_use]
    pub const fn last_write_failed(&self) -> bool {
        self.last_write_failed
    }

    /// Borrow the underlying storage
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Remove `role` if active, otherwise append it.
    ///
    /// Roles outside the available set are ignored. Returns whether the
    /// selection changed.
    pub fn toggle(&mut self, role: &str) -> bool {
        if !self.available.iter().any(|r| r == role) {
            tracing::debug!(role, "ignoring toggle of unavailable role");
            return false;
        }

        if let Some(pos) = self.selected.iter().position(|r| r == role) {
            self.selected.remove(pos);
        } else {
            self.selected.push(role.to_string());
        }
        tracing::debug!(role, selected = ?self.selected, "role selection changed");

        self.persist();
        if let Some(callback) = self.on_roles_change.as_mut() {
            callback(&self.selected);
        }
        true
    }

    fn persist(&mut self) {
        match self.storage.write(&self.storage_key, &self.selected) {
            Ok(()) => self.last_write_failed = false,
            Err(err) => {
                tracing::warn!(
                    storage_key = %self.storage_key,
                    error = %err,
                    "failed to persist role selection"
                );
                self.last_write_failed = true;
            }
        }
    }
}

impl<S: RoleStorage + fmt::Debug> fmt::Debug for RoleSelection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleSelection")
            .field("selected", &self.selected)
            .field("available", &self.available)
            .field("storage_key", &self.storage_key)
            .field("storage", &self.storage)
            .field("last_write_failed", &self.last_write_failed)
            .finish_non_exhaustive()
    }
}

fn seed<R: AsRef<str>>(user_roles: &[R], available: &[String]) -> Vec<String> {
    dedup(
        user_roles
            .iter()
            .map(|r| r.as_ref())
            .filter(|r| available.iter().any(|a| a == *r))
            .map(ToString::to_string)
            .collect(),
    )
}

fn dedup(roles: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(roles.len());
    for role in roles {
        if !result.contains(&role) {
            result.push(role);
        }
    }
    result
}
