//! Pending-state tracking for optimistic data-view mutations
//!
//! Each entity key holds at most one pending entry. Staging a key that is
//! already pending overwrites the entry, even when it belongs to a different
//! operation. Commit and rollback both clear an operation's entries: the
//! store tracks intent, not the outcome of executing it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataview::record::{EntityKey, Patch, PendingRecord};

/// Kind of staged mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    /// A new entity not yet confirmed
    Added,
    /// An existing entity with unconfirmed changes
    Edited,
    /// An existing entity awaiting deletion
    Deleted,
}

/// The staged mutation for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingState {
    /// Kind of mutation
    pub kind: PendingKind,
    /// Operation that staged this entry
    pub operation_id: String,
    /// Fields to merge over the base record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Patch>,
    /// Staging order across the whole store
    pub sequence: u64,
}

/// Pending mutations keyed by entity primary key
#[derive(Debug, Clone, Default)]
pub struct TransactionStore {
    entries: HashMap<EntityKey, PendingState>,
    next_sequence: u64,
    version: u64,
}

impl TransactionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a mutation for `key`, replacing any entry already pending for it.
    pub fn stage(
        &mut self,
        operation_id: &str,
        key: impl Into<EntityKey>,
        kind: PendingKind,
        data: Option<Patch>,
    ) {
        let key = key.into();
        let state = PendingState {
            kind,
            operation_id: operation_id.to_string(),
            data,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;

        if let Some(previous) = self.entries.insert(key.clone(), state) {
            if previous.operation_id != operation_id {
                // Last stage wins; the earlier operation's intent for this key is dropped.
                tracing::debug!(
                    key = %key,
                    previous = %previous.operation_id,
                    operation_id,
                    "pending state overwritten by another operation"
                );
            }
        }
        self.version += 1;
    }

    /// Clear every entry staged by `operation_id` after it was applied.
    ///
    /// Returns the number of entries cleared.
    pub fn commit(&mut self, operation_id: &str) -> usize {
        self.clear_operation(operation_id)
    }

    /// Discard every entry staged by `operation_id` without applying it.
    ///
    /// Returns the number of entries discarded.
    pub fn rollback(&mut self, operation_id: &str) -> usize {
        self.clear_operation(operation_id)
    }

    fn clear_operation(&mut self, operation_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, s| s.operation_id != operation_id);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.version += 1;
        }
        removed
    }

    /// Counter bumped on every change, for invalidating derived views
    #[must_use]
    pub const fn pending_states_version(&self) -> u64 {
        self.version
    }

    /// The entry pending for `key`, if any
    #[must_use]
    pub fn pending_state(&self, key: &EntityKey) -> Option<&PendingState> {
        self.entries.get(key)
    }

    /// Whether anything is pending for `key`
    #[must_use]
    pub fn is_pending(&self, key: &EntityKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of pending entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All pending entries in staging order
    #[must_use]
    pub fn entries(&self) -> Vec<(&EntityKey, &PendingState)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|(_, s)| s.sequence);
        entries
    }

    /// Keys pending under `operation_id`, in staging order
    #[must_use]
    pub fn operation_keys(&self, operation_id: &str) -> Vec<&EntityKey> {
        self.entries()
            .into_iter()
            .filter(|(_, s)| s.operation_id == operation_id)
            .map(|(k, _)| k)
            .collect()
    }

    /// The record as it will look once its pending mutation lands.
    ///
    /// Records without a usable primary key or without a pending entry are
    /// returned unchanged. `base` itself is never modified.
    #[must_use]
    pub fn resolve_effective<T: PendingRecord>(&self, base: &T, primary_key: &str) -> T {
        let Some(state) = base
            .primary_key(primary_key)
            .and_then(|key| self.entries.get(&key))
        else {
            return base.clone();
        };

        match (state.kind, &state.data) {
            (PendingKind::Added | PendingKind::Edited, Some(patch)) => base.with_patch(patch),
            (PendingKind::Added | PendingKind::Edited, None) => base.clone(),
            (PendingKind::Deleted, _) => base.with_pending_delete(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn patch(value: &Value) -> Option<Patch> {
        value.as_object().cloned()
    }

    #[test]
    fn test_edit_patch_is_merged() {
        let mut store = TransactionStore::new();
        store.stage("op1", 42, PendingKind::Edited, patch(&json!({"name": "X"})));

        let effective = store.resolve_effective(&json!({"id": 42, "name": "Y"}), "id");
        assert_eq!(effective, json!({"id": 42, "name": "X"}));
    }

    #[test]
    fn test_added_patch_is_merged() {
        let mut store = TransactionStore::new();
        store.stage("op1", "tmp-1", PendingKind::Added, patch(&json!({"status": "draft"})));

        let effective = store.resolve_effective(&json!({"id": "tmp-1"}), "id");
        assert_eq!(effective, json!({"id": "tmp-1", "status": "draft"}));
    }

    #[test]
    fn test_deleted_is_flagged() {
        let mut store = TransactionStore::new();
        store.stage("op1", 7, PendingKind::Deleted, None);

        let effective = store.resolve_effective(&json!({"id": 7, "name": "Z"}), "id");
        assert_eq!(effective, json!({"id": 7, "name": "Z", "__pendingDelete": true}));
    }

    #[test]
    fn test_integer_key_matches_float_field() {
        let mut store = TransactionStore::new();
        store.stage("op1", 42, PendingKind::Edited, patch(&json!({"name": "X"})));

        let effective = store.resolve_effective(&json!({"id": 42.0, "name": "Y"}), "id");
        assert_eq!(effective, json!({"id": 42.0, "name": "X"}));
    }

    #[test]
    fn test_edit_without_data_returns_base() {
        let mut store = TransactionStore::new();
        store.stage("op1", 1, PendingKind::Edited, None);

        let base = json!({"id": 1, "name": "A"});
        assert_eq!(store.resolve_effective(&base, "id"), base);
    }

    #[test]
    fn test_unrelated_record_is_unchanged() {
        let mut store = TransactionStore::new();
        store.stage("op1", 1, PendingKind::Deleted, None);

        let base = json!({"id": 2, "name": "B"});
        assert_eq!(store.resolve_effective(&base, "id"), base);
        let keyless = json!({"name": "C"});
        assert_eq!(store.resolve_effective(&keyless, "id"), keyless);
    }

    #[test]
    fn test_resolve_is_pure() {
        let mut store = TransactionStore::new();
        store.stage("op1", 42, PendingKind::Edited, patch(&json!({"name": "X"})));

        let base = json!({"id": 42, "name": "Y"});
        let first = store.resolve_effective(&base, "id");
        let second = store.resolve_effective(&base, "id");

        assert_eq!(base, json!({"id": 42, "name": "Y"}));
        assert_eq!(first, second);
    }

    #[test]
    fn test_string_key_matches_numeric_field() {
        let mut store = TransactionStore::new();
        store.stage("op1", "42", PendingKind::Deleted, None);

        let effective = store.resolve_effective(&json!({"id": 42}), "id");
        assert!(crate::dataview::record::is_pending_delete(&effective));
    }

    #[test]
    fn test_restage_overwrites_entry() {
        let mut store = TransactionStore::new();
        store.stage("op1", 1, PendingKind::Edited, patch(&json!({"name": "first"})));
        store.stage("op2", 1, PendingKind::Deleted, None);

        assert_eq!(store.len(), 1);
        let state = store.pending_state(&EntityKey::from(1)).unwrap();
        assert_eq!(state.kind, PendingKind::Deleted);
        assert_eq!(state.operation_id, "op2");
        // op1 no longer owns anything, so committing it is a no-op.
        assert_eq!(store.commit("op1"), 0);
        assert!(store.is_pending(&EntityKey::from(1)));
    }

    #[test]
    fn test_commit_clears_operation() {
        let mut store = TransactionStore::new();
        store.stage("op1", 1, PendingKind::Edited, None);
        store.stage("op1", 2, PendingKind::Deleted, None);
        store.stage("op2", 3, PendingKind::Added, None);

        assert_eq!(store.commit("op1"), 2);
        assert!(store.operation_keys("op1").is_empty());
        assert_eq!(store.operation_keys("op2"), vec![&EntityKey::from(3)]);
    }

    #[test]
    fn test_rollback_clears_operation() {
        let mut store = TransactionStore::new();
        store.stage("op1", 1, PendingKind::Edited, patch(&json!({"name": "X"})));
        store.stage("op2", 2, PendingKind::Edited, None);

        assert_eq!(store.rollback("op1"), 1);
        assert!(store.entries().iter().all(|(_, s)| s.operation_id != "op1"));

        let base = json!({"id": 1, "name": "Y"});
        assert_eq!(store.resolve_effective(&base, "id"), base);
    }

    #[test]
    fn test_version_bumps_on_every_change() {
        let mut store = TransactionStore::new();
        assert_eq!(store.pending_states_version(), 0);

        store.stage("op1", 1, PendingKind::Edited, None);
        assert_eq!(store.pending_states_version(), 1);

        store.stage("op2", 1, PendingKind::Deleted, None);
        assert_eq!(store.pending_states_version(), 2);

        store.rollback("missing");
        assert_eq!(store.pending_states_version(), 2);

        store.commit("op2");
        assert_eq!(store.pending_states_version(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn test_entries_in_staging_order() {
        let mut store = TransactionStore::new();
        store.stage("op1", "c", PendingKind::Added, None);
        store.stage("op1", "a", PendingKind::Added, None);
        store.stage("op2", "b", PendingKind::Added, None);
        store.stage("op1", "c", PendingKind::Edited, None);

        let entries = store.entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(
            store.operation_keys("op1"),
            vec![&EntityKey::from("a"), &EntityKey::from("c")]
        );
    }

    #[test]
    fn test_typed_map_records() {
        let mut store = TransactionStore::new();
        store.stage("op1", 5, PendingKind::Edited, patch(&json!({"status": "inactive"})));

        let base = json!({"id": 5, "status": "active"}).as_object().cloned().unwrap();
        let effective = store.resolve_effective(&base, "id");
        assert_eq!(effective.get("status"), Some(&json!("inactive")));
        assert_eq!(base.get("status"), Some(&json!("active")));
    }
}
