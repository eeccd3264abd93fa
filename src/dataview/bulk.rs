//! Bulk action visibility
//!
//! Decides which bulk actions apply to the current row selection. Rows are
//! first resolved against the transaction store, so visibility reflects
//! pending mutations ahead of server confirmation.

use std::fmt;

use crate::dataview::record::PendingRecord;
use crate::dataview::transaction::TransactionStore;

type RowPredicate<T> = Box<dyn Fn(&T) -> bool>;
type SelectionPredicate<T> = Box<dyn Fn(&[T]) -> bool>;

/// An action offered for a multi-row selection
pub struct BulkAction<T> {
    /// Stable identifier
    pub key: String,
    /// Display label
    pub label: String,
    /// With `applies_to`, every selected row must match instead of any
    pub requires_all_rows: bool,
    applies_to: Option<RowPredicate<T>>,
    hidden: Option<SelectionPredicate<T>>,
}

impl<T> BulkAction<T> {
    /// An action that applies to any selection
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            requires_all_rows: false,
            applies_to: None,
            hidden: None,
        }
    }

    /// Restrict the action to rows matching `predicate`
    #[must_use]
    pub fn applies_to(mut self, predicate: impl Fn(&T) -> bool + 'static) -> Self {
        self.applies_to = Some(Box::new(predicate));
        self
    }

    /// Require every selected row to match `applies_to`
    #[must_use]
    pub fn requires_all_rows(mut self) -> Self {
        self.requires_all_rows = true;
        self
    }

    /// Hide the action whenever `predicate` holds for the selection
    #[must_use]
    pub fn hidden_when(mut self, predicate: impl Fn(&[T]) -> bool + 'static) -> Self {
        self.hidden = Some(Box::new(predicate));
        self
    }

    /// Whether the action is offered for already-resolved rows.
    ///
    /// `requires_all_rows` without `applies_to` has nothing to check and the
    /// action applies.
    #[must_use]
    pub fn is_available(&self, rows: &[T]) -> bool {
        if self.hidden.as_ref().is_some_and(|hidden| hidden(rows)) {
            return false;
        }
        match &self.applies_to {
            Some(applies) if self.requires_all_rows => rows.iter().all(|row| applies(row)),
            Some(applies) => rows.iter().any(|row| applies(row)),
            None => true,
        }
    }
}

impl<T> fmt::Debug for BulkAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAction")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("requires_all_rows", &self.requires_all_rows)
            .field("applies_to", &self.applies_to.is_some())
            .field("hidden", &self.hidden.is_some())
            .finish()
    }
}

/// The actions available for `selected`, in declaration order.
///
/// Deterministic in its inputs, so callers may cache the result keyed on the
/// actions, the selection and [`TransactionStore::pending_states_version`].
#[must_use]
pub fn available_actions<'a, T: PendingRecord>(
    actions: &'a [BulkAction<T>],
    selected: &[T],
    store: &TransactionStore,
    primary_key: &str,
) -> Vec<&'a BulkAction<T>> {
    let effective: Vec<T> = selected
        .iter()
        .map(|row| store.resolve_effective(row, primary_key))
        .collect();

    actions
        .iter()
        .filter(|action| action.is_available(&effective))
        .collect()
}
