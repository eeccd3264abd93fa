//! Entity keys and immutable patch application for data-view records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Field set on the effective record of an entity staged for deletion
pub const PENDING_DELETE_FIELD: &str = "__pendingDelete";

/// A partial update merged over a record
pub type Patch = Map<String, Value>;

/// Primary key of an entity.
///
/// Keys are kept in canonical string form, so the number `42` and the string
/// `"42"` address the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    /// Build a key from a JSON string or number. Other values have no key.
    ///
    /// Integral floats take their integer form, so `42.0` keys as `"42"`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(canonical_number(n))),
            _ => None,
        }
    }

    /// The canonical string form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn canonical_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                return (f as i64).to_string();
            }
        }
    }
    n.to_string()
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for EntityKey {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl From<u64> for EntityKey {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl From<i32> for EntityKey {
    fn from(n: i32) -> Self {
        Self(n.to_string())
    }
}

/// A record that pending state can be resolved against.
///
/// Every method returns a new value; the receiver is never modified.
pub trait PendingRecord: Clone {
    /// The value of the primary key field, if present and usable as a key
    fn primary_key(&self, field: &str) -> Option<EntityKey>;

    /// A copy with every field of `patch` written over this record
    #[must_use]
    fn with_patch(&self, patch: &Patch) -> Self;

    /// A copy flagged as pending deletion
    #[must_use]
    fn with_pending_delete(&self) -> Self;
}

impl PendingRecord for Map<String, Value> {
    fn primary_key(&self, field: &str) -> Option<EntityKey> {
        self.get(field).and_then(EntityKey::from_value)
    }

    fn with_patch(&self, patch: &Patch) -> Self {
        let mut merged = self.clone();
        for (field, value) in patch {
            merged.insert(field.clone(), value.clone());
        }
        merged
    }

    fn with_pending_delete(&self) -> Self {
        let mut flagged = self.clone();
        flagged.insert(PENDING_DELETE_FIELD.to_string(), Value::Bool(true));
        flagged
    }
}

/// Non-object values carry no fields: they have no key and patches leave them
/// unchanged.
impl PendingRecord for Value {
    fn primary_key(&self, field: &str) -> Option<EntityKey> {
        self.get(field).and_then(EntityKey::from_value)
    }

    fn with_patch(&self, patch: &Patch) -> Self {
        match self {
            Self::Object(map) => Self::Object(map.with_patch(patch)),
            other => other.clone(),
        }
    }

    fn with_pending_delete(&self) -> Self {
        match self {
            Self::Object(map) => Self::Object(map.with_pending_delete()),
            other => other.clone(),
        }
    }
}

/// Whether a record has been flagged as pending deletion
#[must_use]
pub fn is_pending_delete(record: &Value) -> bool {
    record
        .get(PENDING_DELETE_FIELD)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
