//! Core types for the property store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Full key → value view of a manager.
pub type Properties = BTreeMap<String, Value>;

/// A batch of changes, delivered to subscribers after a mutation.
pub type Changes = BTreeMap<String, Change>;

/// What happened to a single key.
///
/// `Deleted` is distinct from every storable value, including `Value::Null`,
/// so removing a key can always be told apart from setting it to null.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Change {
    /// The key now holds this value.
    Set(Value),
    /// The key was removed.
    Deleted,
}

impl Change {
    /// The new value, or `None` for a deletion.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Change::Set(value) => Some(value),
            Change::Deleted => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        matches!(self, Change::Deleted)
    }
}

impl From<Value> for Change {
    fn from(value: Value) -> Self {
        Change::Set(value)
    }
}

/// Unique identifier for a subscription.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build a change batch from `(key, change)` pairs.
pub fn changes<K, C, I>(items: I) -> Changes
where
    K: Into<String>,
    C: Into<Change>,
    I: IntoIterator<Item = (K, C)>,
{
    items
        .into_iter()
        .map(|(k, c)| (k.into(), c.into()))
        .collect()
}
