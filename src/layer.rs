//! In-memory property layer, the only manager with primary storage.

use crate::error::{PropertyError, Result};
use crate::manager::PropertyManager;
use crate::subscriptions::Dispatcher;
use crate::types::{Change, Changes, Properties};
use parking_lot::RwLock;
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// A concrete key → value store.
///
/// Writing a value equal to the stored one is a no-op and fires nothing.
#[derive(Debug, Default)]
pub struct PropertyLayer {
    values: RwLock<Properties>,
    dispatcher: Dispatcher,
}

impl PropertyLayer {
    /// Create an empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer holding a copy of `values`.
    pub fn from_map(values: Properties) -> Self {
        Self {
            values: RwLock::new(values),
            dispatcher: Dispatcher::new(),
        }
    }

    /// Create a layer from `(key, value)` pairs.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::from_map(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create a layer from a JSON object. Other JSON values are rejected.
    pub fn from_json(document: Value) -> Result<Self> {
        match document {
            Value::Object(map) => Ok(Self::from_map(map.into_iter().collect())),
            other => Err(PropertyError::Deserialization(format!(
                "expected a JSON object, got {}",
                kind_name(&other)
            ))),
        }
    }

    /// Parse JSON text into a layer.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(text)?)
    }

    /// Load a layer from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Wrap in an `Arc` for sharing with views and stacks.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl PropertyManager for PropertyLayer {
    fn get(&self, key: &str) -> Result<Value> {
        self.values
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| PropertyError::NotFound(key.to_string()))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        {
            let mut values = self.values.write();
            if values.get(key) == Some(&value) {
                return Ok(());
            }
            values.insert(key.to_string(), value.clone());
        }

        let mut changes = Changes::new();
        changes.insert(key.to_string(), Change::Set(value));
        self.dispatcher.fire(&changes);
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        if self.values.write().remove(key).is_none() {
            return Err(PropertyError::NotFound(key.to_string()));
        }

        let mut changes = Changes::new();
        changes.insert(key.to_string(), Change::Deleted);
        self.dispatcher.fire(&changes);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    fn snapshot(&self) -> Properties {
        self.values.read().clone()
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
