//! Validating view.

use crate::error::{PropertyError, Result};
use crate::manager::{PropertyManager, SharedManager};
use crate::subscriptions::Dispatcher;
use crate::types::Properties;
use crate::validators::Validator;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::PropertyDelegator;

/// A delegator that checks writes against per-key rules.
///
/// A rejected write fails with `ValidationFailed` and leaves the wrapped
/// manager untouched. Keys without a rule accept any value.
pub struct PropertyValidator {
    delegator: PropertyDelegator,
    rules: RwLock<HashMap<String, Arc<dyn Validator>>>,
}

impl PropertyValidator {
    pub fn new(inner: SharedManager) -> Self {
        Self::with_rules(inner, HashMap::new())
    }

    pub fn with_rules(inner: SharedManager, rules: HashMap<String, Arc<dyn Validator>>) -> Self {
        Self {
            delegator: PropertyDelegator::new(inner),
            rules: RwLock::new(rules),
        }
    }

    /// Add or replace the rule for `key`.
    pub fn set_validator(&self, key: impl Into<String>, rule: impl Validator + 'static) {
        self.rules.write().insert(key.into(), Arc::new(rule));
    }

    /// Drop the rule for `key`, leaving it unconstrained.
    pub fn remove_validator(&self, key: &str) -> bool {
        self.rules.write().remove(key).is_some()
    }

    pub fn has_validator(&self, key: &str) -> bool {
        self.rules.read().contains_key(key)
    }

    /// Check `value` against the rule for `key` without writing it.
    pub fn validate(&self, key: &str, value: &Value) -> Result<()> {
        let rule = self.rules.read().get(key).cloned();
        match rule {
            Some(rule) if !rule.is_valid(value) => Err(PropertyError::ValidationFailed {
                key: key.to_string(),
                value: value.clone(),
            }),
            _ => Ok(()),
        }
    }

    pub fn inner(&self) -> &SharedManager {
        self.delegator.inner()
    }
}

impl PropertyManager for PropertyValidator {
    fn get(&self, key: &str) -> Result<Value> {
        self.delegator.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.validate(key, &value)?;
        self.delegator.set(key, value)
    }

    fn contains(&self, key: &str) -> bool {
        self.delegator.contains(key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.delegator.delete(key)
    }

    fn keys(&self) -> Vec<String> {
        self.delegator.keys()
    }

    fn snapshot(&self) -> Properties {
        self.delegator.snapshot()
    }

    fn dispatcher(&self) -> &Dispatcher {
        self.delegator.dispatcher()
    }
}
