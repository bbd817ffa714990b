//! The property manager capability shared by every store and view.

use crate::error::Result;
use crate::subscriptions::{ChangesCallback, Dispatcher, KeyCallback, Subscription};
use crate::types::{Change, Properties};
use crate::validators::Validator;
use crate::views::{ByLambda, ByPropertyName, PropertyDelegator, PropertyFilter, PropertyReadOnly, PropertyValidator};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to any manager.
pub type SharedManager = Arc<dyn PropertyManager>;

/// A string-keyed property store with change notification.
///
/// Layers, views and stacks all implement this trait and behave the same to
/// code holding a [`SharedManager`].
pub trait PropertyManager: Send + Sync {
    /// Current value of `key`, or [`PropertyError::NotFound`](crate::PropertyError::NotFound).
    fn get(&self, key: &str) -> Result<Value>;

    /// Write `key`. Subscribers are notified before this returns.
    fn set(&self, key: &str, value: Value) -> Result<()>;

    fn contains(&self, key: &str) -> bool;

    /// Remove `key`. Subscribers are notified before this returns.
    fn delete(&self, key: &str) -> Result<()>;

    fn keys(&self) -> Vec<String>;

    /// Full key → value view.
    fn snapshot(&self) -> Properties;

    /// The dispatcher delivering this manager's change events.
    fn dispatcher(&self) -> &Dispatcher;

    /// Subscribe to every change batch.
    fn subscribe(&self, callback: ChangesCallback) -> Subscription {
        self.dispatcher().subscribe(callback)
    }

    /// Subscribe to changes of a single key.
    ///
    /// If the key is currently present the callback runs once immediately
    /// with its current value.
    fn subscribe_key(&self, name: &str, callback: KeyCallback) -> Subscription {
        let initial = if self.contains(name) {
            self.get(name).ok().map(Change::Set)
        } else {
            None
        };
        self.dispatcher()
            .subscribe_key_with_initial(name, callback, initial)
    }

    /// Cancel a subscription made on this manager. Idempotent.
    fn unsubscribe(&self, subscription: &Subscription) {
        self.dispatcher().unsubscribe(subscription);
    }

    fn len(&self) -> usize {
        self.snapshot().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of `key`, or `default` when absent.
    fn get_or(&self, key: &str, default: Value) -> Value {
        self.get(key).unwrap_or(default)
    }
}

/// Constructors for views over a shared manager.
pub trait PropertyManagerExt {
    /// View restricted to the given property names.
    fn filter<I, S>(&self, names: I) -> PropertyFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>;

    /// View restricted to keys accepted by `predicate`.
    fn filter_by<F>(&self, predicate: F) -> PropertyFilter
    where
        F: Fn(&str) -> bool + Send + Sync + 'static;

    fn readonly(&self) -> PropertyReadOnly;

    fn delegate(&self) -> PropertyDelegator;

    /// Validating view with the given per-key rules.
    fn validated(&self, rules: HashMap<String, Arc<dyn Validator>>) -> PropertyValidator;
}

fn shared(manager: &SharedManager) -> SharedManager {
    Arc::clone(manager)
}

impl PropertyManagerExt for SharedManager {
    fn filter<I, S>(&self, names: I) -> PropertyFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyFilter::new(shared(self), ByPropertyName::new(names))
    }

    fn filter_by<F>(&self, predicate: F) -> PropertyFilter
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        PropertyFilter::new(shared(self), ByLambda::new(predicate))
    }

    fn readonly(&self) -> PropertyReadOnly {
        PropertyReadOnly::new(shared(self))
    }

    fn delegate(&self) -> PropertyDelegator {
        PropertyDelegator::new(shared(self))
    }

    fn validated(&self, rules: HashMap<String, Arc<dyn Validator>>) -> PropertyValidator {
        PropertyValidator::with_rules(shared(self), rules)
    }
}

impl<T: PropertyManager + 'static> PropertyManagerExt for Arc<T> {
    fn filter<I, S>(&self, names: I) -> PropertyFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertyFilter::new(self.clone(), ByPropertyName::new(names))
    }

    fn filter_by<F>(&self, predicate: F) -> PropertyFilter
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        PropertyFilter::new(self.clone(), ByLambda::new(predicate))
    }

    fn readonly(&self) -> PropertyReadOnly {
        PropertyReadOnly::new(self.clone())
    }

    fn delegate(&self) -> PropertyDelegator {
        PropertyDelegator::new(self.clone())
    }

    fn validated(&self, rules: HashMap<String, Arc<dyn Validator>>) -> PropertyValidator {
        PropertyValidator::with_rules(self.clone(), rules)
    }
}

/// Whether two handles point at the same manager.
pub fn same_manager(a: &SharedManager, b: &SharedManager) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
