//! Pass-through views: the plain delegator and the read-only lock.

use crate::error::{PropertyError, Result};
use crate::manager::{PropertyManager, SharedManager};
use crate::subscriptions::{Dispatcher, Subscription};
use crate::types::{Changes, Properties};
use serde_json::Value;

/// Forwards every operation to the wrapped manager and re-fires its events
/// unchanged. Base for the validating and read-only views.
pub struct PropertyDelegator {
    inner: SharedManager,
    dispatcher: Dispatcher,
    upstream: Subscription,
}

impl PropertyDelegator {
    pub fn new(inner: SharedManager) -> Self {
        let dispatcher = Dispatcher::new();
        let forward_to = dispatcher.clone();
        let upstream = inner.subscribe(Box::new(move |changes: &Changes| {
            forward_to.fire(changes);
        }));

        Self {
            inner,
            dispatcher,
            upstream,
        }
    }

    /// The wrapped manager.
    pub fn inner(&self) -> &SharedManager {
        &self.inner
    }
}

impl Drop for PropertyDelegator {
    fn drop(&mut self) {
        self.upstream.cancel();
    }
}

impl PropertyManager for PropertyDelegator {
    fn get(&self, key: &str) -> Result<Value> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.inner.set(key, value)
    }

    fn contains(&self, key: &str) -> bool {
        self.inner.contains(key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.inner.delete(key)
    }

    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn snapshot(&self) -> Properties {
        self.inner.snapshot()
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Rejects every write and delete with `WriteProtected`; reads pass through.
pub struct PropertyReadOnly {
    delegator: PropertyDelegator,
}

impl PropertyReadOnly {
    pub fn new(inner: SharedManager) -> Self {
        Self {
            delegator: PropertyDelegator::new(inner),
        }
    }

    pub fn inner(&self) -> &SharedManager {
        self.delegator.inner()
    }
}

impl PropertyManager for PropertyReadOnly {
    fn get(&self, key: &str) -> Result<Value> {
        self.delegator.get(key)
    }

    fn set(&self, key: &str, _value: Value) -> Result<()> {
        Err(PropertyError::WriteProtected(key.to_string()))
    }

    fn contains(&self, key: &str) -> bool {
        self.delegator.contains(key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        Err(PropertyError::WriteProtected(key.to_string()))
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
