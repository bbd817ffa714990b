//! Views restricted to a subset of keys.

use crate::error::{PropertyError, Result};
use crate::manager::{PropertyManager, SharedManager};
use crate::subscriptions::{Dispatcher, Subscription};
use crate::types::{Changes, Properties};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Predicate deciding which keys a [`PropertyFilter`] exposes.
pub trait KeyFilter: Send + Sync {
    fn apply(&self, key: &str) -> bool;
}

/// Accepts a fixed set of property names.
#[derive(Clone, Debug, Default)]
pub struct ByPropertyName {
    names: HashSet<String>,
}

impl ByPropertyName {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl KeyFilter for ByPropertyName {
    fn apply(&self, key: &str) -> bool {
        self.names.contains(key)
    }
}

/// Accepts keys for which a closure returns true.
pub struct ByLambda<F> {
    predicate: F,
}

impl<F> ByLambda<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> KeyFilter for ByLambda<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn apply(&self, key: &str) -> bool {
        (self.predicate)(key)
    }
}

/// A view exposing only the keys accepted by a [`KeyFilter`].
///
/// Rejected keys behave as if they did not exist: reads fail with
/// `NotFound`, writes and deletes with `KeyRejected`. Events from the
/// wrapped manager are narrowed to accepted keys before being re-fired.
pub struct PropertyFilter {
    inner: SharedManager,
    filter: Arc<dyn KeyFilter>,
    dispatcher: Dispatcher,
    upstream: Subscription,
}

impl PropertyFilter {
    pub fn new(inner: SharedManager, filter: impl KeyFilter + 'static) -> Self {
        let filter: Arc<dyn KeyFilter> = Arc::new(filter);
        let dispatcher = Dispatcher::new();

        let forward_to = dispatcher.clone();
        let accepts = Arc::clone(&filter);
        let upstream = inner.subscribe(Box::new(move |changes: &Changes| {
            let accepted: Changes = changes
                .iter()
                .filter(|(key, _)| accepts.apply(key))
                .map(|(key, change)| (key.clone(), change.clone()))
                .collect();
            forward_to.fire(&accepted);
        }));

        Self {
            inner,
            filter,
            dispatcher,
            upstream,
        }
    }

    /// The wrapped manager.
    pub fn inner(&self) -> &SharedManager {
        &self.inner
    }

    fn check_write(&self, key: &str) -> Result<()> {
        if self.filter.apply(key) {
            Ok(())
        } else {
            Err(PropertyError::KeyRejected(key.to_string()))
        }
    }
}

impl Drop for PropertyFilter {
    fn drop(&mut self) {
        self.upstream.cancel();
    }
}

impl PropertyManager for PropertyFilter {
    fn get(&self, key: &str) -> Result<Value> {
        if !self.filter.apply(key) {
            return Err(PropertyError::NotFound(key.to_string()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.check_write(key)?;
        self.inner.set(key, value)
    }

    fn contains(&self, key: &str) -> bool {
        self.filter.apply(key) && self.inner.contains(key)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.check_write(key)?;
        self.inner.delete(key)
    }

    fn keys(&self) -> Vec<String> {
        self.inner
            .keys()
            .into_iter()
            .filter(|key| self.filter.apply(key))
            .collect()
    }

    fn snapshot(&self) -> Properties {
        self.inner
            .snapshot()
            .into_iter()
            .filter(|(key, _)| self.filter.apply(key))
            .collect()
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
