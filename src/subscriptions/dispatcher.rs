//! Dispatcher delivering change batches to subscribers.

use crate::types::{Change, Changes, SubscriptionId};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, trace};

use super::types::{Callback, ChangesCallback, KeyCallback, Registry, Subscriber, Subscription};

/// Counter for generating subscription IDs, unique across all dispatchers.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Owns the subscriber list of one manager and delivers its change events.
///
/// Cloning yields another handle to the same subscriber list.
#[derive(Clone, Default)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    /// Create a dispatcher with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every change batch.
    pub fn subscribe(&self, callback: ChangesCallback) -> Subscription {
        self.register(None, Callback::Changes(callback)).0
    }

    /// Register a callback for a single key.
    ///
    /// Does not perform the initial notification; managers do that through
    /// [`PropertyManager::subscribe_key`](crate::PropertyManager::subscribe_key).
    pub fn subscribe_key(&self, name: &str, callback: KeyCallback) -> Subscription {
        self.register(Some(name.to_string()), Callback::Key(callback)).0
    }

    /// Register a key callback and immediately hand it `initial` if present.
    pub(crate) fn subscribe_key_with_initial(
        &self,
        name: &str,
        callback: KeyCallback,
        initial: Option<Change>,
    ) -> Subscription {
        let (subscription, subscriber) =
            self.register(Some(name.to_string()), Callback::Key(callback));
        if let Some(change) = initial {
            Self::deliver_key(&subscriber, &change);
        }
        subscription
    }

    /// Remove a subscription. Unknown or foreign subscriptions are ignored.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        if subscription.belongs_to(&self.registry) {
            subscription.cancel();
        }
    }

    /// Get subscription count.
    pub fn subscription_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Deliver a change batch.
    ///
    /// Whole-map subscribers are notified first, then per-key subscribers for
    /// each changed key. Both groups run in registration order against a
    /// snapshot of the list taken before the first callback.
    pub fn fire(&self, changes: &Changes) {
        if changes.is_empty() {
            return;
        }

        let subscribers: Vec<Arc<Subscriber>> = self.registry.read().clone();
        trace!(
            keys = changes.len(),
            subscribers = subscribers.len(),
            "dispatching property changes"
        );

        for subscriber in &subscribers {
            if let Callback::Changes(ref callback) = subscriber.callback {
                Self::guarded(subscriber, None, || callback(changes));
            }
        }

        for (name, change) in changes {
            for subscriber in &subscribers {
                if subscriber.name.as_deref() == Some(name.as_str()) {
                    Self::deliver_key(subscriber, change);
                }
            }
        }
    }

    fn register(&self, name: Option<String>, callback: Callback) -> (Subscription, Arc<Subscriber>) {
        let id = SubscriptionId(NEXT_ID.fetch_add(1, Ordering::SeqCst));
        let subscriber = Arc::new(Subscriber {
            id,
            name: name.clone(),
            callback,
        });

        self.registry.write().push(Arc::clone(&subscriber));

        let subscription = Subscription {
            id,
            name,
            registry: Arc::downgrade(&self.registry),
        };
        (subscription, subscriber)
    }

    fn deliver_key(subscriber: &Subscriber, change: &Change) {
        if let Callback::Key(ref callback) = subscriber.callback {
            Self::guarded(subscriber, subscriber.name.as_deref(), || callback(change));
        }
    }

    /// Run a callback, reporting a panic instead of propagating it.
    fn guarded(subscriber: &Subscriber, key: Option<&str>, f: impl FnOnce()) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(f)) {
            error!(
                subscription = %subscriber.id,
                key = key.unwrap_or("*"),
                panic = panic_message(payload.as_ref()),
                "subscriber panicked while handling property changes"
            );
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
