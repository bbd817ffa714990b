//! Subscription types for property change notification.

use crate::types::{Change, Changes, SubscriptionId};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// Callback receiving every change batch.
pub type ChangesCallback = Box<dyn Fn(&Changes) + Send + Sync>;

/// Callback receiving the change for a single key.
pub type KeyCallback = Box<dyn Fn(&Change) + Send + Sync>;

pub(crate) enum Callback {
    Changes(ChangesCallback),
    Key(KeyCallback),
}

/// Internal subscriber record, shared between the registry and dispatch snapshots.
pub(crate) struct Subscriber {
    pub(crate) id: SubscriptionId,
    pub(crate) name: Option<String>,
    pub(crate) callback: Callback,
}

/// Subscribers in registration order.
pub(crate) type Registry = RwLock<Vec<Arc<Subscriber>>>;

/// Handle to a registered callback.
///
/// Cancelling is idempotent. The handle holds only a weak reference to its
/// source, so it never keeps a manager alive.
pub struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) name: Option<String>,
    pub(crate) registry: Weak<Registry>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Key this subscription listens to (`None` = all changes).
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Remove the callback from its source. Calling this more than once is a no-op.
    pub fn cancel(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.write().retain(|s| s.id != self.id);
        }
    }

    /// Whether the callback is still registered with a live source.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.read().iter().any(|s| s.id == self.id))
            .unwrap_or(false)
    }

    pub(crate) fn belongs_to(&self, registry: &Arc<Registry>) -> bool {
        Weak::as_ptr(&self.registry) == Arc::as_ptr(registry)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
