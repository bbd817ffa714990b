//! Priority-ordered composition of managers into one key space.

use crate::error::{PropertyError, Result};
use crate::manager::{same_manager, PropertyManager, SharedManager};
use crate::subscriptions::{ChangesCallback, Dispatcher, Subscription};
use crate::types::{Change, Changes, Properties};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};
use tracing::debug;

/// A member of the stack.
struct LayerEntry {
    priority: u32,
    manager: SharedManager,
    /// Forwards the member's events into the stack.
    subscription: Subscription,
}

/// Several managers resolved by priority; 0 is the topmost.
///
/// A key resolves to the first layer defining it in ascending priority order.
/// Layers sharing a priority resolve in registration order. When no layer
/// defines a key, reads and writes are routed to the topmost layer, so a
/// write to an unknown key creates it there.
///
/// Events are fired only for keys whose externally visible value changed:
/// writes to a shadowed layer stay silent until the shadowing layer is
/// removed or loses the key.
pub struct PropertyStack {
    layers: RwLock<Vec<LayerEntry>>,
    dispatcher: Dispatcher,
    this: Weak<PropertyStack>,
}

impl PropertyStack {
    /// Create an empty stack.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            layers: RwLock::new(Vec::new()),
            dispatcher: Dispatcher::new(),
            this: this.clone(),
        })
    }

    /// Add a layer at `priority`.
    ///
    /// Fires the keys of `manager` whose visible value changes as a result.
    pub fn add_layer(&self, priority: u32, manager: SharedManager) {
        let keys = key_set(&manager);
        let before = self.visible(&keys);

        let entry = self.attach(priority, &manager);
        self.layers.write().push(entry);

        let changes = diff(&keys, &before, &self.visible(&keys));
        debug!(priority, changed = changes.len(), "added property layer");
        self.dispatcher.fire(&changes);
    }

    /// Remove every entry holding `manager`.
    ///
    /// Keys it defined surface from the next layer down, or are reported
    /// deleted when no remaining layer defines them.
    pub fn remove_layer(&self, manager: &SharedManager) -> Result<()> {
        let keys = key_set(manager);
        let before = self.visible(&keys);

        let removed: Vec<LayerEntry> = {
            let mut layers = self.layers.write();
            let (removed, kept): (Vec<LayerEntry>, Vec<LayerEntry>) = layers
                .drain(..)
                .partition(|entry| same_manager(&entry.manager, manager));
            *layers = kept;
            removed
        };
        if removed.is_empty() {
            return Err(PropertyError::Structural(
                "cannot remove a layer that is not part of the stack".to_string(),
            ));
        }
        for entry in &removed {
            entry.subscription.cancel();
        }

        let changes = diff(&keys, &before, &self.visible(&keys));
        debug!(
            entries = removed.len(),
            changed = changes.len(),
            "removed property layer"
        );
        self.dispatcher.fire(&changes);
        Ok(())
    }

    /// Replace the first layer registered at `priority` with `manager`.
    ///
    /// Fires one batch describing the difference between the state before
    /// and after the swap.
    pub fn replace_layer(&self, priority: u32, manager: SharedManager) -> Result<()> {
        let old = self
            .layers
            .read()
            .iter()
            .find(|entry| entry.priority == priority)
            .map(|entry| Arc::clone(&entry.manager))
            .ok_or_else(|| {
                PropertyError::Structural(format!("no layer at priority {priority} to replace"))
            })?;

        let mut keys = key_set(&old);
        keys.extend(manager.keys());
        let before = self.visible(&keys);

        let entry = self.attach(priority, &manager);
        let displaced = {
            let mut layers = self.layers.write();
            match layers
                .iter()
                .position(|e| e.priority == priority && same_manager(&e.manager, &old))
            {
                Some(index) => Some(std::mem::replace(&mut layers[index], entry)),
                None => {
                    // Removed concurrently from a callback; keep the new layer anyway.
                    layers.push(entry);
                    None
                }
            }
        };
        if let Some(displaced) = displaced {
            displaced.subscription.cancel();
        }

        let changes = diff(&keys, &before, &self.visible(&keys));
        debug!(priority, changed = changes.len(), "replaced property layer");
        self.dispatcher.fire(&changes);
        Ok(())
    }

    /// Layers with their priorities, in resolution order.
    pub fn layers(&self) -> Vec<(u32, SharedManager)> {
        let mut layers: Vec<(u32, SharedManager)> = self
            .layers
            .read()
            .iter()
            .map(|entry| (entry.priority, Arc::clone(&entry.manager)))
            .collect();
        layers.sort_by_key(|(priority, _)| *priority);
        layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.read().len()
    }

    /// The layer currently answering for `key`, falling back to the topmost.
    pub fn resolve(&self, key: &str) -> Option<SharedManager> {
        let ordered = self.ordered();
        let found = ordered.iter().find(|m| m.contains(key)).cloned();
        found.or_else(|| ordered.into_iter().next())
    }

    fn ordered(&self) -> Vec<SharedManager> {
        self.layers().into_iter().map(|(_, manager)| manager).collect()
    }

    fn attach(&self, priority: u32, manager: &SharedManager) -> LayerEntry {
        let subscription = manager.subscribe(self.forwarder(manager));
        LayerEntry {
            priority,
            manager: Arc::clone(manager),
            subscription,
        }
    }

    fn forwarder(&self, manager: &SharedManager) -> ChangesCallback {
        let stack = self.this.clone();
        let layer = Arc::downgrade(manager);
        Box::new(move |changes: &Changes| {
            if let (Some(stack), Some(layer)) = (stack.upgrade(), layer.upgrade()) {
                stack.receive_event(&layer, changes);
            }
        })
    }

    /// Re-dispatch a member's change batch, keeping only visible effects.
    fn receive_event(&self, layer: &SharedManager, changes: &Changes) {
        let ordered = self.ordered();
        let Some(position) = ordered.iter().position(|m| same_manager(m, layer)) else {
            return;
        };

        let mut forward = Changes::new();
        for (key, change) in changes {
            let top = ordered.iter().position(|m| m.contains(key));
            match (change, top) {
                (Change::Set(_), Some(top)) if top == position => {
                    forward.insert(key.clone(), change.clone());
                }
                (Change::Deleted, None) => {
                    forward.insert(key.clone(), Change::Deleted);
                }
                // The deleting layer was shadowing the one that now answers.
                (Change::Deleted, Some(top)) if top > position => {
                    if let Ok(value) = ordered[top].get(key) {
                        forward.insert(key.clone(), Change::Set(value));
                    }
                }
                _ => {}
            }
        }

        self.dispatcher.fire(&forward);
    }

    /// Visible values of `keys`; keys no layer defines are omitted.
    fn visible(&self, keys: &BTreeSet<String>) -> Properties {
        let ordered = self.ordered();
        keys.iter()
            .filter_map(|key| {
                ordered
                    .iter()
                    .find(|m| m.contains(key))
                    .and_then(|m| m.get(key).ok())
                    .map(|value| (key.clone(), value))
            })
            .collect()
    }
}

fn key_set(manager: &SharedManager) -> BTreeSet<String> {
    manager.keys().into_iter().collect()
}

/// Changes turning `before` into `after`, restricted to `keys`.
fn diff(keys: &BTreeSet<String>, before: &Properties, after: &Properties) -> Changes {
    let mut changes = Changes::new();
    for key in keys {
        match (before.get(key), after.get(key)) {
            (old, Some(new)) if old != Some(new) => {
                changes.insert(key.clone(), Change::Set(new.clone()));
            }
            (Some(_), None) => {
                changes.insert(key.clone(), Change::Deleted);
            }
            _ => {}
        }
    }
    changes
}

impl Drop for PropertyStack {
    fn drop(&mut self) {
        for entry in self.layers.get_mut().iter() {
            entry.subscription.cancel();
        }
    }
}

impl PropertyManager for PropertyStack {
    fn get(&self, key: &str) -> Result<Value> {
        self.resolve(key)
            .ok_or_else(|| PropertyError::NotFound(key.to_string()))?
            .get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.resolve(key)
            .ok_or_else(|| PropertyError::Structural("stack has no layers to write to".to_string()))?
            .set(key, value)
    }

    fn contains(&self, key: &str) -> bool {
        self.resolve(key).is_some_and(|m| m.contains(key))
    }

    /// Remove `key` from every layer defining it.
    ///
    /// Lower-precedence layers are cleared first so subscribers observe a
    /// single deletion instead of the key resurfacing from a lower layer.
    fn delete(&self, key: &str) -> Result<()> {
        let holders: Vec<SharedManager> = self
            .ordered()
            .into_iter()
            .rev()
            .filter(|m| m.contains(key))
            .collect();
        if holders.is_empty() {
            return Err(PropertyError::NotFound(key.to_string()));
        }
        for holder in holders {
            holder.delete(key)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let keys: BTreeSet<String> = self
            .ordered()
            .iter()
            .flat_map(|m| m.keys())
            .collect();
        keys.into_iter().collect()
    }

    fn snapshot(&self) -> Properties {
        let keys: BTreeSet<String> = self.keys().into_iter().collect();
        self.visible(&keys)
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
