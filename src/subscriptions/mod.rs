//! Subscription system for property change notification.
//!
//! Every manager owns a [`Dispatcher`]. Mutations produce a [`Changes`]
//! batch which the dispatcher delivers:
//! - first to whole-map subscribers, in registration order
//! - then to per-key subscribers of each changed key
//!
//! Callbacks run synchronously before the mutating call returns. They may
//! re-enter the manager; the subscriber list is snapshotted per batch and
//! no lock is held while a callback runs. A panicking callback is logged
//! and skipped.
//!
//! # Example
//!
//! ```ignore
//! let layer = PropertyLayer::new();
//!
//! let sub = layer.subscribe_key("mode", Box::new(|change: &Change| {
//!     println!("mode is now {:?}", change);
//! }));
//!
//! layer.set("mode", json!("fm"))?;
//! sub.cancel();
//! ```
//!
//! [`Changes`]: crate::types::Changes

mod channel;
mod dispatcher;
mod types;

pub use channel::{subscribe_channel, ChangeStream};
pub use dispatcher::Dispatcher;
pub use types::{ChangesCallback, KeyCallback, Subscription};
