//! # Property Stack
//!
//! A reactive, layered property store: string keys mapped to JSON values,
//! with priority-based layering, change notification, and guarded views.
//!
//! ## Core Concepts
//!
//! - **Layers**: In-memory stores; the only managers holding data
//! - **Views**: Filters, validators and read-only wrappers over another manager
//! - **Stacks**: Layers resolved by priority into one key space
//! - **Subscriptions**: Callbacks receiving change batches or single-key changes
//!
//! Every kind implements [`PropertyManager`] and can be used through a
//! [`SharedManager`] without knowing which kind it is.
//!
//! ## Example
//!
//! ```ignore
//! use propstack::{PropertyLayer, PropertyManager, PropertyStack};
//! use serde_json::json;
//!
//! let defaults = PropertyLayer::from_pairs([("mode", json!("am")), ("freq", json!(100))]).shared();
//! let profile = PropertyLayer::from_pairs([("mode", json!("fm"))]).shared();
//!
//! let stack = PropertyStack::new();
//! stack.add_layer(1, defaults);
//! stack.add_layer(0, profile.clone());
//! assert_eq!(stack.get("mode")?, json!("fm"));
//!
//! // Falls back to the defaults and notifies {"mode": "am"}.
//! stack.remove_layer(&(profile as SharedManager))?;
//! ```

pub mod context;
pub mod error;
pub mod layer;
pub mod manager;
pub mod stack;
pub mod subscriptions;
pub mod types;
pub mod validators;
pub mod views;

// Re-exports
pub use context::{ContextConfig, PropertyContext};
pub use error::{PropertyError, Result};
pub use layer::PropertyLayer;
pub use manager::{same_manager, PropertyManager, PropertyManagerExt, SharedManager};
pub use stack::PropertyStack;
pub use subscriptions::{
    subscribe_channel, ChangeStream, ChangesCallback, Dispatcher, KeyCallback, Subscription,
};
pub use types::*;
pub use validators::{
    LambdaValidator, OrValidator, RangeValidator, RegexValidator, TypeValidator, Validator,
    ValueKind,
};
pub use views::{
    ByLambda, ByPropertyName, KeyFilter, PropertyDelegator, PropertyFilter, PropertyReadOnly,
    PropertyValidator,
};
