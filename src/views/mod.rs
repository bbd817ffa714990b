//! Views wrapping another manager.
//!
//! - [`PropertyFilter`]: exposes only keys accepted by a [`KeyFilter`]
//! - [`PropertyDelegator`]: transparent pass-through
//! - [`PropertyValidator`]: checks writes against per-key rules
//! - [`PropertyReadOnly`]: rejects every write
//!
//! Views hold the wrapped manager through a shared handle and re-fire its
//! events to their own subscribers. Dropping a view cancels its
//! subscription on the wrapped manager.

mod delegator;
mod filter;
mod validator;

pub use delegator::{PropertyDelegator, PropertyReadOnly};
pub use filter::{ByLambda, ByPropertyName, KeyFilter, PropertyFilter};
pub use validator::PropertyValidator;
