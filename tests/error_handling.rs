//! Error handling and edge case tests.

use parking_lot::Mutex;
use propstack::{
    Change, Changes, PropertyError, PropertyLayer, PropertyManager, PropertyManagerExt,
    PropertyStack, PropertyValidator, RegexValidator, SharedManager,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::Once;

static INIT: Once = Once::new();

/// Route `tracing` output to the test harness so panicking observers are visible.
fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// --- Read Errors ---

#[test]
fn test_get_missing_key() {
    let layer = PropertyLayer::new();
    let result = layer.get("nonexistent");
    assert!(matches!(result, Err(PropertyError::NotFound(ref k)) if k == "nonexistent"));
}

#[test]
fn test_filtered_key_reads_as_not_found() {
    let layer = PropertyLayer::from_pairs([("password", json!("secret"))]).shared();
    let public = layer.filter(["username"]);

    assert!(matches!(public.get("password"), Err(PropertyError::NotFound(_))));
    assert!(!public.contains("password"));
    assert!(public.is_empty());
}

// --- Write Errors ---

#[test]
fn test_filtered_key_write_rejected() {
    let layer = PropertyLayer::new().shared();
    let public = layer.filter(["username"]);

    let result = public.set("password", json!("x"));
    assert!(matches!(result, Err(PropertyError::KeyRejected(ref k)) if k == "password"));
    assert!(!layer.contains("password"));
}

#[test]
fn test_validation_failure_leaves_store_unchanged() {
    let layer = PropertyLayer::from_pairs([("callsign", json!("DL1ABC"))]).shared();
    let validated = PropertyValidator::new(layer.clone());
    validated.set_validator("callsign", RegexValidator::new("[A-Z0-9]{3,7}").unwrap());

    let result = validated.set("callsign", json!("not a callsign"));
    assert!(matches!(result, Err(PropertyError::ValidationFailed { .. })));
    assert_eq!(validated.get("callsign").unwrap(), json!("DL1ABC"));
}

#[test]
fn test_readonly_view_in_stack() {
    let locked: SharedManager = Arc::new(
        PropertyLayer::from_pairs([("mode", json!("fm"))])
            .shared()
            .readonly(),
    );
    let stack = PropertyStack::new();
    stack.add_layer(0, locked);

    assert!(matches!(
        stack.set("mode", json!("am")),
        Err(PropertyError::WriteProtected(_))
    ));
    assert!(matches!(
        stack.delete("mode"),
        Err(PropertyError::WriteProtected(_))
    ));
    assert_eq!(stack.get("mode").unwrap(), json!("fm"));
}

#[test]
fn test_stack_delete_stops_at_readonly_layer() {
    let top = PropertyLayer::from_pairs([("mode", json!("fm"))]).shared();
    let bottom: SharedManager = Arc::new(
        PropertyLayer::from_pairs([("mode", json!("am"))])
            .shared()
            .readonly(),
    );
    let stack = PropertyStack::new();
    stack.add_layer(0, top.clone());
    stack.add_layer(1, bottom);

    // The lower layer is cleared first and refuses, so nothing is deleted.
    assert!(stack.delete("mode").is_err());
    assert!(top.contains("mode"));
    assert_eq!(stack.get("mode").unwrap(), json!("fm"));
}

// --- Structural Errors ---

#[test]
fn test_remove_unknown_layer() {
    let stack = PropertyStack::new();
    let stranger: SharedManager = Arc::new(PropertyLayer::new());

    let result = stack.remove_layer(&stranger);
    assert!(matches!(result, Err(PropertyError::Structural(_))));
}

#[test]
fn test_replace_empty_priority() {
    let stack = PropertyStack::new();
    stack.add_layer(0, Arc::new(PropertyLayer::new()));

    let result = stack.replace_layer(3, Arc::new(PropertyLayer::new()));
    assert!(matches!(result, Err(PropertyError::Structural(_))));
    assert_eq!(stack.layer_count(), 1);
}

#[test]
fn test_delete_missing_from_stack() {
    let stack = PropertyStack::new();
    stack.add_layer(0, Arc::new(PropertyLayer::new()));
    assert!(matches!(stack.delete("x"), Err(PropertyError::NotFound(_))));
}

// --- Observer Failures ---

#[test]
fn test_panicking_observer_does_not_corrupt_store() {
    init_logging();
    let layer = PropertyLayer::new();

    let _bad = layer.subscribe(Box::new(|_: &Changes| panic!("observer bug")));
    let _bad_key = layer.subscribe_key("freq", Box::new(|_: &Change| panic!("key observer bug")));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _good = layer.subscribe_key(
        "freq",
        Box::new(move |change: &Change| sink.lock().push(change.clone())),
    );

    layer.set("freq", json!(100)).unwrap();
    layer.set("freq", json!(200)).unwrap();

    assert_eq!(layer.get("freq").unwrap(), json!(200));
    assert_eq!(
        *seen.lock(),
        vec![Change::Set(json!(100)), Change::Set(json!(200))]
    );
}

#[test]
fn test_double_cancel_is_noop() {
    let layer = PropertyLayer::new();
    let sub = layer.subscribe(Box::new(|_: &Changes| {}));

    sub.cancel();
    sub.cancel();
    layer.unsubscribe(&sub);
    assert!(!sub.is_active());
    assert_eq!(layer.dispatcher().subscription_count(), 0);
}

#[test]
fn test_subscription_outlives_manager() {
    let layer = PropertyLayer::new();
    let sub = layer.subscribe(Box::new(|_: &Changes| {}));
    drop(layer);

    assert!(!sub.is_active());
    sub.cancel();
}

#[test]
fn test_error_messages() {
    assert_eq!(
        PropertyError::WriteProtected("mode".into()).to_string(),
        "Property \"mode\" is not writeable"
    );
    assert_eq!(
        PropertyError::NotFound("mode".into()).to_string(),
        "Property not found: mode"
    );
}
