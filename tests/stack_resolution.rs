//! Layer resolution and event visibility in stacks.

use parking_lot::Mutex;
use propstack::{
    changes, Change, Changes, PropertyLayer, PropertyManager, PropertyStack, SharedManager,
    Subscription,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn layer(pairs: &[(&str, Value)]) -> Arc<PropertyLayer> {
    PropertyLayer::from_pairs(pairs.iter().map(|(k, v)| (k.to_string(), v.clone()))).shared()
}

fn record(stack: &PropertyStack) -> (Arc<Mutex<Vec<Changes>>>, Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = stack.subscribe(Box::new(move |batch: &Changes| {
        sink.lock().push(batch.clone());
    }));
    (seen, sub)
}

// --- Precedence ---

#[test]
fn test_precedence_and_removal() {
    let top = layer(&[("k", json!("top"))]);
    let bottom = layer(&[("k", json!("bottom"))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, top.clone());
    stack.add_layer(1, bottom.clone());
    assert_eq!(stack.get("k").unwrap(), json!("top"));

    let (seen, _sub) = record(&stack);
    let top: SharedManager = top;
    stack.remove_layer(&top).unwrap();

    assert_eq!(stack.get("k").unwrap(), json!("bottom"));
    assert_eq!(*seen.lock(), vec![changes([("k", json!("bottom"))])]);
}

#[test]
fn test_insertion_order_does_not_matter() {
    let top = layer(&[("k", json!("top"))]);
    let bottom = layer(&[("k", json!("bottom"))]);
    let stack = PropertyStack::new();
    stack.add_layer(1, bottom);

    let (seen, _sub) = record(&stack);
    stack.add_layer(0, top);

    assert_eq!(stack.get("k").unwrap(), json!("top"));
    assert_eq!(*seen.lock(), vec![changes([("k", json!("top"))])]);
}

#[test]
fn test_layers_listed_in_resolution_order() {
    let stack = PropertyStack::new();
    stack.add_layer(7, layer(&[]));
    stack.add_layer(0, layer(&[]));
    stack.add_layer(3, layer(&[]));

    let priorities: Vec<u32> = stack.layers().into_iter().map(|(p, _)| p).collect();
    assert_eq!(priorities, vec![0, 3, 7]);
    assert_eq!(stack.layer_count(), 3);
}

// --- Removal ---

#[test]
fn test_remove_fires_deletion_only_when_gone_everywhere() {
    let top = layer(&[("shared", json!(1)), ("only_top", json!(2))]);
    let bottom = layer(&[("shared", json!(1))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, top.clone());
    stack.add_layer(1, bottom);

    let (seen, _sub) = record(&stack);
    let top: SharedManager = top;
    stack.remove_layer(&top).unwrap();

    // "shared" keeps its value, so only "only_top" is reported.
    assert_eq!(*seen.lock(), vec![changes([("only_top", Change::Deleted)])]);
    assert!(stack.contains("shared"));
}

#[test]
fn test_replace_is_one_atomic_diff() {
    let old = layer(&[("mode", json!("fm")), ("freq", json!(100)), ("gone", json!(true))]);
    let new = layer(&[("mode", json!("fm")), ("freq", json!(200)), ("added", json!(1))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, old.clone());

    let (seen, _sub) = record(&stack);
    stack.replace_layer(0, new.clone()).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![changes([
            ("added", Change::Set(json!(1))),
            ("freq", Change::Set(json!(200))),
            ("gone", Change::Deleted),
        ])]
    );

    // The old layer no longer feeds the stack; the new one does.
    old.set("freq", json!(300)).unwrap();
    new.set("freq", json!(400)).unwrap();
    assert_eq!(seen.lock().len(), 2);
    assert_eq!(stack.get("freq").unwrap(), json!(400));
}

#[test]
fn test_replace_keeps_position_among_equal_priorities() {
    let first = layer(&[("k", json!("first"))]);
    let second = layer(&[("k", json!("second"))]);
    let stack = PropertyStack::new();
    stack.add_layer(2, first);
    stack.add_layer(2, second);

    stack
        .replace_layer(2, layer(&[("k", json!("replacement"))]))
        .unwrap();
    assert_eq!(stack.get("k").unwrap(), json!("replacement"));
}

// --- Member Events ---

#[test]
fn test_shadowed_change_is_silent_until_exposed() {
    let top = layer(&[("k", json!("top"))]);
    let bottom = layer(&[("k", json!("bottom"))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, top.clone());
    stack.add_layer(1, bottom.clone());

    let (seen, _sub) = record(&stack);
    bottom.set("k", json!("bottom v2")).unwrap();
    assert!(seen.lock().is_empty());

    // Deleting in the shadowing layer exposes the remembered value.
    top.delete("k").unwrap();
    assert_eq!(*seen.lock(), vec![changes([("k", json!("bottom v2"))])]);
    assert_eq!(stack.get("k").unwrap(), json!("bottom v2"));
}

#[test]
fn test_shadowed_delete_is_silent() {
    let top = layer(&[("k", json!("top"))]);
    let bottom = layer(&[("k", json!("bottom"))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, top);
    stack.add_layer(1, bottom.clone());

    let (seen, _sub) = record(&stack);
    bottom.delete("k").unwrap();
    assert!(seen.lock().is_empty());
    assert_eq!(stack.get("k").unwrap(), json!("top"));
}

#[test]
fn test_visible_member_change_is_forwarded() {
    let top = layer(&[("mode", json!("fm"))]);
    let bottom = layer(&[("freq", json!(100))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, top);
    stack.add_layer(1, bottom.clone());

    let (seen, _sub) = record(&stack);
    bottom.set("freq", json!(200)).unwrap();
    assert_eq!(*seen.lock(), vec![changes([("freq", json!(200))])]);
}

// --- Deletion ---

#[test]
fn test_delete_only_in_lower_layer() {
    let top = layer(&[]);
    let bottom = layer(&[("k", json!(1))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, top);
    stack.add_layer(1, bottom.clone());

    let (seen, _sub) = record(&stack);
    stack.delete("k").unwrap();

    assert!(!bottom.contains("k"));
    assert_eq!(*seen.lock(), vec![changes([("k", Change::Deleted)])]);
}

#[test]
fn test_delete_removes_from_every_layer() {
    let top = layer(&[("k", json!(0))]);
    let bottom = layer(&[("k", json!(1))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, top.clone());
    stack.add_layer(1, bottom.clone());

    let (seen, _sub) = record(&stack);
    stack.delete("k").unwrap();

    assert!(!top.contains("k"));
    assert!(!bottom.contains("k"));
    assert!(!stack.contains("k"));
    assert_eq!(*seen.lock(), vec![changes([("k", Change::Deleted)])]);
}

// --- Views ---

#[test]
fn test_snapshot_resolves_every_key() {
    let top = layer(&[("mode", json!("fm"))]);
    let bottom = layer(&[("mode", json!("am")), ("freq", json!(100))]);
    let stack = PropertyStack::new();
    stack.add_layer(0, top);
    stack.add_layer(1, bottom);

    let snapshot = stack.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot["mode"], json!("fm"));
    assert_eq!(snapshot["freq"], json!(100));
    assert_eq!(stack.keys(), vec!["freq".to_string(), "mode".to_string()]);
}

#[test]
fn test_nested_stacks() {
    let inner = PropertyStack::new();
    let base = layer(&[("k", json!("base"))]);
    inner.add_layer(0, base.clone());

    let outer = PropertyStack::new();
    outer.add_layer(1, inner.clone());
    let (seen, _sub) = record(&outer);

    base.set("k", json!("changed")).unwrap();
    assert_eq!(outer.get("k").unwrap(), json!("changed"));
    assert_eq!(*seen.lock(), vec![changes([("k", json!("changed"))])]);
}
