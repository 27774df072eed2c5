//! Tests for the key space model

use queuify::core::{KeySpace, ScriptCall, Script};

#[test]
fn test_custom_namespace() {
    let keys = KeySpace::with_namespace("app:queues", "emails");
    assert_eq!(keys.queue(), "app:queues:emails");
    assert_eq!(keys.semaphore(), "app:queues:emails:sem");
    assert_eq!(keys.unfinished(), "app:queues:emails:unfinished");
    assert_eq!(keys.join_channel(), "app:queues:emails:join");
}

#[test]
fn test_distinct_names_never_share_keys() {
    let a = KeySpace::new("a");
    let b = KeySpace::new("b");
    for key in a.persisted() {
        assert!(!b.persisted().contains(&key));
    }
    assert_ne!(a.join_channel(), b.join_channel());
}

#[test]
fn test_initialize_call_targets_queue_and_semaphore() {
    let keys = KeySpace::new("jobs");
    let call = ScriptCall::initialize(&keys, 4);
    assert_eq!(call.script, Script::Initialize);
    assert_eq!(call.key(0), Some(keys.queue()));
    assert_eq!(call.key(1), Some(keys.semaphore()));
    assert_eq!(call.arg(0), Some("4"));
}
