//! Tests for utility functions

use std::time::Duration;

use queuify::util::{init_tracing, Deadline};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_deadline_remaining_is_bounded() {
    let deadline = Deadline::after(Some(Duration::from_secs(60)));
    let left = deadline.remaining().unwrap();
    assert!(left <= Duration::from_secs(60));
    assert!(left > Duration::from_secs(50));
    assert!(!deadline.is_expired());
}

#[test]
fn test_deadline_never() {
    assert!(Deadline::never().instant().is_none());
}
