//! Tests for error types

use queuify::core::{QueueError, StoreError};

#[test]
fn test_queue_full_error() {
    let err = QueueError::Full("jobs".to_string());
    assert_eq!(format!("{}", err), "queue full: jobs");
    assert!(err.is_recoverable());
}

#[test]
fn test_queue_empty_error() {
    let err = QueueError::Empty("jobs".to_string());
    assert_eq!(format!("{}", err), "queue empty: jobs");
}

#[test]
fn test_timeout_error() {
    let err = QueueError::Timeout;
    assert_eq!(format!("{}", err), "operation timed out");
    assert!(err.is_recoverable());
}

#[test]
fn test_excess_completion_error() {
    let err = QueueError::ExcessCompletion("jobs".to_string());
    assert_eq!(
        format!("{}", err),
        "task_done() called too many times on queue `jobs`"
    );
    assert!(!err.is_recoverable());
}

#[test]
fn test_store_error_wraps() {
    let err: QueueError = StoreError::Connection("refused".to_string()).into();
    assert_eq!(format!("{}", err), "store error: store connection failed: refused");
    assert!(!err.is_recoverable());
}

#[test]
fn test_decode_error_keeps_payload() {
    let err = QueueError::Decode {
        payload: "not json".to_string(),
        reason: "expected value".to_string(),
    };
    assert_eq!(format!("{}", err), "failed to decode item: expected value");
    match err {
        QueueError::Decode { payload, .. } => assert_eq!(payload, "not json"),
        other => panic!("unexpected {other:?}"),
    }
}
