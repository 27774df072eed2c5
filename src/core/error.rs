//! Error types for queue and store operations.

use thiserror::Error;

/// Errors raised by a store backend.
///
/// Script error replies are kept apart from transport failures so the queue
/// facade can translate the designed replies (empty, excess completion) into
/// typed outcomes while surfacing everything else untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not reach or connect to the store.
    #[error("store connection failed: {0}")]
    Connection(String),
    /// A command was rejected or failed in flight.
    #[error("store command failed: {0}")]
    Command(String),
    /// An atomic script finished with an error reply.
    #[error("script error reply: {0}")]
    ScriptReply(String),
    /// The store answered with a value the caller did not expect.
    #[error("unexpected store reply: {0}")]
    UnexpectedReply(String),
}

impl StoreError {
    /// True when this is a script error reply carrying `marker`.
    pub fn is_script_reply(&self, marker: &str) -> bool {
        matches!(self, Self::ScriptReply(text) if text.contains(marker))
    }
}

/// Errors produced by queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Bounded queue has no free slot.
    #[error("queue full: {0}")]
    Full(String),
    /// No item available.
    #[error("queue empty: {0}")]
    Empty(String),
    /// A blocking call ran out of time before its condition was met.
    #[error("operation timed out")]
    Timeout,
    /// `task_done` was reported more times than items were put.
    #[error("task_done() called too many times on queue `{0}`")]
    ExcessCompletion(String),
    /// Item could not be encoded for the store.
    #[error("failed to encode item: {0}")]
    Encode(String),
    /// A popped payload could not be decoded; the raw payload is returned.
    #[error("failed to decode item: {reason}")]
    Decode {
        /// Raw payload as it was stored.
        payload: String,
        /// Decoder message.
        reason: String,
    },
    /// Configuration rejected before touching the store.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Store-level failure, never retried by the queue.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl QueueError {
    /// Check if this error is an expected outcome the caller can retry.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Full(_) | Self::Empty(_) | Self::Timeout)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(QueueError::Full("q".into()).is_recoverable());
        assert!(QueueError::Empty("q".into()).is_recoverable());
        assert!(QueueError::Timeout.is_recoverable());
        assert!(!QueueError::ExcessCompletion("q".into()).is_recoverable());
        assert!(!QueueError::Store(StoreError::Command("boom".into())).is_recoverable());
    }

    #[test]
    fn test_script_reply_marker() {
        let err = StoreError::ScriptReply("ERR QUEUE_EMPTY".into());
        assert!(err.is_script_reply("QUEUE_EMPTY"));
        assert!(!err.is_script_reply("TASK_DONE_EXCESS"));
        assert!(!StoreError::Command("QUEUE_EMPTY".into()).is_script_reply("QUEUE_EMPTY"));
    }
}
