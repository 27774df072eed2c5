//! Store collaborator interface.
//!
//! The queue protocol only needs a handful of primitives from the shared
//! store: atomic scripts, list push/pop (including a blocking pop), counter
//! reads and broadcast publish/subscribe. Backends live in `infra::store`.

use std::time::Duration;

use async_trait::async_trait;

use crate::core::{ScriptCall, ScriptReply, StoreResult};

/// End of a list to pop from. Pushes always go to the left end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    /// Head of the list (most recently pushed).
    Left,
    /// Tail of the list (oldest pushed).
    Right,
}

/// Subscription to a broadcast channel.
#[async_trait]
pub trait Subscription: Send {
    /// Wait for the next message payload. `None` once the subscription closed.
    async fn next_message(&mut self) -> StoreResult<Option<String>>;
}

/// Shared multi-client store.
///
/// Implementations must execute [`Store::run_script`] atomically with respect
/// to every other script call on the same keys, and must deliver a published
/// message to every subscriber registered before the publish.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Execute one atomic script.
    async fn run_script(&self, call: &ScriptCall) -> StoreResult<ScriptReply>;

    /// Pop one value without waiting.
    async fn pop(&self, key: &str, end: ListEnd) -> StoreResult<Option<String>>;

    /// Pop one value, waiting up to `timeout` (forever on `None`) for one to
    /// arrive. Returns `None` when the timeout elapsed.
    async fn blocking_pop(
        &self,
        key: &str,
        end: ListEnd,
        timeout: Option<Duration>,
    ) -> StoreResult<Option<String>>;

    /// Push `value` on the left end, returning the new length.
    async fn push(&self, key: &str, value: &str) -> StoreResult<usize>;

    /// Current length of a list, zero when missing.
    async fn list_len(&self, key: &str) -> StoreResult<usize>;

    /// Current value of an integer counter, zero when missing.
    async fn counter(&self, key: &str) -> StoreResult<i64>;

    /// Publish `message` on `channel`, returning the number of receivers.
    async fn publish(&self, channel: &str, message: &str) -> StoreResult<usize>;

    /// Subscribe to `channel`. Messages published after this returns are
    /// delivered to the subscription.
    async fn subscribe(&self, channel: &str) -> StoreResult<Box<dyn Subscription>>;

    /// Remove `keys`, returning how many existed.
    async fn delete(&self, keys: &[&str]) -> StoreResult<usize>;
}
