//! Join barrier: unfinished-task counter plus broadcast wake-up.
//!
//! The barrier is Pending while the counter is positive and Quiescent at
//! zero. `task_done` performs the Pending to Quiescent transition inside an
//! atomic script that publishes exactly one drained message; every joiner
//! subscribed at that moment is released by it.

use std::sync::Arc;

use crate::core::{
    KeySpace, QueueError, QueueResult, ScriptCall, Store, StoreError, DELETED_MESSAGE,
    DRAINED_MESSAGE, EXCESS_COMPLETION_REPLY,
};
use crate::util::clock::Deadline;

/// How a `join` call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Every produced item has been marked done.
    Drained,
    /// The queue was deleted while waiting.
    Deleted,
    /// The timeout elapsed first.
    TimedOut,
}

impl JoinOutcome {
    /// True unless the wait timed out.
    pub const fn is_released(self) -> bool {
        !matches!(self, Self::TimedOut)
    }
}

/// Join barrier for one queue.
#[derive(Clone)]
pub struct JoinBarrier {
    store: Arc<dyn Store>,
    keys: KeySpace,
}

impl JoinBarrier {
    /// Barrier over the counter and channel of `keys`.
    pub fn new(store: Arc<dyn Store>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Fresh read of the unfinished-task counter.
    pub async fn unfinished(&self) -> QueueResult<u64> {
        let value = self.store.counter(self.keys.unfinished()).await?;
        Ok(u64::try_from(value).unwrap_or(0))
    }

    /// Mark one task done, returning the remaining count.
    ///
    /// Fails with [`QueueError::ExcessCompletion`] without touching the
    /// counter when it is already zero.
    pub async fn task_done(&self) -> QueueResult<u64> {
        let reply = self
            .store
            .run_script(&ScriptCall::task_done(&self.keys))
            .await
            .map_err(|e| {
                if e.is_script_reply(EXCESS_COMPLETION_REPLY) {
                    QueueError::ExcessCompletion(self.keys.name().to_owned())
                } else {
                    QueueError::Store(e)
                }
            })?;
        let remaining = reply.as_integer().ok_or_else(|| {
            StoreError::UnexpectedReply(format!("task_done returned {reply:?}"))
        })?;
        if remaining == 0 {
            tracing::debug!(queue = %self.keys.name(), "queue drained");
        }
        Ok(u64::try_from(remaining).unwrap_or(0))
    }

    /// Wait until the counter reaches zero, the queue is deleted, or
    /// `deadline` passes.
    pub async fn wait(&self, deadline: Deadline) -> QueueResult<JoinOutcome> {
        if self.unfinished().await? == 0 {
            return Ok(JoinOutcome::Drained);
        }
        let mut subscription = self.store.subscribe(self.keys.join_channel()).await?;
        // The counter may have reached zero between the first read and the
        // subscription; that publish is gone, so look again.
        if self.unfinished().await? == 0 {
            return Ok(JoinOutcome::Drained);
        }
        tracing::debug!(queue = %self.keys.name(), "join waiting for drain");
        loop {
            let next = match deadline.instant() {
                Some(at) => match tokio::time::timeout_at(at, subscription.next_message()).await {
                    Ok(next) => next?,
                    Err(_) => return Ok(JoinOutcome::TimedOut),
                },
                None => subscription.next_message().await?,
            };
            match next.as_deref() {
                Some(DRAINED_MESSAGE) => return Ok(JoinOutcome::Drained),
                Some(DELETED_MESSAGE) => return Ok(JoinOutcome::Deleted),
                Some(other) => {
                    tracing::debug!(queue = %self.keys.name(), message = %other, "ignoring join channel message");
                }
                None => {
                    return Err(StoreError::Connection(format!(
                        "join subscription on `{}` closed",
                        self.keys.join_channel()
                    ))
                    .into())
                }
            }
        }
    }
}
