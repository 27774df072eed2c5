//! Queue facade: blocking FIFO semantics composed from atomic scripts.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::{
    JoinBarrier, JoinOutcome, KeySpace, ListEnd, QueueError, QueueResult, ScriptCall, Semaphore,
    Store, StoreError, DELETED_MESSAGE, EMPTY_REPLY,
};
use crate::util::clock::Deadline;

/// Marker trait for values that can travel through a queue.
///
/// Items are encoded as JSON before they reach the store.
pub trait QueueItem: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Blanket implementation: any type meeting the requirements is a `QueueItem`.
impl<T> QueueItem for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Capability set shared by every queue flavour.
///
/// `timeout` arguments bound how long a call may block; `None` blocks until
/// the condition is met. A call whose timeout elapses returns
/// [`QueueError::Timeout`] and has no side effect of its own.
#[async_trait]
pub trait TaskQueue<T: QueueItem>: Send + Sync {
    /// Put an item, waiting for a free slot on a full bounded queue.
    async fn put(&self, item: T, timeout: Option<Duration>) -> QueueResult<()>;
    /// Put an item or fail with [`QueueError::Full`].
    async fn put_nowait(&self, item: T) -> QueueResult<()>;
    /// Remove and return the oldest item, waiting for one to arrive.
    ///
    /// Not cancellation safe: a future dropped after the item left the store
    /// loses that item, along with one capacity token until the next attach.
    async fn get(&self, timeout: Option<Duration>) -> QueueResult<T>;
    /// Remove and return the oldest item or fail with [`QueueError::Empty`].
    async fn get_nowait(&self) -> QueueResult<T>;
    /// Report one retrieved item as processed; returns the remaining count.
    async fn task_done(&self) -> QueueResult<u64>;
    /// Wait until every item put so far has been marked done.
    async fn join(&self, timeout: Option<Duration>) -> QueueResult<JoinOutcome>;
    /// Approximate number of queued items.
    async fn qsize(&self) -> QueueResult<usize>;
    /// True when no item is queued (advisory).
    async fn empty(&self) -> QueueResult<bool>;
    /// True when a bounded queue holds `maxsize` items (advisory).
    async fn full(&self) -> QueueResult<bool>;
    /// Configured capacity; `<= 0` means unbounded.
    fn maxsize(&self) -> i64;
}

/// FIFO queue shared by any number of processes through a [`Store`].
///
/// No state is cached client-side: `qsize`, `empty` and `full` read the
/// store every time and may be stale by the time the caller acts on them.
pub struct DistributedQueue<T> {
    store: Arc<dyn Store>,
    keys: KeySpace,
    maxsize: i64,
    semaphore: Option<Semaphore>,
    barrier: JoinBarrier,
    _item: PhantomData<fn() -> T>,
}

impl<T: QueueItem> DistributedQueue<T> {
    /// Attach to queue `name` under the default namespace.
    pub async fn attach(store: Arc<dyn Store>, name: &str, maxsize: i64) -> QueueResult<Self> {
        Self::attach_with_keys(store, KeySpace::new(name), maxsize).await
    }

    /// Attach to the queue at `keys`, reconciling the capacity tokens with
    /// `maxsize` and the current queue length.
    pub async fn attach_with_keys(
        store: Arc<dyn Store>,
        keys: KeySpace,
        maxsize: i64,
    ) -> QueueResult<Self> {
        let semaphore =
            (maxsize > 0).then(|| Semaphore::new(Arc::clone(&store), keys.semaphore()));
        let barrier = JoinBarrier::new(Arc::clone(&store), keys.clone());
        let queue = Self {
            store,
            keys,
            maxsize,
            semaphore,
            barrier,
            _item: PhantomData,
        };
        queue.initialize().await?;
        Ok(queue)
    }

    async fn initialize(&self) -> QueueResult<()> {
        if self.maxsize <= 0 {
            tracing::info!(queue = %self.keys.name(), "attached unbounded queue");
            return Ok(());
        }
        let reply = self
            .store
            .run_script(&ScriptCall::initialize(&self.keys, self.maxsize))
            .await?;
        tracing::info!(
            queue = %self.keys.name(),
            maxsize = self.maxsize,
            token_delta = ?reply.as_integer(),
            "attached bounded queue"
        );
        Ok(())
    }

    /// Logical queue name.
    pub fn name(&self) -> &str {
        self.keys.name()
    }

    /// Store keys used by this queue.
    pub const fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Fresh read of the unfinished-task counter.
    pub async fn unfinished_tasks(&self) -> QueueResult<u64> {
        self.barrier.unfinished().await
    }

    /// Remove every key of the queue and release current joiners with
    /// [`JoinOutcome::Deleted`].
    pub async fn delete(self) -> QueueResult<()> {
        let removed = self.store.delete(&self.keys.persisted()).await?;
        self.store
            .publish(self.keys.join_channel(), DELETED_MESSAGE)
            .await?;
        tracing::info!(queue = %self.keys.name(), removed, "deleted queue");
        Ok(())
    }

    fn encode(item: &T) -> QueueResult<String> {
        serde_json::to_string(item).map_err(|e| QueueError::Encode(e.to_string()))
    }

    fn decode(payload: String) -> QueueResult<T> {
        serde_json::from_str(&payload).map_err(|e| QueueError::Decode {
            reason: e.to_string(),
            payload,
        })
    }

    fn full_error(&self) -> QueueError {
        QueueError::Full(self.keys.name().to_owned())
    }

    /// Capacity-checked append. `Ok(false)` when the queue is full.
    async fn try_append(&self, payload: &str) -> QueueResult<bool> {
        let reply = self
            .store
            .run_script(&ScriptCall::put_nowait(&self.keys, payload, self.maxsize))
            .await?;
        match reply.as_integer() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(StoreError::UnexpectedReply(format!("put_nowait returned {reply:?}")).into()),
        }
    }

    async fn put_bounded(
        &self,
        semaphore: &Semaphore,
        payload: &str,
        deadline: Deadline,
    ) -> QueueResult<()> {
        loop {
            let Some(permit) = semaphore.acquire(deadline).await? else {
                return Err(QueueError::Timeout);
            };
            // The token only says a slot was probably free; the atomic append
            // decides.
            match self.try_append(payload).await {
                Ok(true) => {
                    permit.consume();
                    return Ok(());
                }
                Ok(false) => {
                    // No free slot behind this token: it was surplus
                    // (a token left by a put_nowait or a concurrent resize).
                    permit.discard();
                    if deadline.is_expired() {
                        return Err(QueueError::Timeout);
                    }
                }
                Err(e) => {
                    if let Err(release) = permit.release().await {
                        tracing::warn!(
                            queue = %self.keys.name(),
                            error = %release,
                            "failed to return capacity token after put error"
                        );
                    }
                    return Err(e);
                }
            }
        }
    }

    /// Push one token back after an item left the queue outside a script.
    async fn replenish(&self) {
        if let Some(semaphore) = &self.semaphore {
            if let Err(e) = semaphore.release().await {
                tracing::warn!(
                    queue = %self.keys.name(),
                    error = %e,
                    "failed to replenish capacity token after get"
                );
            }
        }
    }
}

#[async_trait]
impl<T: QueueItem> TaskQueue<T> for DistributedQueue<T> {
    async fn put(&self, item: T, timeout: Option<Duration>) -> QueueResult<()> {
        let payload = Self::encode(&item)?;
        match &self.semaphore {
            Some(semaphore) => {
                self.put_bounded(semaphore, &payload, Deadline::after(timeout))
                    .await
            }
            None => {
                self.store
                    .run_script(&ScriptCall::put(&self.keys, &payload))
                    .await?;
                Ok(())
            }
        }
    }

    async fn put_nowait(&self, item: T) -> QueueResult<()> {
        let payload = Self::encode(&item)?;
        if self.try_append(&payload).await? {
            Ok(())
        } else {
            Err(self.full_error())
        }
    }

    async fn get(&self, timeout: Option<Duration>) -> QueueResult<T> {
        let deadline = Deadline::after(timeout);
        let popped = match deadline.remaining() {
            Some(left) if left.is_zero() => {
                self.store.pop(self.keys.queue(), ListEnd::Right).await?
            }
            left => {
                self.store
                    .blocking_pop(self.keys.queue(), ListEnd::Right, left)
                    .await?
            }
        };
        let Some(payload) = popped else {
            return Err(QueueError::Timeout);
        };
        // The item is already out of the store; a failed replenish must not
        // lose it.
        self.replenish().await;
        Self::decode(payload)
    }

    async fn get_nowait(&self) -> QueueResult<T> {
        let reply = self
            .store
            .run_script(&ScriptCall::get_nowait(&self.keys, self.maxsize))
            .await
            .map_err(|e| {
                if e.is_script_reply(EMPTY_REPLY) {
                    QueueError::Empty(self.keys.name().to_owned())
                } else {
                    QueueError::Store(e)
                }
            })?;
        let payload = reply.into_item().ok_or_else(|| {
            StoreError::UnexpectedReply("get_nowait returned a non-item reply".into())
        })?;
        Self::decode(payload)
    }

    async fn task_done(&self) -> QueueResult<u64> {
        self.barrier.task_done().await
    }

    async fn join(&self, timeout: Option<Duration>) -> QueueResult<JoinOutcome> {
        self.barrier.wait(Deadline::after(timeout)).await
    }

    async fn qsize(&self) -> QueueResult<usize> {
        Ok(self.store.list_len(self.keys.queue()).await?)
    }

    async fn empty(&self) -> QueueResult<bool> {
        Ok(self.qsize().await? == 0)
    }

    async fn full(&self) -> QueueResult<bool> {
        if self.maxsize <= 0 {
            return Ok(false);
        }
        let len = i64::try_from(self.qsize().await?).unwrap_or(i64::MAX);
        Ok(len >= self.maxsize)
    }

    fn maxsize(&self) -> i64 {
        self.maxsize
    }
}

impl<T> fmt::Debug for DistributedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedQueue")
            .field("name", &self.keys.name())
            .field("key", &self.keys.queue())
            .field("maxsize", &self.maxsize)
            .finish()
    }
}
