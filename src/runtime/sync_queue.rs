//! Blocking facade over [`DistributedQueue`] for non-async callers.

use std::time::Duration;

use crate::builders::QueueBuilder;
use crate::config::QueueConfig;
use crate::core::{DistributedQueue, JoinOutcome, QueueItem, QueueResult, TaskQueue};

/// Synchronous queue handle driving a [`DistributedQueue`] on an owned
/// multi-threaded tokio runtime.
///
/// Every method blocks the calling thread. Calling them from inside an async
/// context panics, as with any `Runtime::block_on`.
pub struct SyncQueue<T> {
    runtime: tokio::runtime::Runtime,
    inner: DistributedQueue<T>,
}

impl<T: QueueItem> SyncQueue<T> {
    /// Create the runtime, then build and attach the queue described by
    /// `builder` on it.
    pub fn from_builder(builder: QueueBuilder) -> QueueResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("queuify-sync")
            .enable_all()
            .build()
            .map_err(|e| crate::core::QueueError::Config(format!("failed to start runtime: {e}")))?;
        let inner = runtime.block_on(builder.build())?;
        Ok(Self { runtime, inner })
    }

    /// Build from configuration alone.
    pub fn from_config(config: QueueConfig) -> QueueResult<Self> {
        Self::from_builder(QueueBuilder::new(config))
    }

    /// The underlying async queue.
    pub const fn inner(&self) -> &DistributedQueue<T> {
        &self.inner
    }

    /// See [`TaskQueue::put`].
    pub fn put(&self, item: T, timeout: Option<Duration>) -> QueueResult<()> {
        self.runtime.block_on(self.inner.put(item, timeout))
    }

    /// See [`TaskQueue::put_nowait`].
    pub fn put_nowait(&self, item: T) -> QueueResult<()> {
        self.runtime.block_on(self.inner.put_nowait(item))
    }

    /// See [`TaskQueue::get`].
    pub fn get(&self, timeout: Option<Duration>) -> QueueResult<T> {
        self.runtime.block_on(self.inner.get(timeout))
    }

    /// See [`TaskQueue::get_nowait`].
    pub fn get_nowait(&self) -> QueueResult<T> {
        self.runtime.block_on(self.inner.get_nowait())
    }

    /// See [`TaskQueue::task_done`].
    pub fn task_done(&self) -> QueueResult<u64> {
        self.runtime.block_on(self.inner.task_done())
    }

    /// See [`TaskQueue::join`].
    pub fn join(&self, timeout: Option<Duration>) -> QueueResult<JoinOutcome> {
        self.runtime.block_on(self.inner.join(timeout))
    }

    /// See [`TaskQueue::qsize`].
    pub fn qsize(&self) -> QueueResult<usize> {
        self.runtime.block_on(self.inner.qsize())
    }

    /// See [`TaskQueue::empty`].
    pub fn empty(&self) -> QueueResult<bool> {
        self.runtime.block_on(self.inner.empty())
    }

    /// See [`TaskQueue::full`].
    pub fn full(&self) -> QueueResult<bool> {
        self.runtime.block_on(self.inner.full())
    }

    /// Capacity; `<= 0` means unbounded.
    pub fn maxsize(&self) -> i64 {
        self.inner.maxsize()
    }

    /// Remove every key of the queue. See [`DistributedQueue::delete`].
    pub fn delete(self) -> QueueResult<()> {
        let Self { runtime, inner } = self;
        runtime.block_on(inner.delete())
    }
}
