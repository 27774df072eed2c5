//! # Queuify
//!
//! FIFO task queues with blocking `put`/`get`, bounded capacity and
//! `task_done`/`join` completion tracking, shared by any number of processes
//! through a Redis-like store.
//!
//! The queue keeps the observable semantics of an in-process blocking queue
//! while holding no client-side locks. All mutual exclusion comes from the
//! store executing small atomic scripts:
//!
//! - **Bounded capacity** is enforced inside the append script and mirrored by
//!   a list of fungible semaphore tokens, so producers can block on a full
//!   queue with the store's native blocking pop.
//! - **Consumers** block on the item list itself; every item goes to exactly
//!   one popper.
//! - **Join** waits on a publish/subscribe channel that `task_done` signals
//!   exactly once when the unfinished-task counter reaches zero; joiners
//!   re-check the counter after subscribing so the transition is never missed.
//!
//! ## Store Layout
//!
//! A queue named `Q` owns `Q` (items), `Q:sem` (capacity tokens, bounded
//! queues only), `Q:unfinished` (counter) and `Q:join` (channel), all under a
//! configurable namespace.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use queuify::core::{DistributedQueue, TaskQueue};
//! use queuify::infra::MemoryStore;
//!
//! let store = MemoryStore::shared();
//! let queue = DistributedQueue::<String>::attach(store, "jobs", 2).await?;
//!
//! queue.put("a".to_string(), None).await?;
//! queue.put_nowait("b".to_string()).await?;
//! assert!(queue.put_nowait("c".to_string()).await.is_err()); // full
//!
//! let job = queue.get(Some(Duration::from_secs(1))).await?;
//! queue.task_done().await?;
//! ```
//!
//! Against Redis, build the store with `infra::RedisStore::connect` or let
//! `builders::QueueBuilder` pick the backend from a `config::QueueConfig`.
//! Non-async callers use `runtime::SyncQueue`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Queue protocol: key space, atomic scripts, semaphore, join barrier, facade.
pub mod core;
/// Configuration models for queues and store backends.
pub mod config;
/// Builders to construct queues from configuration.
pub mod builders;
/// Store backends (in-memory, Redis).
pub mod infra;
/// Runtime adapters for blocking callers.
pub mod runtime;
/// Shared utilities.
pub mod util;

pub use crate::core::{DistributedQueue, JoinOutcome, QueueError, QueueResult, TaskQueue};
