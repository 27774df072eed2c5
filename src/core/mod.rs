//! Core queue protocol: key space, atomic scripts, semaphore, join barrier
//! and the queue facade.

pub mod error;
pub mod join;
pub mod keyspace;
pub mod queue;
pub mod script;
pub mod semaphore;
pub mod store;

pub use error::{AppResult, QueueError, QueueResult, StoreError, StoreResult};
pub use join::{JoinBarrier, JoinOutcome};
pub use keyspace::{KeySpace, DEFAULT_NAMESPACE};
pub use queue::{DistributedQueue, QueueItem, TaskQueue};
pub use script::{
    ReplyKind, Script, ScriptCall, ScriptReply, DELETED_MESSAGE, DRAINED_MESSAGE, EMPTY_REPLY,
    EXCESS_COMPLETION_REPLY, SEMAPHORE_TOKEN,
};
pub use semaphore::{Permit, Semaphore};
pub use store::{ListEnd, Store, Subscription};
