//! Atomic script set.
//!
//! Every mutation that spans more than one key runs as one of these scripts,
//! executed server-side without interleaving with any other script touching
//! the same keys. A [`ScriptCall`] carries the `KEYS`/`ARGV` vectors in the
//! positional layout documented on each constructor; backends either ship the
//! Lua source to the server or reproduce the same contract under their own
//! atomicity guarantee.

use crate::core::KeySpace;

/// Fungible placeholder whose count represents free capacity.
pub const SEMAPHORE_TOKEN: &str = "1";

/// Error reply raised by `get_nowait` on an empty queue.
pub const EMPTY_REPLY: &str = "QUEUE_EMPTY";

/// Error reply raised by `task_done` when the counter is already zero.
///
/// Error replies are single words: clients split a reply into a code and a
/// detail at the first space.
pub const EXCESS_COMPLETION_REPLY: &str = "TASK_DONE_EXCESS";

/// Published on the join channel when the unfinished counter reaches zero.
pub const DRAINED_MESSAGE: &str = "no_remaining_tasks";

/// Published on the join channel when the queue is deleted.
pub const DELETED_MESSAGE: &str = "queue_deleted";

/// Names of the atomic scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    /// Reconcile semaphore tokens with `maxsize` and the current length.
    Initialize,
    /// Unconditional append plus counter increment.
    Put,
    /// Capacity-checked append plus counter increment.
    PutNowait,
    /// Pop the oldest item and replenish one token.
    GetNowait,
    /// Decrement the counter, publishing on the transition to zero.
    TaskDone,
}

impl Script {
    /// All scripts, in load order.
    pub const ALL: [Self; 5] = [
        Self::Initialize,
        Self::Put,
        Self::PutNowait,
        Self::GetNowait,
        Self::TaskDone,
    ];

    /// Stable script name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Put => "put",
            Self::PutNowait => "put_nowait",
            Self::GetNowait => "get_nowait",
            Self::TaskDone => "task_done",
        }
    }

    /// Lua source executed by Redis-compatible servers.
    pub const fn source(self) -> &'static str {
        match self {
            Self::Initialize => include_str!("scripts/initialize.lua"),
            Self::Put => include_str!("scripts/put.lua"),
            Self::PutNowait => include_str!("scripts/put_nowait.lua"),
            Self::GetNowait => include_str!("scripts/get_nowait.lua"),
            Self::TaskDone => include_str!("scripts/task_done.lua"),
        }
    }

    /// Shape of the successful reply.
    pub const fn reply_kind(self) -> ReplyKind {
        match self {
            Self::GetNowait => ReplyKind::Item,
            _ => ReplyKind::Integer,
        }
    }
}

/// Shape of a script's successful reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Integer reply.
    Integer,
    /// Bulk string reply.
    Item,
}

/// Successful script reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptReply {
    /// Integer reply.
    Integer(i64),
    /// Bulk string reply.
    Item(String),
}

/// One invocation of an atomic script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCall {
    /// Script to run.
    pub script: Script,
    /// `KEYS` vector.
    pub keys: Vec<String>,
    /// `ARGV` vector.
    pub args: Vec<String>,
}

impl ScriptCall {
    /// `KEYS = [queue, semaphore]`, `ARGV = [maxsize, token]`.
    pub fn initialize(keys: &KeySpace, maxsize: i64) -> Self {
        Self {
            script: Script::Initialize,
            keys: vec![keys.queue().to_owned(), keys.semaphore().to_owned()],
            args: vec![maxsize.to_string(), SEMAPHORE_TOKEN.to_owned()],
        }
    }

    /// `KEYS = [queue, unfinished]`, `ARGV = [item]`.
    pub fn put(keys: &KeySpace, item: &str) -> Self {
        Self {
            script: Script::Put,
            keys: vec![keys.queue().to_owned(), keys.unfinished().to_owned()],
            args: vec![item.to_owned()],
        }
    }

    /// `KEYS = [queue, unfinished]`, `ARGV = [item, maxsize]`.
    pub fn put_nowait(keys: &KeySpace, item: &str, maxsize: i64) -> Self {
        Self {
            script: Script::PutNowait,
            keys: vec![keys.queue().to_owned(), keys.unfinished().to_owned()],
            args: vec![item.to_owned(), maxsize.to_string()],
        }
    }

    /// `KEYS = [queue, semaphore]`, `ARGV = [maxsize, token, empty_reply]`.
    pub fn get_nowait(keys: &KeySpace, maxsize: i64) -> Self {
        Self {
            script: Script::GetNowait,
            keys: vec![keys.queue().to_owned(), keys.semaphore().to_owned()],
            args: vec![
                maxsize.to_string(),
                SEMAPHORE_TOKEN.to_owned(),
                EMPTY_REPLY.to_owned(),
            ],
        }
    }

    /// `KEYS = [unfinished, join_channel]`, `ARGV = [drained_msg, excess_reply]`.
    pub fn task_done(keys: &KeySpace) -> Self {
        Self {
            script: Script::TaskDone,
            keys: vec![keys.unfinished().to_owned(), keys.join_channel().to_owned()],
            args: vec![
                DRAINED_MESSAGE.to_owned(),
                EXCESS_COMPLETION_REPLY.to_owned(),
            ],
        }
    }

    /// `KEYS[index + 1]`, if supplied.
    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    /// `ARGV[index + 1]`, if supplied.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

impl ScriptReply {
    /// Integer payload, if this is an integer reply.
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Item(_) => None,
        }
    }

    /// Consume into the item payload, if this is a bulk reply.
    pub fn into_item(self) -> Option<String> {
        match self {
            Self::Item(item) => Some(item),
            Self::Integer(_) => None,
        }
    }
}
