//! In-process store with the same primitives as the Redis backend.
//!
//! Lists, counters and channels sit behind a single `parking_lot::Mutex`, so
//! every script runs to completion before another call can observe the
//! keyspace. Blocking pops park on a `tokio::sync::Notify` that is signalled
//! on every push; channels are `tokio::sync::broadcast` senders created on
//! first subscription.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

use crate::core::{
    ListEnd, Script, ScriptCall, ScriptReply, Store, StoreError, StoreResult, Subscription,
};

/// Messages buffered per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 64;

#[derive(Default)]
struct Keyspace {
    lists: HashMap<String, VecDeque<String>>,
    counters: HashMap<String, i64>,
    channels: HashMap<String, broadcast::Sender<String>>,
}

impl Keyspace {
    fn list_len(&self, key: &str) -> usize {
        self.lists.get(key).map_or(0, VecDeque::len)
    }

    fn push(&mut self, key: &str, value: &str) -> usize {
        let list = self.lists.entry(key.to_owned()).or_default();
        list.push_front(value.to_owned());
        list.len()
    }

    fn pop(&mut self, key: &str, end: ListEnd) -> Option<String> {
        let list = self.lists.get_mut(key)?;
        let value = match end {
            ListEnd::Left => list.pop_front(),
            ListEnd::Right => list.pop_back(),
        };
        if list.is_empty() {
            self.lists.remove(key);
        }
        value
    }

    fn counter(&self, key: &str) -> i64 {
        self.counters.get(key).copied().unwrap_or(0)
    }

    fn add(&mut self, key: &str, delta: i64) -> i64 {
        let value = self.counters.entry(key.to_owned()).or_insert(0);
        *value += delta;
        *value
    }

    fn publish(&mut self, channel: &str, message: &str) -> usize {
        let Some(tx) = self.channels.get(channel) else {
            return 0;
        };
        if tx.receiver_count() == 0 {
            self.channels.remove(channel);
            return 0;
        }
        tx.send(message.to_owned()).unwrap_or(0)
    }

    /// Execute one script. Runs entirely under the keyspace lock.
    fn run(&mut self, call: &ScriptCall) -> StoreResult<ScriptReply> {
        match call.script {
            Script::Initialize => {
                let (queue, semaphore) = (required_key(call, 0)?, required_key(call, 1)?);
                let maxsize = int_arg(call, 0)?;
                if maxsize <= 0 {
                    return Ok(ScriptReply::Integer(0));
                }
                let token = required_arg(call, 1)?;
                let free = (maxsize - len_i64(self.list_len(queue))).max(0);
                let missing = free - len_i64(self.list_len(semaphore));
                for _ in 0..missing {
                    self.push(semaphore, token);
                }
                for _ in missing..0 {
                    self.pop(semaphore, ListEnd::Right);
                }
                Ok(ScriptReply::Integer(missing))
            }
            Script::Put => {
                let (queue, unfinished) = (required_key(call, 0)?, required_key(call, 1)?);
                self.push(queue, required_arg(call, 0)?);
                Ok(ScriptReply::Integer(self.add(unfinished, 1)))
            }
            Script::PutNowait => {
                let (queue, unfinished) = (required_key(call, 0)?, required_key(call, 1)?);
                let item = required_arg(call, 0)?;
                let maxsize = int_arg(call, 1)?;
                if maxsize > 0 && len_i64(self.list_len(queue)) >= maxsize {
                    return Ok(ScriptReply::Integer(0));
                }
                self.push(queue, item);
                self.add(unfinished, 1);
                Ok(ScriptReply::Integer(1))
            }
            Script::GetNowait => {
                let (queue, semaphore) = (required_key(call, 0)?, required_key(call, 1)?);
                let maxsize = int_arg(call, 0)?;
                let token = required_arg(call, 1)?;
                let Some(item) = self.pop(queue, ListEnd::Right) else {
                    return Err(StoreError::ScriptReply(required_arg(call, 2)?.to_owned()));
                };
                if maxsize > 0 {
                    self.push(semaphore, token);
                }
                Ok(ScriptReply::Item(item))
            }
            Script::TaskDone => {
                let (unfinished, channel) = (required_key(call, 0)?, required_key(call, 1)?);
                let drained = required_arg(call, 0)?;
                if self.counter(unfinished) <= 0 {
                    return Err(StoreError::ScriptReply(required_arg(call, 1)?.to_owned()));
                }
                let remaining = self.add(unfinished, -1);
                if remaining == 0 {
                    self.publish(channel, drained);
                }
                Ok(ScriptReply::Integer(remaining))
            }
        }
    }
}

fn required_key(call: &ScriptCall, index: usize) -> StoreResult<&str> {
    call.key(index).ok_or_else(|| {
        StoreError::Command(format!("{}: missing KEYS[{}]", call.script.name(), index + 1))
    })
}

fn required_arg(call: &ScriptCall, index: usize) -> StoreResult<&str> {
    call.arg(index).ok_or_else(|| {
        StoreError::Command(format!("{}: missing ARGV[{}]", call.script.name(), index + 1))
    })
}

fn int_arg(call: &ScriptCall, index: usize) -> StoreResult<i64> {
    let raw = required_arg(call, index)?;
    raw.parse().map_err(|_| {
        StoreError::Command(format!(
            "{}: ARGV[{}] is not an integer: {raw}",
            call.script.name(),
            index + 1
        ))
    })
}

fn len_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// In-memory store shared by cloning the `Arc` it is handed out in.
///
/// Suitable for tests and for several queue handles inside one process; it
/// does not persist anything.
#[derive(Default)]
pub struct MemoryStore {
    keyspace: Mutex<Keyspace>,
    pushed: Notify,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store ready to be shared.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Snapshot of a list, head first.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.keyspace
            .lock()
            .lists
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Overwrite a counter. Intended for simulating foreign writers.
    pub fn set_counter(&self, key: &str, value: i64) {
        self.keyspace.lock().counters.insert(key.to_owned(), value);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn run_script(&self, call: &ScriptCall) -> StoreResult<ScriptReply> {
        let reply = self.keyspace.lock().run(call);
        if reply.is_ok() {
            self.pushed.notify_waiters();
        }
        reply
    }

    async fn pop(&self, key: &str, end: ListEnd) -> StoreResult<Option<String>> {
        Ok(self.keyspace.lock().pop(key, end))
    }

    async fn blocking_pop(
        &self,
        key: &str,
        end: ListEnd,
        timeout: Option<Duration>,
    ) -> StoreResult<Option<String>> {
        let deadline = timeout.and_then(|t| tokio::time::Instant::now().checked_add(t));
        loop {
            // Register interest before looking so a push in between is not missed.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let popped = self.keyspace.lock().pop(key, end);
            if popped.is_some() {
                return Ok(popped);
            }
            match deadline {
                Some(at) => {
                    if tokio::time::timeout_at(at, notified).await.is_err() {
                        return Ok(None);
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn push(&self, key: &str, value: &str) -> StoreResult<usize> {
        let len = self.keyspace.lock().push(key, value);
        self.pushed.notify_waiters();
        Ok(len)
    }

    async fn list_len(&self, key: &str) -> StoreResult<usize> {
        Ok(self.keyspace.lock().list_len(key))
    }

    async fn counter(&self, key: &str) -> StoreResult<i64> {
        Ok(self.keyspace.lock().counter(key))
    }

    async fn publish(&self, channel: &str, message: &str) -> StoreResult<usize> {
        Ok(self.keyspace.lock().publish(channel, message))
    }

    async fn subscribe(&self, channel: &str) -> StoreResult<Box<dyn Subscription>> {
        let rx = self
            .keyspace
            .lock()
            .channels
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        Ok(Box::new(MemorySubscription { rx }))
    }

    async fn delete(&self, keys: &[&str]) -> StoreResult<usize> {
        let mut keyspace = self.keyspace.lock();
        let removed = keys
            .iter()
            .filter(|key| {
                let list = keyspace.lists.remove(**key).is_some();
                let counter = keyspace.counters.remove(**key).is_some();
                list || counter
            })
            .count();
        Ok(removed)
    }
}

struct MemorySubscription {
    rx: broadcast::Receiver<String>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn next_message(&mut self) -> StoreResult<Option<String>> {
        loop {
            match self.rx.recv().await {
                Ok(message) => return Ok(Some(message)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "subscription lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }
}
