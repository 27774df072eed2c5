//! Redis-backed store.
//!
//! Scripts are loaded once as `redis::Script` and invoked with EVALSHA
//! (falling back to EVAL when the server has not cached them). Short
//! commands share one multiplexed connection. Blocking pops borrow a
//! connection from a small idle pool so they never stall the shared
//! pipeline; subscriptions open their own pub/sub connection.

use std::collections::HashMap;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::{Client, ErrorKind, Msg, RedisError};

use crate::core::{
    ListEnd, ReplyKind, Script, ScriptCall, ScriptReply, Store, StoreError, StoreResult,
    Subscription,
};

/// Smallest blocking timeout sent to the server; zero would mean "forever".
const MIN_BLOCK_SECS: f64 = 0.001;

/// Longer timeouts are sent as zero (block forever).
const MAX_BLOCK_SECS: f64 = 100.0 * 365.0 * 24.0 * 3600.0;

/// Idle connections kept for blocking pops.
const MAX_IDLE_BLOCKING: usize = 8;

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        match err.kind() {
            ErrorKind::ResponseError | ErrorKind::ExtensionError => {
                Self::ScriptReply(err.to_string())
            }
            ErrorKind::IoError => Self::Connection(err.to_string()),
            ErrorKind::TypeError => Self::UnexpectedReply(err.to_string()),
            _ => Self::Command(err.to_string()),
        }
    }
}

/// Configuration for the Redis store.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL.
    pub url: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

impl RedisStoreConfig {
    /// Create config with custom Redis URL.
    pub fn with_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
        }
    }
}

/// Store backed by a Redis (or Redis-compatible) server.
pub struct RedisStore {
    client: Client,
    connection: MultiplexedConnection,
    scripts: HashMap<Script, redis::Script>,
    blocking: Mutex<Vec<MultiplexedConnection>>,
    url: String,
}

impl RedisStore {
    /// Connect to the server described by `config`.
    pub async fn connect(config: RedisStoreConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            StoreError::Connection(format!("invalid Redis URL `{}`: {e}", config.url))
        })?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::Connection(format!("{}: {e}", config.url)))?;
        let scripts = Script::ALL
            .into_iter()
            .map(|script| (script, redis::Script::new(script.source())))
            .collect();
        tracing::info!(url = %config.url, "connected to redis");
        Ok(Self {
            client,
            connection,
            scripts,
            blocking: Mutex::new(Vec::new()),
            url: config.url,
        })
    }

    /// Connection for a command that may block server-side: an idle one
    /// from the pool, or a new one when all are busy.
    async fn blocking_conn(&self) -> StoreResult<MultiplexedConnection> {
        let idle = self.blocking.lock().pop();
        match idle {
            Some(conn) => Ok(conn),
            None => self
                .client
                .get_multiplexed_async_connection()
                .await
                .map_err(|e| StoreError::Connection(format!("{}: {e}", self.url))),
        }
    }

    /// Return a blocking connection after a completed command.
    fn recycle(&self, conn: MultiplexedConnection) {
        let mut idle = self.blocking.lock();
        if idle.len() < MAX_IDLE_BLOCKING {
            idle.push(conn);
        }
    }

    fn script(&self, script: Script) -> StoreResult<&redis::Script> {
        self.scripts
            .get(&script)
            .ok_or_else(|| StoreError::Command(format!("script `{}` not loaded", script.name())))
    }
}

const fn pop_command(end: ListEnd, blocking: bool) -> &'static str {
    match (end, blocking) {
        (ListEnd::Left, false) => "LPOP",
        (ListEnd::Right, false) => "RPOP",
        (ListEnd::Left, true) => "BLPOP",
        (ListEnd::Right, true) => "BRPOP",
    }
}

fn block_secs(timeout: Option<Duration>) -> f64 {
    match timeout {
        Some(t) if t.as_secs_f64() <= MAX_BLOCK_SECS => t.as_secs_f64().max(MIN_BLOCK_SECS),
        _ => 0.0,
    }
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[async_trait]
impl Store for RedisStore {
    async fn run_script(&self, call: &ScriptCall) -> StoreResult<ScriptReply> {
        let mut invocation = self.script(call.script)?.prepare_invoke();
        for key in &call.keys {
            invocation.key(key);
        }
        for arg in &call.args {
            invocation.arg(arg);
        }
        let mut conn = self.connection.clone();
        match call.script.reply_kind() {
            ReplyKind::Integer => {
                let value: i64 = invocation.invoke_async(&mut conn).await?;
                Ok(ScriptReply::Integer(value))
            }
            ReplyKind::Item => {
                let item: String = invocation.invoke_async(&mut conn).await?;
                Ok(ScriptReply::Item(item))
            }
        }
    }

    async fn pop(&self, key: &str, end: ListEnd) -> StoreResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = redis::cmd(pop_command(end, false))
            .arg(key)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn blocking_pop(
        &self,
        key: &str,
        end: ListEnd,
        timeout: Option<Duration>,
    ) -> StoreResult<Option<String>> {
        let mut conn = self.blocking_conn().await?;
        // A connection whose command failed or was cancelled mid-flight is
        // not returned to the pool.
        let popped: Option<(String, String)> = redis::cmd(pop_command(end, true))
            .arg(key)
            .arg(block_secs(timeout))
            .query_async(&mut conn)
            .await?;
        self.recycle(conn);
        Ok(popped.map(|(_, value)| value))
    }

    async fn push(&self, key: &str, value: &str) -> StoreResult<usize> {
        let mut conn = self.connection.clone();
        let len: i64 = redis::cmd("LPUSH")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(to_usize(len))
    }

    async fn list_len(&self, key: &str) -> StoreResult<usize> {
        let mut conn = self.connection.clone();
        let len: i64 = redis::cmd("LLEN").arg(key).query_async(&mut conn).await?;
        Ok(to_usize(len))
    }

    async fn counter(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.connection.clone();
        let value: Option<i64> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value.unwrap_or(0))
    }

    async fn publish(&self, channel: &str, message: &str) -> StoreResult<usize> {
        let mut conn = self.connection.clone();
        let receivers: i64 = redis::cmd("PUBLISH")
            .arg(channel)
            .arg(message)
            .query_async(&mut conn)
            .await?;
        Ok(to_usize(receivers))
    }

    async fn subscribe(&self, channel: &str) -> StoreResult<Box<dyn Subscription>> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| StoreError::Connection(format!("{}: {e}", self.url)))?;
        pubsub.subscribe(channel).await?;
        Ok(Box::new(RedisSubscription {
            messages: Box::pin(pubsub.into_on_message()),
        }))
    }

    async fn delete(&self, keys: &[&str]) -> StoreResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection.clone();
        let mut cmd = redis::cmd("DEL");
        for key in keys {
            cmd.arg(*key);
        }
        let removed: i64 = cmd.query_async(&mut conn).await?;
        Ok(to_usize(removed))
    }
}

struct RedisSubscription {
    messages: Pin<Box<dyn Stream<Item = Msg> + Send>>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next_message(&mut self) -> StoreResult<Option<String>> {
        match self.messages.next().await {
            Some(msg) => Ok(Some(msg.get_payload::<String>()?)),
            None => Ok(None),
        }
    }
}
