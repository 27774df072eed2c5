//! Configuration models for queues and store backends.

pub mod queue;

pub use queue::{
    QueueConfig, StoreBackendConfig, ENV_MAXSIZE, ENV_NAMESPACE, ENV_QUEUE_NAME, ENV_REDIS_URL,
};
