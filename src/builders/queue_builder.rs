//! Builder turning a [`QueueConfig`] into an attached queue.

use std::sync::Arc;

use crate::config::{QueueConfig, StoreBackendConfig};
use crate::core::{DistributedQueue, KeySpace, QueueError, QueueItem, QueueResult, Store};
use crate::infra::MemoryStore;

/// Open the store selected by `backend`.
pub async fn connect_store(backend: &StoreBackendConfig) -> QueueResult<Arc<dyn Store>> {
    match backend {
        StoreBackendConfig::InMemory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "redis")]
        StoreBackendConfig::Redis { url } => {
            let store =
                crate::infra::RedisStore::connect(crate::infra::RedisStoreConfig::with_url(url))
                    .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        StoreBackendConfig::Redis { .. } => Err(QueueError::Config(
            "redis backend requested but the `redis` feature is disabled".into(),
        )),
    }
}

/// Builds a [`DistributedQueue`] from configuration.
pub struct QueueBuilder {
    config: QueueConfig,
    store: Option<Arc<dyn Store>>,
}

impl QueueBuilder {
    /// Start from `config`.
    pub const fn new(config: QueueConfig) -> Self {
        Self {
            config,
            store: None,
        }
    }

    /// Attach to an existing store instead of opening the configured backend.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration being built.
    pub const fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Validate, connect and attach.
    pub async fn build<T: QueueItem>(self) -> QueueResult<DistributedQueue<T>> {
        self.config.validate().map_err(QueueError::Config)?;
        let store = match self.store {
            Some(store) => store,
            None => connect_store(&self.config.store).await?,
        };
        let keys = KeySpace::with_namespace(&self.config.namespace, self.config.name.as_str());
        DistributedQueue::attach_with_keys(store, keys, self.config.maxsize).await
    }
}
