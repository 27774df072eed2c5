//! Tests for builder modules

use queuify::builders::QueueBuilder;
use queuify::config::{QueueConfig, StoreBackendConfig};
use queuify::core::{QueueError, TaskQueue};
use queuify::infra::MemoryStore;

#[test]
fn test_queue_builder_accessors() {
    let builder = QueueBuilder::new(QueueConfig::in_memory("jobs", 5));
    assert_eq!(builder.name(), "jobs");
    assert_eq!(builder.config().maxsize, 5);
}

#[tokio::test]
async fn test_queue_builder_builds_in_memory_queue() {
    let queue = QueueBuilder::new(QueueConfig::in_memory("jobs", 2))
        .build::<String>()
        .await
        .unwrap();
    assert_eq!(queue.maxsize(), 2);
    assert_eq!(queue.keys().queue(), "queuify:queue:jobs");
    assert!(queue.empty().await.unwrap());
}

#[tokio::test]
async fn test_queue_builder_shares_store() {
    let store = MemoryStore::shared();
    let config = QueueConfig::in_memory("shared", 0);

    let producer = QueueBuilder::new(config.clone())
        .with_store(store.clone())
        .build::<u32>()
        .await
        .unwrap();
    let consumer = QueueBuilder::new(config)
        .with_store(store)
        .build::<u32>()
        .await
        .unwrap();

    producer.put(7, None).await.unwrap();
    assert_eq!(consumer.get_nowait().await.unwrap(), 7);
}

#[tokio::test]
async fn test_queue_builder_rejects_invalid_config() {
    let config = QueueConfig {
        name: String::new(),
        maxsize: 1,
        namespace: String::new(),
        store: StoreBackendConfig::InMemory,
    };
    let err = QueueBuilder::new(config).build::<String>().await.unwrap_err();
    assert!(matches!(err, QueueError::Config(_)));
}
