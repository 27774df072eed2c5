//! Queue protocol against a live Redis server.
//!
//! Ignored by default. Run with a server available:
//!
//! ```text
//! QUEUIFY_REDIS_URL=redis://127.0.0.1:6379 cargo test --test redis_store_test -- --ignored
//! ```

#![cfg(feature = "redis")]

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use uuid::Uuid;

use queuify::core::{DistributedQueue, JoinOutcome, QueueError, Store, TaskQueue};
use queuify::infra::{RedisStore, RedisStoreConfig};
use queuify::util::init_tracing;

async fn store() -> Arc<RedisStore> {
    init_tracing();
    let url = std::env::var("QUEUIFY_REDIS_URL")
        .unwrap_or_else(|_| RedisStoreConfig::default().url);
    Arc::new(RedisStore::connect(RedisStoreConfig::with_url(&url)).await.unwrap())
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_bounded_walkthrough() {
    let store = store().await;
    let queue = DistributedQueue::<String>::attach(store.clone(), &unique_name("walk"), 2)
        .await
        .unwrap();
    assert_eq!(store.list_len(queue.keys().semaphore()).await.unwrap(), 2);

    queue.put("a".into(), None).await.unwrap();
    queue.put("b".into(), None).await.unwrap();
    assert!(queue.full().await.unwrap());
    assert!(matches!(
        queue.put_nowait("c".into()).await,
        Err(QueueError::Full(_))
    ));

    assert_eq!(queue.get(None).await.unwrap(), "a");
    assert_eq!(queue.get_nowait().await.unwrap(), "b");
    assert!(matches!(queue.get_nowait().await, Err(QueueError::Empty(_))));

    queue.task_done().await.unwrap();
    queue.task_done().await.unwrap();
    assert!(matches!(
        queue.task_done().await,
        Err(QueueError::ExcessCompletion(_))
    ));
    assert_eq!(
        queue.join(Some(Duration::from_secs(1))).await.unwrap(),
        JoinOutcome::Drained
    );
    queue.delete().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_random_payloads_keep_fifo_order() {
    let store = store().await;
    let queue = DistributedQueue::<Vec<u8>>::attach(store, &unique_name("fifo"), 0)
        .await
        .unwrap();

    let mut rng = rand::rng();
    let payloads: Vec<Vec<u8>> = (0..25)
        .map(|_| {
            let len = rng.random_range(0..64);
            (0..len).map(|_| rng.random()).collect()
        })
        .collect();

    for payload in &payloads {
        queue.put(payload.clone(), None).await.unwrap();
    }
    for expected in &payloads {
        assert_eq!(&queue.get(Some(Duration::from_secs(1))).await.unwrap(), expected);
    }
    queue.delete().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_join_released_across_connections() {
    let name = unique_name("join");
    let producer = DistributedQueue::<u32>::attach(store().await, &name, 0)
        .await
        .unwrap();
    let consumer = DistributedQueue::<u32>::attach(store().await, &name, 0)
        .await
        .unwrap();
    producer.put(1, None).await.unwrap();

    let joiner = tokio::spawn(async move { producer.join(Some(Duration::from_secs(5))).await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(consumer.get(Some(Duration::from_secs(1))).await.unwrap(), 1);
    consumer.task_done().await.unwrap();
    assert_eq!(joiner.await.unwrap().unwrap(), JoinOutcome::Drained);
    consumer.delete().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_blocking_put_and_get_timeouts() {
    let store = store().await;
    let queue = DistributedQueue::<u32>::attach(store, &unique_name("timeouts"), 1)
        .await
        .unwrap();

    assert!(matches!(
        queue.get(Some(Duration::from_millis(100))).await,
        Err(QueueError::Timeout)
    ));
    queue.put(1, None).await.unwrap();
    assert!(matches!(
        queue.put(2, Some(Duration::from_millis(100))).await,
        Err(QueueError::Timeout)
    ));
    queue.delete().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_redis_repeated_blocking_gets_and_unbounded_timeouts() {
    let store = store().await;
    let queue = DistributedQueue::<u32>::attach(store, &unique_name("reuse"), 2)
        .await
        .unwrap();

    for i in 0..20 {
        queue.put(i, Some(Duration::MAX)).await.unwrap();
        assert_eq!(queue.get(Some(Duration::MAX)).await.unwrap(), i);
        queue.task_done().await.unwrap();
    }
    assert_eq!(
        queue.join(Some(Duration::MAX)).await.unwrap(),
        JoinOutcome::Drained
    );
    queue.delete().await.unwrap();
}
