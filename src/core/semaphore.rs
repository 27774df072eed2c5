//! Bounded-capacity semaphore emulated with a list of fungible tokens.
//!
//! The token count tracks free queue capacity. Acquiring pops one token,
//! blocking while the list is empty; releasing pushes one back. Only the
//! `initialize` script changes the number of tokens in circulation.

use std::sync::Arc;

use crate::core::{ListEnd, Store, StoreResult, SEMAPHORE_TOKEN};
use crate::util::clock::Deadline;

/// Token-list semaphore for one bounded queue.
#[derive(Clone)]
pub struct Semaphore {
    store: Arc<dyn Store>,
    key: String,
}

impl Semaphore {
    /// Semaphore stored at `key`.
    pub fn new(store: Arc<dyn Store>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Store key of the token list.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Take a token without waiting.
    pub async fn try_acquire(&self) -> StoreResult<Option<Permit>> {
        let token = self.store.pop(&self.key, ListEnd::Left).await?;
        Ok(token.map(|token| self.permit(token)))
    }

    /// Take a token, waiting until `deadline`. `None` when the deadline passed
    /// without a token becoming available.
    pub async fn acquire(&self, deadline: Deadline) -> StoreResult<Option<Permit>> {
        let token = match deadline.remaining() {
            Some(left) if left.is_zero() => self.store.pop(&self.key, ListEnd::Left).await?,
            left => {
                tracing::debug!(key = %self.key, timeout = ?left, "waiting for capacity token");
                self.store
                    .blocking_pop(&self.key, ListEnd::Left, left)
                    .await?
            }
        };
        Ok(token.map(|token| self.permit(token)))
    }

    /// Return one token, freeing a slot.
    pub async fn release(&self) -> StoreResult<()> {
        self.store.push(&self.key, SEMAPHORE_TOKEN).await.map(|_| ())
    }

    /// Tokens currently available.
    pub async fn available(&self) -> StoreResult<usize> {
        self.store.list_len(&self.key).await
    }

    fn permit(&self, token: String) -> Permit {
        Permit {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            token: Some(token),
        }
    }
}

/// An acquired capacity token.
///
/// A permit must end in exactly one of [`Permit::consume`],
/// [`Permit::discard`] or [`Permit::release`]. A permit dropped without any of
/// them (for instance because the owning future was cancelled) pushes its
/// token back from a task spawned on the current tokio runtime.
pub struct Permit {
    store: Arc<dyn Store>,
    key: String,
    token: Option<String>,
}

impl Permit {
    /// The slot was used by an append; the token stays out of circulation.
    pub fn consume(mut self) {
        self.token = None;
    }

    /// The token had no free slot behind it; drop it for good.
    pub fn discard(mut self) {
        if self.token.take().is_some() {
            tracing::debug!(key = %self.key, "discarding surplus capacity token");
        }
    }

    /// Push the token back now.
    pub async fn release(mut self) -> StoreResult<()> {
        match self.token.take() {
            Some(token) => self.store.push(&self.key, &token).await.map(|_| ()),
            None => Ok(()),
        }
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let store = Arc::clone(&self.store);
        let key = std::mem::take(&mut self.key);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = store.push(&key, &token).await {
                        tracing::warn!(key = %key, error = %e, "failed to return abandoned capacity token");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(key = %key, "capacity token lost: no runtime to return it on");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::infra::MemoryStore;

    async fn semaphore(tokens: usize) -> (Arc<MemoryStore>, Semaphore) {
        let store = MemoryStore::shared();
        for _ in 0..tokens {
            store.push("sem", SEMAPHORE_TOKEN).await.unwrap();
        }
        let sem = Semaphore::new(store.clone(), "sem");
        (store, sem)
    }

    #[tokio::test]
    async fn test_acquire_and_consume() {
        let (_store, sem) = semaphore(1).await;
        let permit = sem.try_acquire().await.unwrap().expect("token available");
        permit.consume();
        assert_eq!(sem.available().await.unwrap(), 0);
        assert!(sem.try_acquire().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_acquire_times_out_without_tokens() {
        let (_store, sem) = semaphore(0).await;
        let deadline = Deadline::after(Some(Duration::from_millis(20)));
        assert!(sem.acquire(deadline).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_wakes_waiter() {
        let (_store, sem) = semaphore(0).await;
        let waiter = {
            let sem = sem.clone();
            tokio::spawn(async move { sem.acquire(Deadline::never()).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        sem.release().await.unwrap();
        let permit = waiter.await.unwrap().unwrap();
        assert!(permit.is_some());
    }

    #[tokio::test]
    async fn test_dropped_permit_returns_token() {
        let (_store, sem) = semaphore(1).await;
        let permit = sem.try_acquire().await.unwrap();
        assert_eq!(sem.available().await.unwrap(), 0);
        drop(permit);
        // The token comes back from a spawned task.
        let back = sem
            .acquire(Deadline::after(Some(Duration::from_secs(1))))
            .await
            .unwrap();
        assert!(back.is_some());
    }

    #[tokio::test]
    async fn test_discarded_permit_is_gone() {
        let (_store, sem) = semaphore(2).await;
        sem.try_acquire().await.unwrap().unwrap().discard();
        sem.try_acquire().await.unwrap().unwrap().release().await.unwrap();
        tokio::task::yield_now().await;
        assert_eq!(sem.available().await.unwrap(), 1);
    }
}
