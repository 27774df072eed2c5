//! Infrastructure adapters for the shared store.

pub mod store;

pub use store::MemoryStore;
#[cfg(feature = "redis")]
pub use store::{RedisStore, RedisStoreConfig};
