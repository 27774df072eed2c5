//! Runtime adapters for callers outside an async context.

pub mod sync_queue;

pub use sync_queue::SyncQueue;
