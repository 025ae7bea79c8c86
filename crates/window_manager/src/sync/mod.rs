//! Cross-thread synchronization primitives

pub mod shared_mutex;

pub use shared_mutex::{SharedMutex, SharedMutexPool};
