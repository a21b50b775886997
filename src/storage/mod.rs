//! Persistence module
//!
//! The store saves its collections through a `PersistenceGateway`. The
//! gateway shipped here serialises them as JSON on top of a plain key-value
//! primitive, which can be backed by files or kept in memory.

pub mod file;
pub mod gateway;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::{HistoryEntry, Timer};

pub use file::FileKeyValueStore;
pub use gateway::JsonGateway;
pub use memory::MemoryKeyValueStore;

/// Failure to read or write persisted data
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous get/set of opaque string blobs
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when nothing was ever stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}

/// What the timer store needs from durable storage.
///
/// Loads never fail: missing or unreadable data comes back as an empty list.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn load_timers(&self) -> Vec<Timer>;
    async fn save_timers(&self, timers: &[Timer]) -> Result<(), StorageError>;
    async fn load_history(&self) -> Vec<HistoryEntry>;
    async fn save_history(&self, history: &[HistoryEntry]) -> Result<(), StorageError>;
}
