//! Local key-value storage module
//!
//! This module contains the string key-value store the stopwatches persist
//! into, its in-memory and file-backed implementations, and the snapshot
//! save/load/clear contract built on top of it.

pub mod file;
pub mod memory;
pub mod snapshot;

use thiserror::Error;

// Re-export main types
pub use file::FileStore;
pub use memory::MemoryStore;
pub use snapshot::{clear, load, save, save_snapshot, SnapshotPersister, TICK_SAVE_INTERVAL_MS};

/// Errors raised by a key-value store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Synchronous string key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
