//! Storage traits and error types
//!
//! This module defines the trait interface for credential store backends and
//! associated error types.

use crate::storage::KeyPartition;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Key {key} stored in both pools")]
    DuplicateKey { key: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable home of the credential partition
///
/// `save` must replace the whole partition atomically: after it returns, a reader sees
/// either the previous partition or the new one, never a mix.
pub trait CredentialStore: Send {
    /// Reads the persisted partition; an empty store yields an empty partition
    fn load(&self) -> StorageResult<KeyPartition>;

    /// Replaces the persisted partition
    fn save(&mut self, partition: &KeyPartition) -> StorageResult<()>;
}

/// Non-durable store for tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    partition: KeyPartition,
    saves: usize,
}

impl MemoryCredentialStore {
    pub fn new(partition: KeyPartition) -> Self {
        Self {
            partition,
            saves: 0,
        }
    }

    /// Number of completed `save` calls
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> StorageResult<KeyPartition> {
        Ok(self.partition.clone())
    }

    fn save(&mut self, partition: &KeyPartition) -> StorageResult<()> {
        self.partition = partition.clone();
        self.saves += 1;
        Ok(())
    }
}
