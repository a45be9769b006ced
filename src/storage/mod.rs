//! Storage module for the credential pool
//!
//! This module persists the Credential Rotator's state, including:
//! - SQLite database initialization and schema management
//! - Transactional replacement of the active/cooling-down partition
//! - An in-memory store for tests and dry runs

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteCredentialStore;
pub use traits::{CredentialStore, MemoryCredentialStore, StorageError, StorageResult};

use std::path::Path;

/// Opens (or creates) the credential database at `path`
pub fn open_credential_store(path: &Path) -> StorageResult<SqliteCredentialStore> {
    SqliteCredentialStore::new(path)
}

/// The two disjoint key sets held by the Credential Rotator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPartition {
    /// Keys available for round-robin use, in rotation order
    pub active: Vec<String>,
    /// Keys retired after a failed or exhausted call, in retirement order
    pub cooling: Vec<String>,
}

impl KeyPartition {
    pub fn new(active: Vec<String>) -> Self {
        Self {
            active,
            cooling: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.cooling.is_empty()
    }

    pub fn total(&self) -> usize {
        self.active.len() + self.cooling.len()
    }
}

/// Which set a stored key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPool {
    Active,
    CoolingDown,
}

impl KeyPool {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::CoolingDown => "cooling_down",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "cooling_down" => Some(Self::CoolingDown),
            _ => None,
        }
    }
}
