//! SQLite credential store
//!
//! This module provides a SQLite-based implementation of the CredentialStore trait.
//! Every save replaces the whole partition inside one transaction.

use crate::storage::schema::{get_schema_version, initialize_schema};
use crate::storage::traits::{CredentialStore, StorageError, StorageResult};
use crate::storage::{KeyPartition, KeyPool};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend for the credential pool
pub struct SqliteCredentialStore {
    conn: Connection,
}

impl SqliteCredentialStore {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteCredentialStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
        ",
        )?;

        Self::with_connection(conn)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        initialize_schema(&conn)?;
        conn.pragma_update(None, "user_version", get_schema_version())?;
        Ok(Self { conn })
    }
}

impl CredentialStore for SqliteCredentialStore {
    fn load(&self) -> StorageResult<KeyPartition> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, pool FROM credentials ORDER BY position ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut partition = KeyPartition::default();
        for row in rows {
            let (key, pool) = row?;
            match KeyPool::from_db_string(&pool) {
                Some(KeyPool::CoolingDown) => partition.cooling.push(key),
                Some(KeyPool::Active) => partition.active.push(key),
                None => {
                    tracing::warn!("Unknown credential pool '{}', treating key as active", pool);
                    partition.active.push(key);
                }
            }
        }

        Ok(partition)
    }

    fn save(&mut self, partition: &KeyPartition) -> StorageResult<()> {
        let mut seen = HashSet::new();
        for key in partition.active.iter().chain(partition.cooling.iter()) {
            if !seen.insert(key.as_str()) {
                return Err(StorageError::DuplicateKey { key: key.clone() });
            }
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM credentials", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO credentials (key, pool, position, updated_at) VALUES (?1, ?2, ?3, ?4)",
            )?;

            let pools = [
                (KeyPool::Active, &partition.active),
                (KeyPool::CoolingDown, &partition.cooling),
            ];
            let mut position: i64 = 0;
            for (pool, keys) in pools {
                for key in keys {
                    insert.execute(params![key, pool.to_db_string(), position, now])?;
                    position += 1;
                }
            }
        }
        tx.commit()?;

        Ok(())
    }
}
