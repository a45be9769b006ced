//! Credential Rotator
//!
//! Process-wide round-robin over the active API keys. Keys that fail move to the
//! cooling-down set; once that set reaches the configured threshold, or the active set
//! runs dry, every cooling key returns to active.
//!
//! Every mutation is computed on a copy of the partition, persisted through the
//! `CredentialStore`, and only then committed in memory. A failed save leaves the
//! in-memory state untouched and is returned to the caller.

use crate::storage::{CredentialStore, KeyPartition, StorageError};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Credential store error: {0}")]
    Store(#[from] StorageError),

    #[error("No API keys configured")]
    NoKeys,
}

struct RotatorState {
    partition: KeyPartition,
    cursor: usize,
    store: Box<dyn CredentialStore>,
}

impl RotatorState {
    fn commit(&mut self, next: KeyPartition) -> Result<(), CredentialError> {
        if next != self.partition {
            self.store.save(&next)?;
            self.partition = next;
        }
        Ok(())
    }
}

pub struct CredentialRotator {
    state: Mutex<RotatorState>,
    threshold: usize,
}

impl CredentialRotator {
    /// Loads the persisted partition from `store`
    pub fn new(store: Box<dyn CredentialStore>, threshold: usize) -> Result<Self, CredentialError> {
        let partition = store.load()?;
        tracing::info!(
            "Loaded {} active and {} cooling-down API keys",
            partition.active.len(),
            partition.cooling.len()
        );

        Ok(Self {
            state: Mutex::new(RotatorState {
                partition,
                cursor: 0,
                store,
            }),
            threshold: threshold.max(1),
        })
    }

    /// Returns the key under the cursor and advances it
    ///
    /// An empty active set forces a reset first. Fails with `NoKeys` when the pool is
    /// empty altogether.
    pub fn next_key(&self) -> Result<String, CredentialError> {
        let mut state = self.lock();

        if state.partition.active.is_empty() {
            tracing::info!("No active API keys, resetting cooling-down keys");
            let mut next = state.partition.clone();
            reset_partition(&mut next);
            state.commit(next)?;
        }

        let active_len = state.partition.active.len();
        if active_len == 0 {
            return Err(CredentialError::NoKeys);
        }

        if state.cursor >= active_len {
            state.cursor = 0;
        }
        let index = state.cursor;
        let key = state.partition.active[index].clone();
        state.cursor = index + 1;

        tracing::info!("Using API key {} (index {})", mask_key(&key), index);
        Ok(key)
    }

    /// Retires `key` to the cooling-down set
    ///
    /// Unknown or already-retired keys leave the partition as is, but the threshold is
    /// still checked.
    pub fn mark_used(&self, key: &str) -> Result<(), CredentialError> {
        let mut state = self.lock();
        let mut next = state.partition.clone();

        if let Some(position) = next.active.iter().position(|k| k == key) {
            let retired = next.active.remove(position);
            next.cooling.push(retired);
            tracing::info!(
                "Marked API key {} as used ({} cooling down)",
                mask_key(key),
                next.cooling.len()
            );
        }

        if next.cooling.len() >= self.threshold {
            tracing::info!("Cooling-down keys reached {}, resetting", self.threshold);
            reset_partition(&mut next);
        }

        state.commit(next)
    }

    /// Returns every cooling-down key to the active set
    pub fn reset(&self) -> Result<(), CredentialError> {
        let mut state = self.lock();
        let mut next = state.partition.clone();
        reset_partition(&mut next);
        state.commit(next)
    }

    /// A copy of the current partition
    pub fn partition(&self) -> KeyPartition {
        self.lock().partition.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RotatorState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for CredentialRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("CredentialRotator")
            .field("active", &state.partition.active.len())
            .field("cooling", &state.partition.cooling.len())
            .field("threshold", &self.threshold)
            .finish()
    }
}

fn reset_partition(partition: &mut KeyPartition) {
    let cooling = std::mem::take(&mut partition.cooling);
    partition.active.extend(cooling);
}

/// Shows only the first and last five characters of a key
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 5..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Seeds an empty store from a JSON array held in the environment variable `var`
///
/// A store that already holds keys is left alone. Malformed JSON is logged and treated
/// as no keys.
pub fn seed_store_from_env(
    store: &mut dyn CredentialStore,
    var: &str,
) -> Result<usize, CredentialError> {
    if !store.load()?.is_empty() {
        return Ok(0);
    }

    let keys = match std::env::var(var) {
        Ok(raw) => parse_key_list(var, &raw),
        Err(_) => {
            tracing::warn!("{} is not set; credential pool is empty", var);
            Vec::new()
        }
    };

    if keys.is_empty() {
        return Ok(0);
    }

    store.save(&KeyPartition::new(keys.clone()))?;
    tracing::info!("Seeded credential store with {} keys from {}", keys.len(), var);
    Ok(keys.len())
}

/// Parses a JSON array of keys, dropping blanks and duplicates
pub fn parse_key_list(var: &str, raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(keys) => {
            let mut unique: Vec<String> = Vec::with_capacity(keys.len());
            for key in keys {
                let key = key.trim().to_string();
                if !key.is_empty() && !unique.contains(&key) {
                    unique.push(key);
                }
            }
            unique
        }
        Err(e) => {
            tracing::warn!("{} is not a JSON array of strings ({}); using no keys", var, e);
            Vec::new()
        }
    }
}
