//! Expiring key-value backend.
//!
//! Session liveness records and rate counters share one keyspace with
//! per-key TTLs. The `TtlStore` trait keeps the backing store swappable;
//! the bundled in-memory implementation covers single-process deployments
//! and tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Backend failure, kept distinct from "key absent" so callers can tell
/// "not authenticated" apart from "authentication system down".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value store with per-key expiry.
///
/// Implementations must provide atomicity for `increment` and
/// last-writer-wins semantics for `set`; callers never read-modify-write.
#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Unconditional overwrite. The previous value, if any, is gone.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Current value, or `None` if the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Removes the key. Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically increments a counter and returns the new count.
    ///
    /// When the increment creates the counter (count transitions to 1)
    /// its expiry is set to `window`; later increments leave it alone.
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError>;
}

enum Slot {
    Text(String),
    Counter(u64),
}

struct Entry {
    slot: Slot,
    deadline: Instant,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// In-memory `TtlStore` with lazy expiry.
///
/// Expired entries are dropped on access; `purge_expired` handles keys
/// that are never touched again (call from a background task).
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.lock().retain(|_, entry| !entry.expired(now));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[async_trait]
impl TtlStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            slot: Slot::Text(value.to_string()),
            deadline: Instant::now() + ttl,
        };
        self.entries.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        if entries.get(key).map_or(false, |entry| entry.expired(now)) {
            entries.remove(key);
            return Ok(None);
        }

        match entries.get(key) {
            Some(Entry {
                slot: Slot::Text(value),
                ..
            }) => Ok(Some(value.clone())),
            _ => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock();
        let now = Instant::now();

        if let Some(entry) = entries.get_mut(key) {
            if !entry.expired(now) {
                if let Slot::Counter(count) = &mut entry.slot {
                    *count += 1;
                    return Ok(*count);
                }
            }
        }

        // Absent, expired, or not a counter: the window starts here
        entries.insert(
            key.to_string(),
            Entry {
                slot: Slot::Counter(1),
                deadline: now + window,
            },
        );
        Ok(1)
    }
}
