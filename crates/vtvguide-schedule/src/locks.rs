//! Per-key async locks for schedule maintenance.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async mutex.
///
/// Operations on the same key are serialized while different keys proceed
/// concurrently. Callers [`release`](Self::release) a key when done so the
/// map only holds keys that are in use.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    /// Creates an empty lock collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets or creates the lock for `key`.
    pub fn get(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(key.to_owned()).or_default().value())
    }

    /// Waits for and takes the lock for `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        self.get(key).lock_owned().await
    }

    /// Drops the entry for `key` if nobody holds or waits on its lock.
    ///
    /// Returns `true` if the entry was removed.
    pub fn release(&self, key: &str) -> bool {
        // Holders and waiters each keep a clone; 1 means only the map does.
        self.locks
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1)
            .is_some()
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns `true` if no key is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
