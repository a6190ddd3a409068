//! Per-key async locks.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// A table of mutexes, one per key, created on first use and removed when
/// the last holder or waiter lets go.
///
/// Callers holding different keys never contend. Clones share the table.
#[derive(Clone, Default)]
pub(crate) struct KeyedLocks {
    locks: Arc<LockTable>,
}

impl KeyedLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub(crate) async fn acquire(&self, key: &str) -> KeyGuard {
        // Clone the Arc out so the shard guard is released before awaiting
        let lock = Arc::clone(self.locks.entry(key.to_string()).or_default().value());
        let guard = lock.lock_owned().await;
        KeyGuard {
            key: key.to_string(),
            table: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Exclusive hold on one key of a [`KeyedLocks`] table.
pub(crate) struct KeyGuard {
    key: String,
    table: Arc<LockTable>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release first so the guard's own Arc no longer counts
        self.guard.take();
        // remove_if runs under the shard write lock, and acquirers clone the
        // Arc under that same lock, so a count of one means nobody is waiting
        self.table
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
