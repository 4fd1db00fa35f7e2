use std::collections::{HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use kvwatch_types::Value;
use tracing::trace;

/// One prior value. `None` means the key was absent before the write.
pub type HistoryEntry = Option<Value>;

/// Per-key bounded history of replaced values, newest first.
pub struct HistoryLedger {
    capacity: NonZeroUsize,
    rings: RwLock<HashMap<String, VecDeque<HistoryEntry>>>,
}

impl HistoryLedger {
    /// Create a ledger that keeps at most `capacity` prior values per key.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            rings: RwLock::new(HashMap::new()),
        }
    }

    /// Maximum number of prior values retained per key.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Push `old_value` to the front of `key`'s history, dropping the oldest
    /// entry if the ring is full.
    pub fn record(&self, key: &str, old_value: HistoryEntry) {
        let mut rings = self.write_rings();
        let ring = rings.entry(key.to_string()).or_default();
        ring.push_front(old_value);
        ring.truncate(self.capacity.get());
        trace!(key, len = ring.len(), "history recorded");
    }

    /// The full history for `key`, newest first. Empty if untracked.
    pub fn get(&self, key: &str) -> Vec<HistoryEntry> {
        self.read_rings()
            .get(key)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Reset `key`'s history to empty. Other keys are untouched.
    pub fn clear(&self, key: &str) {
        if let Some(ring) = self.write_rings().get_mut(key) {
            ring.clear();
        }
    }

    /// Drop the history of every key.
    pub fn clear_all(&self) {
        self.write_rings().clear();
    }

    /// Keys that have had at least one recorded change, sorted.
    pub fn tracked_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.read_rings().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn read_rings(&self) -> RwLockReadGuard<'_, HashMap<String, VecDeque<HistoryEntry>>> {
        self.rings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_rings(&self) -> RwLockWriteGuard<'_, HashMap<String, VecDeque<HistoryEntry>>> {
        self.rings.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HistoryLedger {
    /// A ledger that remembers only the most recent prior value.
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN)
    }
}

impl std::fmt::Debug for HistoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLedger")
            .field("capacity", &self.capacity)
            .field("tracked_keys", &self.read_rings().len())
            .finish()
    }
}
