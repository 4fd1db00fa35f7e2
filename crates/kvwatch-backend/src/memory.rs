use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{BackendError, BackendResult};
use crate::traits::Backend;

/// In-memory, HashMap-based backend.
///
/// Intended for tests and embedding. Entries live behind a `RwLock`.
/// An optional quota bounds the total size of stored keys plus values in
/// bytes, mirroring how browser storage enforces its limit. The backend can
/// also be switched off to simulate storage that is unavailable.
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
    available: AtomicBool,
}

fn entry_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

impl InMemoryBackend {
    /// Create a new empty backend with no quota.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota: None,
            available: AtomicBool::new(true),
        }
    }

    /// Create a new empty backend that holds at most `bytes` of keys and values.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::new()
        }
    }

    /// The configured quota in bytes, if any.
    pub fn quota(&self) -> Option<usize> {
        self.quota
    }

    /// Total bytes of keys and values currently stored.
    pub fn used_bytes(&self) -> BackendResult<usize> {
        let map = self.read_map()?;
        Ok(map.iter().map(|(k, v)| entry_size(k, v)).sum())
    }

    /// Make every subsequent operation fail with [`BackendError::Unavailable`].
    pub fn disable(&self) {
        self.available.store(false, Ordering::SeqCst);
    }

    /// Undo [`Self::disable`].
    pub fn enable(&self) {
        self.available.store(true, Ordering::SeqCst);
    }

    fn check_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("storage is disabled".into()))
        }
    }

    fn read_map(
        &self,
    ) -> BackendResult<std::sync::RwLockReadGuard<'_, HashMap<String, String>>> {
        self.entries
            .read()
            .map_err(|e| BackendError::Other(format!("lock poisoned: {e}")))
    }

    fn write_map(
        &self,
    ) -> BackendResult<std::sync::RwLockWriteGuard<'_, HashMap<String, String>>> {
        self.entries
            .write()
            .map_err(|e| BackendError::Other(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for InMemoryBackend {
    fn get_item(&self, key: &str) -> BackendResult<Option<String>> {
        self.check_available()?;
        let map = self.read_map()?;
        Ok(map.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> BackendResult<()> {
        self.check_available()?;
        let mut map = self.write_map()?;

        if let Some(quota) = self.quota {
            let used: usize = map.iter().map(|(k, v)| entry_size(k, v)).sum();
            let replaced = map.get(key).map_or(0, |old| entry_size(key, old));
            let available = quota.saturating_sub(used - replaced);
            let needed = entry_size(key, value);
            if needed > available {
                debug!(key, needed, available, "write rejected by quota");
                return Err(BackendError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }

        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> BackendResult<()> {
        self.check_available()?;
        let mut map = self.write_map()?;
        map.remove(key);
        Ok(())
    }

    fn keys(&self) -> BackendResult<Vec<String>> {
        self.check_available()?;
        let map = self.read_map()?;
        Ok(map.keys().cloned().collect())
    }

    fn len(&self) -> BackendResult<usize> {
        self.check_available()?;
        Ok(self.read_map()?.len())
    }

    fn clear(&self) -> BackendResult<()> {
        self.check_available()?;
        self.write_map()?.clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.read_map().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("InMemoryBackend")
            .field("entry_count", &count)
            .field("quota", &self.quota)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // -----------------------------------------------------------------------
    // Core get / set / remove
    // -----------------------------------------------------------------------

    #[test]
    fn set_and_get() {
        let backend = InMemoryBackend::new();
        backend.set_item("k", "v").unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn missing_key_is_none() {
        let backend = InMemoryBackend::new();
        assert!(backend.get_item("missing").unwrap().is_none());
    }

    #[test]
    fn empty_string_is_a_value() {
        let backend = InMemoryBackend::new();
        backend.set_item("k", "").unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn set_overwrites() {
        let backend = InMemoryBackend::new();
        backend.set_item("k", "1").unwrap();
        backend.set_item("k", "2").unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("2"));
        assert_eq!(backend.len().unwrap(), 1);
    }

    #[test]
    fn remove_present_and_missing() {
        let backend = InMemoryBackend::new();
        backend.set_item("k", "v").unwrap();
        backend.remove_item("k").unwrap();
        assert!(backend.get_item("k").unwrap().is_none());
        // Removing again is a no-op.
        backend.remove_item("k").unwrap();
    }

    // -----------------------------------------------------------------------
    // Key listing / clear
    // -----------------------------------------------------------------------

    #[test]
    fn keys_len_and_clear() {
        let backend = InMemoryBackend::new();
        assert!(backend.is_empty().unwrap());
        backend.set_item("a", "1").unwrap();
        backend.set_item("b", "2").unwrap();

        let mut keys = backend.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(backend.len().unwrap(), 2);

        backend.clear().unwrap();
        assert!(backend.is_empty().unwrap());
    }

    // -----------------------------------------------------------------------
    // Quota
    // -----------------------------------------------------------------------

    #[test]
    fn quota_rejects_oversized_write() {
        let backend = InMemoryBackend::with_quota(8);
        backend.set_item("k", "1234").unwrap(); // 5 bytes
        let err = backend.set_item("j", "12345").unwrap_err(); // 6 bytes, 3 left
        assert!(err.is_quota());
        match err {
            BackendError::QuotaExceeded {
                needed, available, ..
            } => {
                assert_eq!(needed, 6);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Rejected write left no trace.
        assert!(backend.get_item("j").unwrap().is_none());
        assert_eq!(backend.used_bytes().unwrap(), 5);
    }

    #[test]
    fn quota_counts_replaced_entry_as_free() {
        let backend = InMemoryBackend::with_quota(6);
        backend.set_item("k", "12345").unwrap(); // 6 bytes, full
        backend.set_item("k", "abcde").unwrap(); // replaces in place
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("abcde"));
    }

    #[test]
    fn remove_frees_quota() {
        let backend = InMemoryBackend::with_quota(6);
        backend.set_item("k", "12345").unwrap();
        assert!(backend.set_item("j", "1").is_err());
        backend.remove_item("k").unwrap();
        backend.set_item("j", "1").unwrap();
        assert_eq!(backend.quota(), Some(6));
    }

    // -----------------------------------------------------------------------
    // Availability
    // -----------------------------------------------------------------------

    #[test]
    fn disabled_backend_fails_every_operation() {
        let backend = InMemoryBackend::new();
        backend.set_item("k", "v").unwrap();
        backend.disable();

        assert!(matches!(
            backend.get_item("k"),
            Err(BackendError::Unavailable(_))
        ));
        assert!(backend.set_item("k", "w").is_err());
        assert!(backend.remove_item("k").is_err());
        assert!(backend.keys().is_err());

        backend.enable();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("v"));
    }

    // -----------------------------------------------------------------------
    // Sharing
    // -----------------------------------------------------------------------

    #[test]
    fn arc_backend_delegates() {
        let backend = Arc::new(InMemoryBackend::new());
        let shared: Arc<InMemoryBackend> = Arc::clone(&backend);
        shared.set_item("k", "v").unwrap();
        assert_eq!(backend.get_item("k").unwrap().as_deref(), Some("v"));
        assert_eq!(Backend::len(&shared).unwrap(), 1);
    }

    #[test]
    fn concurrent_writes_are_safe() {
        use std::thread;

        let backend = Arc::new(InMemoryBackend::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let backend = Arc::clone(&backend);
                thread::spawn(move || {
                    for j in 0..25 {
                        backend
                            .set_item(&format!("k{i}-{j}"), "v")
                            .expect("write should succeed");
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
        assert_eq!(backend.len().unwrap(), 200);
    }

    #[test]
    fn debug_format() {
        let backend = InMemoryBackend::with_quota(10);
        backend.set_item("x", "y").unwrap();
        let debug = format!("{backend:?}");
        assert!(debug.contains("InMemoryBackend"));
        assert!(debug.contains("entry_count"));
    }
}
