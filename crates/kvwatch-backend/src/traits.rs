use std::sync::Arc;

use crate::error::BackendResult;

/// A string-keyed, text-valued store.
///
/// All implementations must satisfy these invariants:
/// - `get_item` on a key that was never written returns `Ok(None)`.
/// - `set_item` either stores the full value or fails without side effects.
/// - `remove_item` on a missing key is a successful no-op.
/// - Operations are serialized by the implementation; callers may share a
///   backend across threads without extra locking.
pub trait Backend: Send + Sync {
    /// Read the text stored at `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    /// Returns `Err` if the store itself cannot be read.
    fn get_item(&self, key: &str) -> BackendResult<Option<String>>;

    /// Store `value` at `key`, replacing any previous value.
    ///
    /// Fails with [`crate::BackendError::QuotaExceeded`] when the store is full.
    fn set_item(&self, key: &str, value: &str) -> BackendResult<()>;

    /// Remove `key` from the store.
    fn remove_item(&self, key: &str) -> BackendResult<()>;

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> BackendResult<Vec<String>>;

    /// Number of stored keys.
    fn len(&self) -> BackendResult<usize> {
        Ok(self.keys()?.len())
    }

    /// Returns `true` if nothing is stored.
    fn is_empty(&self) -> BackendResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every key.
    ///
    /// Default implementation removes keys one at a time. Backends may
    /// override with a cheaper bulk operation.
    fn clear(&self) -> BackendResult<()> {
        for key in self.keys()? {
            self.remove_item(&key)?;
        }
        Ok(())
    }
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn get_item(&self, key: &str) -> BackendResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> BackendResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> BackendResult<()> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> BackendResult<Vec<String>> {
        (**self).keys()
    }

    fn len(&self) -> BackendResult<usize> {
        (**self).len()
    }

    fn clear(&self) -> BackendResult<()> {
        (**self).clear()
    }
}
