use kvwatch_backend::Backend;
use kvwatch_history::{HistoryEntry, HistoryLedger};
use kvwatch_listeners::{ListenerFailure, ListenerRegistry, NotifyReport};
use kvwatch_types::{ChangeEvent, Value, ValueEncoding};
use tracing::{debug, warn};

use crate::config::WatchConfig;
use crate::error::{AccessorError, AccessorResult, ConfigError};
use crate::guard::CapacityGuard;

/// Outcome of one tracked write.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedWrite {
    pub event: ChangeEvent,
    /// How listener delivery went. Failures are listed here only under the
    /// isolate policy; under abort they surface as [`AccessorError::Listener`].
    pub notify: NotifyReport,
}

impl TrackedWrite {
    /// Listeners that failed while this change was delivered.
    pub fn listener_failures(&self) -> &[ListenerFailure] {
        &self.notify.failures
    }
}

/// Tracked reads and writes over any [`Backend`].
///
/// The accessor does not own a backend; every operation names the backend it
/// acts on. History and listeners are shared across all backends the
/// accessor is used with.
///
/// A write goes through these steps, in order:
///
/// 1. read the current value (the event's `old_value`)
/// 2. write the encoded new value
/// 3. record `old_value` in the history ledger
/// 4. notify key listeners, then global listeners
///
/// Step 2 is the only step that can fail for a backend reason. When it
/// fails, steps 3 and 4 do not happen.
#[derive(Debug)]
pub struct ChangeAwareAccessor {
    encoding: ValueEncoding,
    history: HistoryLedger,
    listeners: ListenerRegistry,
    guard: CapacityGuard,
}

impl ChangeAwareAccessor {
    /// Build an accessor from a validated configuration.
    pub fn new(config: &WatchConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            encoding: config.encoding,
            history: HistoryLedger::new(config.history_capacity()?),
            listeners: ListenerRegistry::new(config.listener_failure),
            guard: CapacityGuard::new(config.probe_key.clone(), config.probe_value.clone()),
        })
    }

    pub fn encoding(&self) -> ValueEncoding {
        self.encoding
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    pub fn guard(&self) -> &CapacityGuard {
        &self.guard
    }

    // -----------------------------------------------------------------------
    // Direct mode
    // -----------------------------------------------------------------------

    /// Read and decode the value at `key`. A missing key is `Ok(None)`.
    pub fn get<B: Backend + ?Sized>(&self, backend: &B, key: &str) -> AccessorResult<Option<Value>> {
        Ok(self.get_with_text(backend, key)?.map(|(_, value)| value))
    }

    /// Like [`Self::get`], but also hand back the text exactly as stored.
    pub fn get_with_text<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
    ) -> AccessorResult<Option<(String, Value)>> {
        let raw = backend
            .get_item(key)
            .map_err(|source| AccessorError::Access {
                key: key.to_string(),
                source,
            })?;
        debug!(key, found = raw.is_some(), "tracked read");
        Ok(raw.map(|text| {
            let value = self.encoding.decode(text.clone());
            (text, value)
        }))
    }

    /// Write `value` at `key`, record the replaced value and notify listeners.
    pub fn set<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
        value: impl Into<Value>,
    ) -> AccessorResult<TrackedWrite> {
        self.ensure_not_reserved(key)?;
        let value = value.into();

        let old_value: HistoryEntry = self.get(backend, key)?;
        let text = self
            .encoding
            .encode(&value)
            .map_err(|source| AccessorError::Encode {
                key: key.to_string(),
                source,
            })?;

        backend
            .set_item(key, &text)
            .map_err(|source| AccessorError::Write {
                key: key.to_string(),
                source,
            })?;
        debug!(key, kind = value.kind(), bytes = text.len(), "tracked write");

        self.history.record(key, old_value.clone());
        let notify = self
            .listeners
            .notify(&value, old_value.as_ref(), key)
            .map_err(|source| AccessorError::Listener {
                key: key.to_string(),
                source,
            })?;

        Ok(TrackedWrite {
            event: ChangeEvent::new(key, value, old_value),
            notify,
        })
    }

    /// Like [`Self::set`], but probe for capacity first.
    ///
    /// Returns `Ok(false)` without touching `key` when the probe fails, and
    /// `Ok(false)` when the probe passed but the real write was still
    /// rejected for lack of space. Other failures are returned as errors.
    pub fn set_with_memory_check<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
        value: impl Into<Value>,
    ) -> AccessorResult<bool> {
        Ok(self.set_checked(backend, key, value)?.is_some())
    }

    /// [`Self::set_with_memory_check`] that keeps the write outcome.
    /// `Ok(None)` means the store was full.
    pub fn set_checked<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
        value: impl Into<Value>,
    ) -> AccessorResult<Option<TrackedWrite>> {
        self.ensure_not_reserved(key)?;

        if let Err(err) = self.guard.check_limit(backend) {
            warn!(key, error = %err, "write skipped: capacity probe failed");
            return Ok(None);
        }

        match self.set(backend, key, value) {
            Ok(write) => Ok(Some(write)),
            Err(err) if err.is_quota() => {
                warn!(key, error = %err, "write rejected after capacity probe passed");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Remove `key` without recording history or notifying listeners.
    pub fn remove<B: Backend + ?Sized>(&self, backend: &B, key: &str) -> AccessorResult<()> {
        backend
            .remove_item(key)
            .map_err(|source| AccessorError::Remove {
                key: key.to_string(),
                source,
            })?;
        debug!(key, "untracked removal");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Deferred mode
    // -----------------------------------------------------------------------

    /// Deferred form of [`Self::get`].
    pub async fn get_deferred<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
    ) -> AccessorResult<Option<Value>> {
        tokio::task::yield_now().await;
        self.get(backend, key)
    }

    /// Deferred form of [`Self::set`].
    pub async fn set_deferred<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
        value: impl Into<Value>,
    ) -> AccessorResult<TrackedWrite> {
        let value = value.into();
        tokio::task::yield_now().await;
        self.set(backend, key, value)
    }

    /// Deferred form of [`Self::set_with_memory_check`].
    pub async fn set_with_memory_check_deferred<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
        value: impl Into<Value>,
    ) -> AccessorResult<bool> {
        let value = value.into();
        tokio::task::yield_now().await;
        self.set_with_memory_check(backend, key, value)
    }

    /// Deferred form of [`Self::set_checked`].
    pub async fn set_checked_deferred<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
        value: impl Into<Value>,
    ) -> AccessorResult<Option<TrackedWrite>> {
        let value = value.into();
        tokio::task::yield_now().await;
        self.set_checked(backend, key, value)
    }

    /// Deferred form of [`Self::remove`].
    pub async fn remove_deferred<B: Backend + ?Sized>(
        &self,
        backend: &B,
        key: &str,
    ) -> AccessorResult<()> {
        tokio::task::yield_now().await;
        self.remove(backend, key)
    }

    fn ensure_not_reserved(&self, key: &str) -> AccessorResult<()> {
        if self.guard.is_reserved(key) {
            return Err(AccessorError::ReservedKey(key.to_string()));
        }
        Ok(())
    }
}

impl Default for ChangeAwareAccessor {
    fn default() -> Self {
        Self {
            encoding: ValueEncoding::default(),
            history: HistoryLedger::default(),
            listeners: ListenerRegistry::default(),
            guard: CapacityGuard::default(),
        }
    }
}
