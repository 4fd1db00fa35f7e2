use std::collections::BTreeMap;
use std::sync::Arc;

use kvwatch_accessor::{ChangeAwareAccessor, TrackedWrite, WatchConfig};
use kvwatch_backend::{Backend, InMemoryBackend};
use kvwatch_batch::{BatchOperations, BatchSetReport};
use kvwatch_history::HistoryEntry;
use kvwatch_listeners::{ListenerResult, SharedListener};
use kvwatch_proxy::TrackedBackend;
use kvwatch_types::Value;
use tracing::info;

use crate::error::KvWatchResult;

/// Change tracking over one backend.
pub struct KvWatch<B: Backend + ?Sized = InMemoryBackend> {
    config: WatchConfig,
    accessor: Arc<ChangeAwareAccessor>,
    backend: Arc<B>,
    batch: BatchOperations<B>,
}

impl KvWatch<InMemoryBackend> {
    /// Track a fresh in-memory backend.
    pub fn in_memory(config: WatchConfig) -> KvWatchResult<Self> {
        Self::with_config(Arc::new(InMemoryBackend::new()), config)
    }
}

impl<B: Backend + ?Sized> KvWatch<B> {
    /// Track `backend` with the default configuration.
    pub fn new(backend: Arc<B>) -> KvWatchResult<Self> {
        Self::with_config(backend, WatchConfig::default())
    }

    /// Track `backend` with an explicit configuration.
    pub fn with_config(backend: Arc<B>, config: WatchConfig) -> KvWatchResult<Self> {
        let accessor = Arc::new(ChangeAwareAccessor::new(&config)?);
        let batch = BatchOperations::new(Arc::clone(&accessor), Arc::clone(&backend));
        info!(
            history_size = config.history_size,
            encoding = %config.encoding,
            listener_failure = %config.listener_failure,
            "kvwatch initialized"
        );
        Ok(Self {
            config,
            accessor,
            backend,
            batch,
        })
    }

    /// Track `backend` with configuration parsed from a TOML document.
    pub fn from_toml_str(backend: Arc<B>, toml: &str) -> KvWatchResult<Self> {
        let config = WatchConfig::from_toml_str(toml)?;
        Self::with_config(backend, config)
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn accessor(&self) -> &ChangeAwareAccessor {
        &self.accessor
    }

    /// The tracked backend. Direct use bypasses tracking.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Batch operations bound to this backend.
    pub fn batch(&self) -> &BatchOperations<B> {
        &self.batch
    }

    // ---- Tracked access ----

    pub fn get(&self, key: &str) -> KvWatchResult<Option<Value>> {
        Ok(self.accessor.get(self.backend(), key)?)
    }

    /// Tracked write. The outcome lists any listener failures that were
    /// isolated during delivery.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> KvWatchResult<TrackedWrite> {
        Ok(self.accessor.set(self.backend(), key, value)?)
    }

    /// Probe for capacity, then write. `Ok(false)` means the store was full.
    pub fn set_with_memory_check(&self, key: &str, value: impl Into<Value>) -> KvWatchResult<bool> {
        Ok(self.accessor.set_with_memory_check(self.backend(), key, value)?)
    }

    pub async fn get_deferred(&self, key: &str) -> KvWatchResult<Option<Value>> {
        Ok(self.accessor.get_deferred(self.backend(), key).await?)
    }

    pub async fn set_deferred(
        &self,
        key: &str,
        value: impl Into<Value>,
    ) -> KvWatchResult<TrackedWrite> {
        Ok(self.accessor.set_deferred(self.backend(), key, value).await?)
    }

    pub async fn set_with_memory_check_deferred(
        &self,
        key: &str,
        value: impl Into<Value>,
    ) -> KvWatchResult<bool> {
        Ok(self
            .accessor
            .set_with_memory_check_deferred(self.backend(), key, value)
            .await?)
    }

    // ---- Batch ----

    pub async fn set_multiple<I, K, V>(&self, entries: I) -> BatchSetReport
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.batch.set_multiple(entries).await
    }

    pub async fn get_multiple<I, K>(&self, keys: I) -> KvWatchResult<BTreeMap<String, Option<Value>>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Ok(self.batch.get_multiple(keys).await?)
    }

    pub async fn remove_multiple<I, K>(&self, keys: I) -> KvWatchResult<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Ok(self.batch.remove_multiple(keys).await?)
    }

    // ---- Listeners ----

    pub fn add_change_listener<F>(&self, key: &str, listener: F)
    where
        F: Fn(&Value, Option<&Value>, &str) -> ListenerResult + Send + Sync + 'static,
    {
        self.accessor.listeners().add_change_listener(key, listener);
    }

    pub fn add_shared_change_listener(&self, key: &str, listener: SharedListener) {
        self.accessor
            .listeners()
            .add_shared_change_listener(key, listener);
    }

    pub fn clear_change_listeners(&self, key: &str) {
        self.accessor.listeners().clear_change_listeners(key);
    }

    pub fn add_global_change_listener<F>(&self, listener: F)
    where
        F: Fn(&Value, Option<&Value>, &str) -> ListenerResult + Send + Sync + 'static,
    {
        self.accessor.listeners().add_global_change_listener(listener);
    }

    pub fn add_shared_global_change_listener(&self, listener: SharedListener) {
        self.accessor
            .listeners()
            .add_shared_global_change_listener(listener);
    }

    pub fn clear_global_change_listeners(&self) {
        self.accessor.listeners().clear_global_change_listeners();
    }

    // ---- History ----

    /// Prior values of `key`, newest first.
    pub fn get_history(&self, key: &str) -> Vec<HistoryEntry> {
        self.accessor.history().get(key)
    }

    pub fn clear_history(&self, key: &str) {
        self.accessor.history().clear(key);
    }

    // ---- Interception ----

    /// A [`Backend`] view of the tracked store whose reads and writes go
    /// through this instance's accessor.
    pub fn tracked(&self) -> TrackedBackend<B> {
        TrackedBackend::new(Arc::clone(&self.accessor), Arc::clone(&self.backend))
    }
}

impl<B: Backend + ?Sized> std::fmt::Debug for KvWatch<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvWatch")
            .field("config", &self.config)
            .field("accessor", &self.accessor)
            .finish_non_exhaustive()
    }
}
