use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use kvwatch_accessor::{AccessorError, ChangeAwareAccessor};
use kvwatch_backend::Backend;
use kvwatch_listeners::ListenerFailure;
use kvwatch_types::Value;
use tracing::{debug, warn};

use crate::error::{BatchError, BatchResult};

/// Per-key outcome of [`BatchOperations::set_multiple`].
#[derive(Debug, Default)]
pub struct BatchSetReport {
    /// Keys that were written, in request order.
    pub written: Vec<String>,
    /// Keys skipped because the store was full.
    pub rejected: Vec<String>,
    /// Keys whose write failed for any other reason.
    pub failed: Vec<(String, AccessorError)>,
    /// Listener failures isolated while written keys were delivered. The
    /// keys also appear in `written`.
    pub listener_failures: Vec<(String, ListenerFailure)>,
}

impl BatchSetReport {
    /// Returns `true` if every key was written. Listener failures do not
    /// count against completeness.
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty()
    }
}

/// Multi-key operations bound to one backend.
pub struct BatchOperations<B: Backend + ?Sized> {
    accessor: Arc<ChangeAwareAccessor>,
    backend: Arc<B>,
}

impl<B: Backend + ?Sized> BatchOperations<B> {
    pub fn new(accessor: Arc<ChangeAwareAccessor>, backend: Arc<B>) -> Self {
        Self { accessor, backend }
    }

    pub fn accessor(&self) -> &ChangeAwareAccessor {
        &self.accessor
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Capacity-checked tracked write of every entry, each independent of
    /// the others.
    pub async fn set_multiple<I, K, V>(&self, entries: I) -> BatchSetReport
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let entries: Vec<(String, Value)> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let outcomes = join_all(entries.iter().map(|(key, value)| {
            self.accessor
                .set_checked_deferred(&*self.backend, key, value.clone())
        }))
        .await;

        let mut report = BatchSetReport::default();
        for ((key, _), outcome) in entries.into_iter().zip(outcomes) {
            match outcome {
                Ok(Some(write)) => {
                    report.listener_failures.extend(
                        write
                            .notify
                            .failures
                            .into_iter()
                            .map(|failure| (key.clone(), failure)),
                    );
                    report.written.push(key);
                }
                Ok(None) => report.rejected.push(key),
                Err(err) => {
                    warn!(key = %key, error = %err, "batch write failed");
                    report.failed.push((key, err));
                }
            }
        }

        debug!(
            written = report.written.len(),
            rejected = report.rejected.len(),
            failed = report.failed.len(),
            listener_failures = report.listener_failures.len(),
            "batch set finished"
        );
        report
    }

    /// Tracked read of every key. Every requested key is present in the
    /// result; missing keys map to `None`. When some reads fail, the values
    /// that were read are carried in [`BatchError::Read`].
    pub async fn get_multiple<I, K>(&self, keys: I) -> BatchResult<BTreeMap<String, Option<Value>>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let total = keys.len();

        let outcomes = join_all(
            keys.iter()
                .map(|key| self.accessor.get_deferred(&*self.backend, key)),
        )
        .await;

        let mut values = BTreeMap::new();
        let mut failures = Vec::new();
        for (key, outcome) in keys.into_iter().zip(outcomes) {
            match outcome {
                Ok(value) => {
                    values.insert(key, value);
                }
                Err(err) => failures.push((key, err)),
            }
        }

        if failures.is_empty() {
            debug!(count = total, "batch get finished");
            Ok(values)
        } else {
            Err(BatchError::Read {
                total,
                values,
                failures,
            })
        }
    }

    /// Remove every key straight from the backend. Removals produce no
    /// history and no change events.
    pub async fn remove_multiple<I, K>(&self, keys: I) -> BatchResult<()>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let total = keys.len();

        let outcomes = join_all(
            keys.iter()
                .map(|key| self.accessor.remove_deferred(&*self.backend, key)),
        )
        .await;

        let failures: Vec<(String, AccessorError)> = keys
            .into_iter()
            .zip(outcomes)
            .filter_map(|(key, outcome)| outcome.err().map(|err| (key, err)))
            .collect();

        if failures.is_empty() {
            debug!(count = total, "batch remove finished");
            Ok(())
        } else {
            Err(BatchError::Remove { total, failures })
        }
    }
}

impl<B: Backend + ?Sized> Clone for BatchOperations<B> {
    fn clone(&self) -> Self {
        Self {
            accessor: Arc::clone(&self.accessor),
            backend: Arc::clone(&self.backend),
        }
    }
}
