use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use kvwatch_types::Value;
use tracing::{debug, warn};

use crate::error::{ListenerError, ListenerResult, NotifyError};
use crate::listener::{ChangeListener, ListenerFailurePolicy, ListenerScope, SharedListener};

/// One listener that failed while an event was delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListenerFailure {
    pub scope: ListenerScope,
    /// Position of the listener within its scope's list.
    pub index: usize,
    pub error: ListenerError,
}

/// Outcome of delivering one change event.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NotifyReport {
    /// Listeners that were invoked, successful or not.
    pub invoked: usize,
    /// Listeners that returned an error (isolate policy only).
    pub failures: Vec<ListenerFailure>,
}

impl NotifyReport {
    /// Returns `true` if every invoked listener succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Per-key and global listener lists.
///
/// Lists are snapshotted before delivery, so a listener may add or clear
/// listeners while it runs. Such changes take effect from the next event.
pub struct ListenerRegistry {
    policy: ListenerFailurePolicy,
    per_key: RwLock<HashMap<String, Vec<SharedListener>>>,
    global: RwLock<Vec<SharedListener>>,
}

impl ListenerRegistry {
    pub fn new(policy: ListenerFailurePolicy) -> Self {
        Self {
            policy,
            per_key: RwLock::new(HashMap::new()),
            global: RwLock::new(Vec::new()),
        }
    }

    /// The active failure policy.
    pub fn policy(&self) -> ListenerFailurePolicy {
        self.policy
    }

    /// Append a listener to `key`'s list.
    pub fn add_change_listener<F>(&self, key: &str, listener: F)
    where
        F: Fn(&Value, Option<&Value>, &str) -> ListenerResult + Send + Sync + 'static,
    {
        self.add_shared_change_listener(key, Arc::new(listener));
    }

    /// Append an already shared listener to `key`'s list.
    pub fn add_shared_change_listener(&self, key: &str, listener: SharedListener) {
        let mut per_key = self.per_key.write().unwrap_or_else(PoisonError::into_inner);
        per_key.entry(key.to_string()).or_default().push(listener);
        debug!(key, "change listener added");
    }

    /// Remove every listener registered for `key`. Other keys are untouched.
    pub fn clear_change_listeners(&self, key: &str) {
        let mut per_key = self.per_key.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = per_key.get_mut(key) {
            list.clear();
        }
    }

    /// Append a listener that observes every key.
    pub fn add_global_change_listener<F>(&self, listener: F)
    where
        F: Fn(&Value, Option<&Value>, &str) -> ListenerResult + Send + Sync + 'static,
    {
        self.add_shared_global_change_listener(Arc::new(listener));
    }

    /// Append an already shared listener to the global list.
    pub fn add_shared_global_change_listener(&self, listener: SharedListener) {
        self.global
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
        debug!("global change listener added");
    }

    /// Remove every global listener. Safe to call repeatedly.
    pub fn clear_global_change_listeners(&self) {
        self.global
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of listeners registered for `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.per_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map_or(0, Vec::len)
    }

    /// Number of global listeners.
    pub fn global_listener_count(&self) -> usize {
        self.global.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Deliver one change: `key`'s listeners first, then global listeners.
    pub fn notify(
        &self,
        new_value: &Value,
        old_value: Option<&Value>,
        key: &str,
    ) -> Result<NotifyReport, NotifyError> {
        let keyed = self.snapshot_key(key);
        let global = self.snapshot_global();

        let mut report = NotifyReport::default();
        let groups = [(ListenerScope::Key, keyed), (ListenerScope::Global, global)];
        for (scope, listeners) in groups {
            for (index, listener) in listeners.iter().enumerate() {
                report.invoked += 1;
                if let Err(error) = listener.on_change(new_value, old_value, key) {
                    match self.policy {
                        ListenerFailurePolicy::Abort => {
                            return Err(NotifyError::ListenerFailed {
                                key: key.to_string(),
                                scope,
                                index,
                                source: error,
                            });
                        }
                        ListenerFailurePolicy::Isolate => {
                            warn!(key, %scope, index, %error, "change listener failed");
                            report.failures.push(ListenerFailure {
                                scope,
                                index,
                                error,
                            });
                        }
                    }
                }
            }
        }

        debug!(key, invoked = report.invoked, failed = report.failures.len(), "change delivered");
        Ok(report)
    }

    fn snapshot_key(&self, key: &str) -> Vec<SharedListener> {
        self.per_key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn snapshot_global(&self) -> Vec<SharedListener> {
        self.global.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new(ListenerFailurePolicy::default())
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys = self
            .per_key
            .read()
            .map(|m| m.len())
            .unwrap_or(0);
        f.debug_struct("ListenerRegistry")
            .field("policy", &self.policy)
            .field("keys", &keys)
            .field("global", &self.global_listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn recorder(log: &Log, tag: &'static str) -> impl ChangeListener + 'static {
        let log = Arc::clone(log);
        move |new: &Value, old: Option<&Value>, key: &str| -> ListenerResult {
            let old = old.map_or_else(|| "<absent>".to_string(), Value::to_string);
            log.lock().unwrap().push(format!("{tag}:{key}:{old}->{new}"));
            Ok(())
        }
    }

    fn failing(log: &Log, tag: &'static str) -> impl ChangeListener + 'static {
        let log = Arc::clone(log);
        move |_: &Value, _: Option<&Value>, _: &str| -> ListenerResult {
            log.lock().unwrap().push(format!("{tag}:failed"));
            Err(ListenerError::new(format!("{tag} exploded")))
        }
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    // -----------------------------------------------------------------------
    // Registration and ordering
    // -----------------------------------------------------------------------

    #[test]
    fn key_listener_receives_new_old_and_key() {
        let registry = ListenerRegistry::default();
        let log = new_log();
        registry.add_shared_change_listener("k", Arc::new(recorder(&log, "L")));

        let old = Value::text("before");
        let report = registry.notify(&Value::text("after"), Some(&old), "k").unwrap();

        assert_eq!(report.invoked, 1);
        assert!(report.is_clean());
        assert_eq!(entries(&log), vec!["L:k:before->after"]);
    }

    #[test]
    fn listeners_for_other_keys_are_not_invoked() {
        let registry = ListenerRegistry::default();
        let log = new_log();
        registry.add_shared_change_listener("a", Arc::new(recorder(&log, "A")));

        registry.notify(&Value::text("v"), None, "b").unwrap();
        assert!(entries(&log).is_empty());
    }

    #[test]
    fn key_listeners_run_before_global_in_registration_order() {
        let registry = ListenerRegistry::default();
        let log = new_log();
        registry.add_shared_global_change_listener(Arc::new(recorder(&log, "G1")));
        registry.add_shared_change_listener("k", Arc::new(recorder(&log, "K1")));
        registry.add_shared_global_change_listener(Arc::new(recorder(&log, "G2")));
        registry.add_shared_change_listener("k", Arc::new(recorder(&log, "K2")));

        registry.notify(&Value::text("v"), None, "k").unwrap();
        assert_eq!(
            entries(&log),
            vec![
                "K1:k:<absent>->v",
                "K2:k:<absent>->v",
                "G1:k:<absent>->v",
                "G2:k:<absent>->v",
            ]
        );
    }

    #[test]
    fn global_listener_sees_every_key() {
        let registry = ListenerRegistry::default();
        let log = new_log();
        registry.add_shared_global_change_listener(Arc::new(recorder(&log, "G")));

        registry.notify(&Value::text("1"), None, "x").unwrap();
        registry.notify(&Value::text("2"), None, "y").unwrap();
        assert_eq!(entries(&log), vec!["G:x:<absent>->1", "G:y:<absent>->2"]);
    }

    #[test]
    fn closure_registration() {
        let registry = ListenerRegistry::default();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        registry.add_change_listener("k", move |_, _, _| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });
        let counter = Arc::clone(&hits);
        registry.add_global_change_listener(move |_, _, _| {
            *counter.lock().unwrap() += 10;
            Ok(())
        });

        registry.notify(&Value::Bool(true), None, "k").unwrap();
        assert_eq!(*hits.lock().unwrap(), 11);
        assert_eq!(registry.listener_count("k"), 1);
        assert_eq!(registry.global_listener_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Clearing
    // -----------------------------------------------------------------------

    #[test]
    fn clear_change_listeners_is_per_key() {
        let registry = ListenerRegistry::default();
        let log = new_log();
        registry.add_shared_change_listener("a", Arc::new(recorder(&log, "A")));
        registry.add_shared_change_listener("b", Arc::new(recorder(&log, "B")));

        registry.clear_change_listeners("a");
        registry.notify(&Value::text("1"), None, "a").unwrap();
        registry.notify(&Value::text("2"), None, "b").unwrap();

        assert_eq!(entries(&log), vec!["B:b:<absent>->2"]);
        assert_eq!(registry.listener_count("a"), 0);
    }

    #[test]
    fn clear_unknown_key_is_noop() {
        let registry = ListenerRegistry::default();
        registry.clear_change_listeners("never");
        assert_eq!(registry.listener_count("never"), 0);
    }

    #[test]
    fn clearing_global_listeners_twice_is_harmless() {
        let registry = ListenerRegistry::default();
        let log = new_log();
        registry.add_shared_global_change_listener(Arc::new(recorder(&log, "G")));

        registry.clear_global_change_listeners();
        registry.clear_global_change_listeners();

        registry.notify(&Value::text("v"), None, "k").unwrap();
        assert!(entries(&log).is_empty());
        assert_eq!(registry.global_listener_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Failure policy
    // -----------------------------------------------------------------------

    #[test]
    fn isolate_keeps_delivering_after_a_failure() {
        let registry = ListenerRegistry::new(ListenerFailurePolicy::Isolate);
        let log = new_log();
        registry.add_shared_change_listener("k", Arc::new(failing(&log, "K1")));
        registry.add_shared_change_listener("k", Arc::new(recorder(&log, "K2")));
        registry.add_shared_global_change_listener(Arc::new(recorder(&log, "G")));

        let report = registry.notify(&Value::text("v"), None, "k").unwrap();

        assert_eq!(
            entries(&log),
            vec!["K1:failed", "K2:k:<absent>->v", "G:k:<absent>->v"]
        );
        assert_eq!(report.invoked, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].scope, ListenerScope::Key);
        assert_eq!(report.failures[0].index, 0);
        assert_eq!(report.failures[0].error.message(), "K1 exploded");
    }

    #[test]
    fn abort_stops_at_the_first_failure() {
        let registry = ListenerRegistry::new(ListenerFailurePolicy::Abort);
        let log = new_log();
        registry.add_shared_change_listener("k", Arc::new(recorder(&log, "K1")));
        registry.add_shared_change_listener("k", Arc::new(failing(&log, "K2")));
        registry.add_shared_global_change_listener(Arc::new(recorder(&log, "G")));

        let err = registry.notify(&Value::text("v"), None, "k").unwrap_err();

        assert_eq!(entries(&log), vec!["K1:k:<absent>->v", "K2:failed"]);
        let NotifyError::ListenerFailed {
            key, scope, index, ..
        } = err;
        assert_eq!(key, "k");
        assert_eq!(scope, ListenerScope::Key);
        assert_eq!(index, 1);
    }

    #[test]
    fn abort_in_global_scope_is_reported() {
        let registry = ListenerRegistry::new(ListenerFailurePolicy::Abort);
        let log = new_log();
        registry.add_shared_global_change_listener(Arc::new(failing(&log, "G")));

        let err = registry.notify(&Value::text("v"), None, "k").unwrap_err();
        assert!(err.to_string().contains("global listener #0"));
    }

    // -----------------------------------------------------------------------
    // Re-entrancy
    // -----------------------------------------------------------------------

    #[test]
    fn listener_may_register_listeners_during_delivery() {
        let registry = Arc::new(ListenerRegistry::default());
        let log = new_log();

        let inner_registry = Arc::clone(&registry);
        let inner_log = Arc::clone(&log);
        registry.add_change_listener("k", move |_, _, _| {
            inner_registry.add_shared_change_listener("k", Arc::new(recorder(&inner_log, "late")));
            Ok(())
        });

        // First event: the late listener is added but not invoked.
        registry.notify(&Value::text("1"), None, "k").unwrap();
        assert!(entries(&log).is_empty());

        // Second event: it runs.
        registry.notify(&Value::text("2"), None, "k").unwrap();
        assert_eq!(entries(&log), vec!["late:k:<absent>->2"]);
    }
}
