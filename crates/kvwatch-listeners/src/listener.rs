use std::fmt;
use std::sync::Arc;

use kvwatch_types::Value;
use serde::{Deserialize, Serialize};

use crate::error::ListenerResult;

/// An observer of key changes.
///
/// Any `Fn(&Value, Option<&Value>, &str) -> ListenerResult` closure that is
/// `Send + Sync` implements this trait.
pub trait ChangeListener: Send + Sync {
    /// Called after `key` changed from `old_value` to `new_value`.
    fn on_change(&self, new_value: &Value, old_value: Option<&Value>, key: &str) -> ListenerResult;
}

impl<F> ChangeListener for F
where
    F: Fn(&Value, Option<&Value>, &str) -> ListenerResult + Send + Sync,
{
    fn on_change(&self, new_value: &Value, old_value: Option<&Value>, key: &str) -> ListenerResult {
        self(new_value, old_value, key)
    }
}

/// A registered listener, shareable across registry snapshots.
pub type SharedListener = Arc<dyn ChangeListener>;

/// Which list a listener was registered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerScope {
    /// Registered for a single key.
    Key,
    /// Registered for every key.
    Global,
}

impl fmt::Display for ListenerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key => f.write_str("key"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// What to do when a listener returns an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListenerFailurePolicy {
    /// Log the failure, keep delivering to the remaining listeners and
    /// report every failure afterwards.
    #[default]
    Isolate,
    /// Stop delivering this event at the first failure and surface it.
    Abort,
}

impl fmt::Display for ListenerFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Isolate => f.write_str("isolate"),
            Self::Abort => f.write_str("abort"),
        }
    }
}
