use std::collections::BTreeMap;

use kvwatch_accessor::AccessorError;
use kvwatch_types::Value;

/// Aggregated per-key failures from a batch operation.
///
/// Every key was attempted; `failures` lists the ones that did not succeed.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("{} of {total} reads failed", .failures.len())]
    Read {
        total: usize,
        /// Results for every key that was read successfully.
        values: BTreeMap<String, Option<Value>>,
        failures: Vec<(String, AccessorError)>,
    },

    #[error("{} of {total} removals failed", .failures.len())]
    Remove {
        total: usize,
        failures: Vec<(String, AccessorError)>,
    },
}

impl BatchError {
    /// Keys that failed, in request order.
    pub fn failed_keys(&self) -> Vec<&str> {
        let failures = match self {
            Self::Read { failures, .. } | Self::Remove { failures, .. } => failures,
        };
        failures.iter().map(|(key, _)| key.as_str()).collect()
    }
}

/// Result alias for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;
