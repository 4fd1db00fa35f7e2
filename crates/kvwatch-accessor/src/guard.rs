use kvwatch_backend::Backend;
use tracing::debug;

use crate::config::{DEFAULT_PROBE_KEY, DEFAULT_PROBE_VALUE};
use crate::error::CapacityError;

/// Best-effort probe for storage exhaustion.
///
/// The probe writes a reserved key and removes it again. If either step
/// fails the store is treated as full. A passing probe does not guarantee
/// that a following real write fits: the store can fill up in between, and
/// the real value may be larger than the probe payload. Callers must still
/// handle a failing write.
///
/// The probe key is only reserved for writes made through an accessor. Data
/// that other code stored at the probe key directly on the backend is
/// overwritten and then removed by every probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapacityGuard {
    probe_key: String,
    probe_value: String,
}

impl CapacityGuard {
    pub fn new(probe_key: impl Into<String>, probe_value: impl Into<String>) -> Self {
        Self {
            probe_key: probe_key.into(),
            probe_value: probe_value.into(),
        }
    }

    /// The reserved key the probe writes to.
    pub fn probe_key(&self) -> &str {
        &self.probe_key
    }

    /// Returns `true` if `key` collides with the probe key.
    pub fn is_reserved(&self, key: &str) -> bool {
        key == self.probe_key
    }

    /// Write and remove the probe key.
    pub fn check_limit<B: Backend + ?Sized>(&self, backend: &B) -> Result<(), CapacityError> {
        backend
            .set_item(&self.probe_key, &self.probe_value)
            .map_err(|source| CapacityError::LimitReached { source })?;
        backend
            .remove_item(&self.probe_key)
            .map_err(|source| CapacityError::LimitReached { source })?;
        debug!(probe_key = %self.probe_key, "capacity probe passed");
        Ok(())
    }
}

impl Default for CapacityGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_KEY, DEFAULT_PROBE_VALUE)
    }
}
