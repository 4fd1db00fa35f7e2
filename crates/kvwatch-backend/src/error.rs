/// Errors from backend operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The write would exceed the store's capacity.
    #[error("quota exceeded writing {key}: need {needed} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    /// The store cannot be reached at all.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Any other backend-specific failure.
    #[error("backend error: {0}")]
    Other(String),
}

impl BackendError {
    /// Returns `true` if this error means the store is out of space.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
