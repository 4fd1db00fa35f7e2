use kvwatch_backend::BackendError;
use kvwatch_listeners::NotifyError;
use kvwatch_types::TypeError;

/// Errors from accessor reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum AccessorError {
    /// The backend read failed.
    #[error("error getting value for key {key} from storage: {source}")]
    Access { key: String, source: BackendError },

    /// The backend write failed. Nothing was recorded or announced.
    #[error("error setting value for key {key} in storage: {source}")]
    Write { key: String, source: BackendError },

    /// The backend removal failed.
    #[error("error removing key {key} from storage: {source}")]
    Remove { key: String, source: BackendError },

    /// The value could not be converted to storage text.
    #[error("cannot encode value for key {key}: {source}")]
    Encode { key: String, source: TypeError },

    /// The write and history update happened, but a listener aborted delivery.
    #[error("value for key {key} was stored but notification was aborted: {source}")]
    Listener { key: String, source: NotifyError },

    /// The key is reserved for the capacity probe.
    #[error("key {0} is reserved for the capacity probe")]
    ReservedKey(String),
}

impl AccessorError {
    /// Returns `true` if the backend rejected a write for lack of space.
    pub fn is_quota(&self) -> bool {
        matches!(self, Self::Write { source, .. } if source.is_quota())
    }
}

/// Result alias for accessor operations.
pub type AccessorResult<T> = Result<T, AccessorError>;

/// The capacity probe could not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("Storage memory limit reached")]
    LimitReached {
        #[source]
        source: BackendError,
    },
}

/// Errors from loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),

    #[error("config serialization error: {0}")]
    Serialize(String),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
