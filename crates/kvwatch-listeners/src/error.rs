use crate::listener::ListenerScope;

/// Failure reported by a listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type returned by listeners.
pub type ListenerResult = Result<(), ListenerError>;

/// Delivery of a change event was cut short.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    /// A listener failed under [`crate::ListenerFailurePolicy::Abort`];
    /// listeners after it did not run.
    #[error("{scope} listener #{index} for key {key} failed: {source}")]
    ListenerFailed {
        key: String,
        scope: ListenerScope,
        index: usize,
        #[source]
        source: ListenerError,
    },
}
