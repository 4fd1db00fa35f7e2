use std::sync::Arc;

use kvwatch_accessor::{AccessorError, ChangeAwareAccessor};
use kvwatch_backend::{Backend, BackendError, BackendResult};
use kvwatch_types::Value;
use tracing::trace;

/// A [`Backend`] whose keyed reads and writes are tracked.
///
/// | Operation | Route |
/// |-----------|-------|
/// | `get_item` | accessor `get`; decoded text, otherwise the stored text unchanged |
/// | `set_item` | accessor `set` with a text value |
/// | `remove_item`, `keys`, `len`, `clear` | wrapped backend, untracked |
///
/// Do not wrap a `TrackedBackend` in another accessor-driven component with
/// the same accessor: every write would then be recorded twice.
pub struct TrackedBackend<B: Backend + ?Sized> {
    accessor: Arc<ChangeAwareAccessor>,
    inner: Arc<B>,
}

impl<B: Backend + ?Sized> TrackedBackend<B> {
    pub fn new(accessor: Arc<ChangeAwareAccessor>, inner: Arc<B>) -> Self {
        Self { accessor, inner }
    }

    /// The accessor that reads and writes are routed through.
    pub fn accessor(&self) -> &ChangeAwareAccessor {
        &self.accessor
    }

    /// The wrapped backend. Access through it is not tracked.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

impl<B: Backend + ?Sized> Clone for TrackedBackend<B> {
    fn clone(&self) -> Self {
        Self {
            accessor: Arc::clone(&self.accessor),
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Flatten an accessor failure into the backend error vocabulary.
fn to_backend_error(err: AccessorError) -> BackendError {
    match err {
        AccessorError::Access { source, .. }
        | AccessorError::Write { source, .. }
        | AccessorError::Remove { source, .. } => source,
        other => BackendError::Other(other.to_string()),
    }
}

impl<B: Backend + ?Sized> Backend for TrackedBackend<B> {
    fn get_item(&self, key: &str) -> BackendResult<Option<String>> {
        let read = self
            .accessor
            .get_with_text(&*self.inner, key)
            .map_err(to_backend_error)?;
        Ok(read.map(|(stored, value)| match value {
            Value::Text(text) => text,
            _ => stored,
        }))
    }

    fn set_item(&self, key: &str, value: &str) -> BackendResult<()> {
        self.accessor
            .set(&*self.inner, key, Value::text(value))
            .map_err(to_backend_error)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> BackendResult<()> {
        trace!(key, "pass-through removal");
        self.inner.remove_item(key)
    }

    fn keys(&self) -> BackendResult<Vec<String>> {
        self.inner.keys()
    }

    fn len(&self) -> BackendResult<usize> {
        self.inner.len()
    }

    fn clear(&self) -> BackendResult<()> {
        self.inner.clear()
    }
}

impl<B: Backend + ?Sized> std::fmt::Debug for TrackedBackend<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedBackend")
            .field("accessor", &self.accessor)
            .finish_non_exhaustive()
    }
}
