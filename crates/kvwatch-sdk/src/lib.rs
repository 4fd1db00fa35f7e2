//! High-level API for kvwatch.
//!
//! [`KvWatch`] bundles a backend handle with a change-aware accessor and
//! exposes the whole surface in one place: tracked `get`/`set`, capacity
//! checked writes, batch operations, listener registration, history, and a
//! [`TrackedBackend`] decorator for code that only speaks [`Backend`].
//!
//! ```
//! use kvwatch_sdk::{KvWatch, Value, WatchConfig};
//!
//! let watch = KvWatch::in_memory(WatchConfig::default().with_history_size(2)).unwrap();
//! watch.add_change_listener("a", |new, old, key| {
//!     println!("{key}: {old:?} -> {new}");
//!     Ok(())
//! });
//!
//! watch.set("a", "1").unwrap();
//! watch.set("a", "2").unwrap();
//! watch.set("a", "3").unwrap();
//! assert_eq!(
//!     watch.get_history("a"),
//!     vec![Some(Value::text("2")), Some(Value::text("1"))]
//! );
//! ```

pub mod error;
pub mod watch;

pub use error::{KvWatchError, KvWatchResult};
pub use watch::KvWatch;

// Re-export key types
pub use kvwatch_accessor::{
    AccessorError, CapacityError, CapacityGuard, ChangeAwareAccessor, ConfigError, TrackedWrite,
    WatchConfig,
};
pub use kvwatch_backend::{Backend, BackendError, BackendResult, InMemoryBackend};
pub use kvwatch_batch::{BatchError, BatchOperations, BatchSetReport};
pub use kvwatch_history::HistoryEntry;
pub use kvwatch_listeners::{
    ChangeListener, ListenerError, ListenerFailure, ListenerFailurePolicy, ListenerResult,
    ListenerScope, NotifyReport, SharedListener,
};
pub use kvwatch_proxy::TrackedBackend;
pub use kvwatch_types::{ChangeEvent, Value, ValueEncoding};
