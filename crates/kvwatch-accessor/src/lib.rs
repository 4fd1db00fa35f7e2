//! The change-aware accessor: the heart of kvwatch.
//!
//! [`ChangeAwareAccessor`] wraps backend reads and writes. A successful write
//! records the replaced value in the [`HistoryLedger`] and then notifies the
//! [`ListenerRegistry`]. A failed write does neither.
//!
//! [`CapacityGuard`] probes the backend with a throwaway write before a
//! checked write, turning quota exhaustion into a recoverable `false`.
//!
//! Every operation comes in a direct form and a deferred (`async`) form. The
//! deferred form yields to the scheduler once and then runs the direct path,
//! so ordering of write, history and notification is identical.

pub mod accessor;
pub mod config;
pub mod error;
pub mod guard;

pub use accessor::{ChangeAwareAccessor, TrackedWrite};
pub use config::{WatchConfig, DEFAULT_PROBE_KEY, DEFAULT_PROBE_VALUE};
pub use error::{AccessorError, AccessorResult, CapacityError, ConfigError};
pub use guard::CapacityGuard;

pub use kvwatch_history::HistoryLedger;
pub use kvwatch_listeners::ListenerRegistry;
