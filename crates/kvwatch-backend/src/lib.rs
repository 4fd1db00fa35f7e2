//! Backend contract for kvwatch.
//!
//! kvwatch never persists anything itself. It wraps an external string-keyed
//! store that behaves like browser local storage: synchronous `get`/`set`/
//! `remove` on text values, where a `set` may fail because the store is full.
//!
//! # Storage Backends
//!
//! All backends implement the [`Backend`] trait:
//!
//! - [`InMemoryBackend`] -- `HashMap`-based store with an optional byte quota,
//!   for tests and embedding
//!
//! # Design Rules
//!
//! 1. Keys and values are text. Typed values are a concern of higher layers.
//! 2. A missing key is `Ok(None)`, never an error.
//! 3. The backend serializes its own operations; callers add no locking.
//! 4. Capacity exhaustion is reported as [`BackendError::QuotaExceeded`].

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{BackendError, BackendResult};
pub use memory::InMemoryBackend;
pub use traits::Backend;
