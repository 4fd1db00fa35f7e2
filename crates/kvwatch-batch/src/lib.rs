//! Multi-key operations for kvwatch.
//!
//! [`BatchOperations`] runs one independent operation per key against an
//! explicit backend handle. All per-key operations are started together and
//! joined; one key failing never stops the others, and nothing is rolled
//! back. There is no atomicity across keys.
//!
//! - `set_multiple` goes through the capacity-checked, tracked write path.
//! - `get_multiple` goes through the tracked read path and keeps every
//!   requested key in its result, mapping missing keys to `None`.
//! - `remove_multiple` talks to the backend directly: removals are not
//!   changes, so they produce no history and no events.

pub mod batch;
pub mod error;

pub use batch::{BatchOperations, BatchSetReport};
pub use error::{BatchError, BatchResult};
