//! Bounded value history for kvwatch.
//!
//! Every accessor-mediated write pushes the value it replaced onto a per-key
//! ring. Rings are created lazily, ordered newest first, and never grow past
//! the configured capacity: the oldest entry is dropped on overflow.
//!
//! The ledger has no failure modes. Asking for an untracked key yields an
//! empty history, and a poisoned lock is recovered rather than reported.

pub mod ledger;

pub use ledger::{HistoryEntry, HistoryLedger};
