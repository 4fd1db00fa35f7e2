//! Transparent tracking for code written against [`Backend`].
//!
//! [`TrackedBackend`] wraps a backend and implements [`Backend`] itself.
//! Reads and writes are routed through a [`ChangeAwareAccessor`], so they
//! show up in history and reach listeners. Everything that is not a keyed
//! read or write passes straight through to the wrapped backend.
//!
//! Hand a `TrackedBackend` to code that only knows about `Backend` and that
//! code gets change tracking without being modified.
//!
//! [`Backend`]: kvwatch_backend::Backend
//! [`ChangeAwareAccessor`]: kvwatch_accessor::ChangeAwareAccessor

pub mod tracked;

pub use tracked::TrackedBackend;
