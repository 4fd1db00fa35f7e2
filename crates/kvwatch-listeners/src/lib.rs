//! Change listener registry for kvwatch.
//!
//! Listeners observe accessor-mediated writes. Each change is delivered
//! synchronously, first to the listeners registered for the written key and
//! then to the global listeners, each group in registration order.
//!
//! A listener reports failure by returning a [`ListenerError`]. What happens
//! next is governed by [`ListenerFailurePolicy`]: by default the failure is
//! logged and delivery continues, so one faulty observer cannot starve the
//! others.

pub mod error;
pub mod listener;
pub mod registry;

pub use error::{ListenerError, ListenerResult, NotifyError};
pub use listener::{ChangeListener, ListenerFailurePolicy, ListenerScope, SharedListener};
pub use registry::{ListenerFailure, ListenerRegistry, NotifyReport};
