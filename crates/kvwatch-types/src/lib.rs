//! Foundation types for kvwatch.
//!
//! Every other kvwatch crate depends on `kvwatch-types`. The backend only
//! stores text, so this crate also owns the rules for turning a typed
//! [`Value`] into storage text and back.
//!
//! # Key Types
//!
//! - [`Value`]: closed set of storable kinds (text, number, bool, list, object)
//! - [`ValueEncoding`]: how a [`Value`] crosses the text-only backend boundary
//! - [`ChangeEvent`]: the record of one successful mediated write
//!
//! Absence is always `Option::None`. An empty string is a real value and is
//! never used to mean "never written".

pub mod error;
pub mod event;
pub mod value;

pub use error::TypeError;
pub use event::ChangeEvent;
pub use value::{Value, ValueEncoding};
