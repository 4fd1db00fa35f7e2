use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The record of one successful accessor-mediated write.
///
/// `old_value` is `None` when the key held nothing before the write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// The key that was written.
    pub key: String,
    /// The value now stored.
    pub new_value: Value,
    /// What the key held before the write.
    pub old_value: Option<Value>,
}

impl ChangeEvent {
    pub fn new(key: impl Into<String>, new_value: Value, old_value: Option<Value>) -> Self {
        Self {
            key: key.into(),
            new_value,
            old_value,
        }
    }

    /// Returns `true` if the key did not exist before this write.
    pub fn is_insert(&self) -> bool {
        self.old_value.is_none()
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.old_value {
            Some(old) => write!(f, "{}: {} -> {}", self.key, old, self.new_value),
            None => write!(f, "{}: <absent> -> {}", self.key, self.new_value),
        }
    }
}
