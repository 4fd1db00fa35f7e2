use std::num::NonZeroUsize;

use kvwatch_listeners::ListenerFailurePolicy;
use kvwatch_types::ValueEncoding;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Key written and removed by the capacity probe unless configured otherwise.
pub const DEFAULT_PROBE_KEY: &str = "__probe__";

/// Payload written by the capacity probe unless configured otherwise.
pub const DEFAULT_PROBE_VALUE: &str = "probe";

/// Configuration for a change-aware accessor.
///
/// Every field has a default, so a TOML document only needs the fields it
/// changes:
///
/// ```toml
/// history_size = 5
/// encoding = "json"
/// listener_failure = "abort"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Prior values retained per key. Must be at least 1.
    pub history_size: usize,
    /// How values are converted to backend text.
    pub encoding: ValueEncoding,
    /// What happens when a change listener fails.
    pub listener_failure: ListenerFailurePolicy,
    /// Reserved key used by the capacity probe.
    pub probe_key: String,
    /// Payload written by the capacity probe.
    pub probe_value: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            history_size: 1,
            encoding: ValueEncoding::default(),
            listener_failure: ListenerFailurePolicy::default(),
            probe_key: DEFAULT_PROBE_KEY.to_string(),
            probe_value: DEFAULT_PROBE_VALUE.to_string(),
        }
    }
}

impl WatchConfig {
    pub fn with_history_size(mut self, history_size: usize) -> Self {
        self.history_size = history_size;
        self
    }

    pub fn with_encoding(mut self, encoding: ValueEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_listener_failure(mut self, policy: ListenerFailurePolicy) -> Self {
        self.listener_failure = policy;
        self
    }

    /// Check field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.history_capacity()?;
        if self.probe_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "probe_key",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// `history_size` as a non-zero count.
    pub fn history_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.history_size).ok_or_else(|| ConfigError::Invalid {
            field: "history_size",
            reason: "must be a positive integer".into(),
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = WatchConfig::default();
        assert_eq!(c.history_size, 1);
        assert_eq!(c.encoding, ValueEncoding::Raw);
        assert_eq!(c.listener_failure, ListenerFailurePolicy::Isolate);
        assert_eq!(c.probe_key, "__probe__");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn builder_methods() {
        let c = WatchConfig::default()
            .with_history_size(4)
            .with_encoding(ValueEncoding::Json)
            .with_listener_failure(ListenerFailurePolicy::Abort);
        assert_eq!(c.history_capacity().unwrap().get(), 4);
        assert_eq!(c.encoding, ValueEncoding::Json);
        assert_eq!(c.listener_failure, ListenerFailurePolicy::Abort);
    }

    #[test]
    fn zero_history_is_rejected() {
        let err = WatchConfig::default().with_history_size(0).validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "history_size",
                ..
            }
        ));
    }

    #[test]
    fn empty_probe_key_is_rejected() {
        let c = WatchConfig {
            probe_key: String::new(),
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let c = WatchConfig::from_toml_str("history_size = 3\nencoding = \"json\"\n").unwrap();
        assert_eq!(c.history_size, 3);
        assert_eq!(c.encoding, ValueEncoding::Json);
        assert_eq!(c.probe_value, "probe");
    }

    #[test]
    fn toml_round_trip() {
        let c = WatchConfig::default().with_history_size(7);
        let text = c.to_toml_string().unwrap();
        assert_eq!(WatchConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn unknown_fields_and_bad_values_fail() {
        assert!(matches!(
            WatchConfig::from_toml_str("histroy_size = 2"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            WatchConfig::from_toml_str("history_size = 0"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
