use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A storable value.
///
/// The backend persists text only. How the non-text variants survive the
/// round trip depends on the [`ValueEncoding`] in use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Plain text.
    Text(String),
    /// A double-precision number.
    Number(f64),
    /// A boolean flag.
    Bool(bool),
    /// An ordered sequence of values.
    List(Vec<Value>),
    /// A string-keyed structured object.
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Shorthand for building a [`Value::Text`].
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Borrow the inner string if this is a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Bool(_) => "bool",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }

    /// The text this value is stored as under [`ValueEncoding::Raw`].
    ///
    /// Text is kept verbatim. Every other variant is written as JSON, with
    /// numbers rendered by [`Value::to_json`] at any nesting depth.
    pub fn to_storage_text(&self) -> Result<String, TypeError> {
        match self {
            Self::Text(s) => Ok(s.clone()),
            other => serde_json::to_string(&other.to_json())
                .map_err(|e| TypeError::Serialization(e.to_string())),
        }
    }

    /// Convert into a JSON tree.
    ///
    /// Integral numbers up to 2^53 in magnitude become JSON integers (`2`,
    /// never `2.0`). Other finite numbers use the shortest form that reads
    /// back to the same `f64`. NaN and the infinities become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => json_number(*n),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Largest magnitude below which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn json_number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT_INTEGER {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_storage_text() {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "<{}>", self.kind()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self::Object(map)
    }
}

/// How values are converted to and from backend text.
///
/// | Encoding | Write | Read |
/// |----------|-------|------|
/// | `Raw`  | text verbatim, others via [`Value::to_storage_text`] | always [`Value::Text`] |
/// | `Json` | every variant as JSON via [`Value::to_json`] | the original variant |
///
/// Both encodings render numbers the same way, so `Number(2.0)` is stored as
/// `2` whether it stands alone or sits inside a list or object.
///
/// `Raw` is lossy for everything except text: a number written as `42`
/// reads back as the text `"42"`. `Json` round-trips every variant except
/// non-finite numbers, which JSON cannot express. Both encodings write them
/// as `null`, and `Json` reads that back as the text `"null"`. Under `Json`, stored text
/// that is not valid JSON (written by someone else) reads back as raw text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueEncoding {
    #[default]
    Raw,
    Json,
}

impl ValueEncoding {
    /// Convert a value into the text handed to the backend.
    pub fn encode(&self, value: &Value) -> Result<String, TypeError> {
        match self {
            Self::Raw => value.to_storage_text(),
            Self::Json => serde_json::to_string(&value.to_json())
                .map_err(|e| TypeError::Serialization(e.to_string())),
        }
    }

    /// Convert backend text into a value. Never fails.
    pub fn decode(&self, text: String) -> Value {
        match self {
            Self::Raw => Value::Text(text),
            Self::Json => serde_json::from_str(&text).unwrap_or(Value::Text(text)),
        }
    }
}

impl fmt::Display for ValueEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Json => f.write_str("json"),
        }
    }
}
