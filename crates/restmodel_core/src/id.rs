//! Model identifiers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque identifier assigned by the server.
///
/// Numbers and strings are both common in REST payloads, so both are kept
/// verbatim. The identifier only needs to round-trip into URLs and back into
/// JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelId {
    /// Integer identifier.
    Int(i64),
    /// String identifier (UUIDs, slugs, large or fractional numbers).
    Str(String),
}

impl ModelId {
    /// Extracts an identifier from a payload value.
    ///
    /// `null`, objects and arrays carry no identifier.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => ModelId::Int(i),
                None => ModelId::Str(n.to_string()),
            }),
            Value::String(s) => Some(ModelId::Str(s.clone())),
            Value::Bool(b) => Some(ModelId::Str(b.to_string())),
            Value::Null | Value::Object(_) | Value::Array(_) => None,
        }
    }

    /// Converts the identifier back into a JSON value.
    pub fn to_value(&self) -> Value {
        match self {
            ModelId::Int(i) => Value::from(*i),
            ModelId::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelId::Int(i) => write!(f, "{i}"),
            ModelId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ModelId {
    fn from(id: i64) -> Self {
        ModelId::Int(id)
    }
}

impl From<i32> for ModelId {
    fn from(id: i32) -> Self {
        ModelId::Int(i64::from(id))
    }
}

impl From<u32> for ModelId {
    fn from(id: u32) -> Self {
        ModelId::Int(i64::from(id))
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        ModelId::Str(id.to_string())
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        ModelId::Str(id)
    }
}
