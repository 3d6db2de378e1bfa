use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value as JsonValue};

/// Bound on chained lazy resolution so a lazy value that keeps returning
/// another lazy value cannot loop forever.
const MAX_LAZY_RESOLUTIONS: usize = 100;

/// A single key/value attribute attached to a handler or to a record.
#[derive(Debug, Clone)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Attribute holding a nested group; renders as a nested JSON object.
    pub fn group(key: impl Into<String>, members: Vec<Attr>) -> Self {
        Attr {
            key: key.into(),
            value: Value::Group(members),
        }
    }

    /// Attribute whose value is computed only when a record carrying it
    /// is actually rendered.
    pub fn lazy(
        key: impl Into<String>,
        resolve: impl Fn() -> Value + Send + Sync + 'static,
    ) -> Self {
        Attr {
            key: key.into(),
            value: Value::Lazy(Arc::new(resolve)),
        }
    }
}

/// Closed set of attribute value shapes.
///
/// Every variant has an explicit JSON conversion, which keeps rendering
/// exhaustive and infallible; there is no dynamic catch-all.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    /// Renders as canonical duration text, e.g. `"1.5s"`, `"500ms"`.
    Duration(Duration),
    /// Renders as an RFC 3339 timestamp with nanosecond precision.
    Timestamp(DateTime<Utc>),
    /// Nested group of attributes; renders as a nested object. An empty
    /// group carries no information and is elided from output.
    Group(Vec<Attr>),
    /// Deferred value, resolved once per rendered record.
    Lazy(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl Value {
    /// Convert to a JSON value, or `None` when the value carries no
    /// information (an empty group, possibly behind a lazy) and must not
    /// appear in output.
    pub(crate) fn to_json(&self) -> Option<JsonValue> {
        self.to_json_bounded(MAX_LAZY_RESOLUTIONS)
    }

    fn to_json_bounded(&self, lazy_budget: usize) -> Option<JsonValue> {
        match self {
            Value::Bool(v) => Some(JsonValue::Bool(*v)),
            Value::Int(v) => Some(JsonValue::from(*v)),
            Value::Uint(v) => Some(JsonValue::from(*v)),
            Value::Float(v) if v.is_finite() => Some(JsonValue::from(*v)),
            // JSON has no encoding for NaN or the infinities; fall back
            // to their textual form instead of failing the record.
            Value::Float(v) => Some(JsonValue::String(v.to_string())),
            Value::Str(v) => Some(JsonValue::String(v.clone())),
            Value::Duration(v) => Some(JsonValue::String(format!("{:?}", v))),
            Value::Timestamp(v) => Some(JsonValue::String(
                v.to_rfc3339_opts(SecondsFormat::Nanos, true),
            )),
            Value::Group(members) => {
                let mut object = Map::new();
                for member in members {
                    if let Some(converted) = member.value.to_json_bounded(lazy_budget) {
                        object.insert(member.key.clone(), converted);
                    }
                }
                if object.is_empty() {
                    None
                } else {
                    Some(JsonValue::Object(object))
                }
            }
            Value::Lazy(resolve) => {
                if lazy_budget == 0 {
                    return Some(JsonValue::String("<unresolved lazy value>".to_string()));
                }
                resolve().to_json_bounded(lazy_budget - 1)
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Uint(v) => f.debug_tuple("Uint").field(v).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Value::Duration(v) => f.debug_tuple("Duration").field(v).finish(),
            Value::Timestamp(v) => f.debug_tuple("Timestamp").field(v).finish(),
            Value::Group(v) => f.debug_tuple("Group").field(v).finish(),
            Value::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}
