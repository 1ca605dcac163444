//! The Value type - what a bin holds.
//!
//! A record is a flat map from bin name to `Value`. Values themselves may be
//! nested (lists and maps), which is how structured domain fields are stored.

use std::collections::BTreeMap;
use std::fmt;

/// A record's bins: bin name to value.
///
/// `BTreeMap` keeps bin order deterministic, which keeps encoded records and
/// test assertions stable.
pub type Bins = BTreeMap<String, Value>;

/// A value stored in a bin.
///
/// # Design Notes
///
/// - Uses `i64` for integers, matching the store's native integer bins
/// - `Bytes` is a first-class blob type (the serde bridge carries it as base64)
/// - `Map` uses `BTreeMap` for deterministic ordering
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absence of a value. Writing `Null` to a bin removes the bin.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Binary blob.
    Bytes(Vec<u8>),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Map with string keys.
    Map(BTreeMap<String, Value>),
}

/// Coarse shape of a value.
///
/// Used to describe script function signatures and to check arguments
/// against them. `Numeric` covers both integers and floats, `Any` accepts
/// every kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Nil,
    Boolean,
    Numeric,
    String,
    Bytes,
    List,
    Map,
    Any,
}

impl ValueKind {
    /// Whether a value of kind `actual` may be passed where `self` is declared.
    pub fn accepts(self, actual: ValueKind) -> bool {
        self == ValueKind::Any || self == actual
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Nil => "nil",
            ValueKind::Boolean => "boolean",
            ValueKind::Numeric => "numeric",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::List => "list",
            ValueKind::Map => "map",
            ValueKind::Any => "any",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create an empty list.
    pub fn list() -> Self {
        Value::List(Vec::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The coarse kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Nil,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Integer(_) | Value::Float(_) => ValueKind::Numeric,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Bins> for Value {
    fn from(v: Bins) -> Self {
        Value::Map(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_coarse() {
        assert_eq!(Value::Integer(1).kind(), ValueKind::Numeric);
        assert_eq!(Value::Float(1.5).kind(), ValueKind::Numeric);
        assert_eq!(Value::from("a").kind(), ValueKind::String);
        assert_eq!(Value::Null.kind(), ValueKind::Nil);
        assert_eq!(Value::map().kind(), ValueKind::Map);
    }

    #[test]
    fn any_accepts_everything() {
        assert!(ValueKind::Any.accepts(ValueKind::Bytes));
        assert!(ValueKind::Numeric.accepts(ValueKind::Numeric));
        assert!(!ValueKind::Numeric.accepts(ValueKind::String));
    }

    #[test]
    fn display_nested() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::List(vec![Value::from(1i64), Value::Null]));
        assert_eq!(Value::Map(map).to_string(), "{a: [1, nil]}");
    }
}
