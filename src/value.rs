//! The dynamic value domain described by kryo types.
//!
//! Every type tests, reads and writes [`Value`]s. The enum is closed: readers
//! decode raw input into one of these shapes and writers encode them back.

use std::fmt::{self, Display};

use indexmap::IndexMap;

/// Largest integer a 64-bit float represents exactly (`2^53 - 1`).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Smallest integer a 64-bit float represents exactly (`-(2^53 - 1)`).
pub const MIN_SAFE_INTEGER: f64 = -9_007_199_254_740_991.0;

/// A point in time, stored as milliseconds since the Unix epoch.
///
/// The wrapped value may be non-finite or out of range; `DateType` is what
/// decides whether a `Date` is valid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Date(f64);

impl Date {
    /// Creates a date from epoch milliseconds.
    pub fn from_millis(millis: f64) -> Self {
        Self(millis)
    }

    /// Returns the epoch milliseconds of this date.
    pub fn millis(self) -> f64 {
        self.0
    }

    /// Returns true if the timestamp is finite and within the safe-integer span.
    pub fn is_valid(self) -> bool {
        self.0.is_finite() && (MIN_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&self.0)
    }
}

/// A dynamically shaped value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Float64(f64),
    Bytes(Vec<u8>),
    Date(Date),
    String(String),
    List(Vec<Value>),
    /// Set items; order carries no meaning.
    Set(Vec<Value>),
    /// Map entries in insertion order.
    Map(Vec<(Value, Value)>),
    /// Record properties keyed by property name (not serialized key).
    Record(IndexMap<String, Value>),
}

/// The shape of a [`Value`], used in base-type diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Boolean,
    Float64,
    Bytes,
    Date,
    String,
    List,
    Set,
    Map,
    Record,
}

impl Value {
    /// Returns the shape of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Float64(_) => ValueKind::Float64,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Date(_) => ValueKind::Date,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Record(_) => ValueKind::Record,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Builds a record value from `(property, value)` pairs.
    pub fn record<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Record(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float64(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Float64(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Float64(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<Date> for Value {
    fn from(value: Date) -> Self {
        Value::Date(value)
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "Null",
            ValueKind::Boolean => "Boolean",
            ValueKind::Float64 => "Float64",
            ValueKind::Bytes => "Bytes",
            ValueKind::Date => "Date",
            ValueKind::String => "String",
            ValueKind::List => "List",
            ValueKind::Set => "Set",
            ValueKind::Map => "Map",
            ValueKind::Record => "Record",
        };
        f.write_str(name)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Float64(n) => write!(f, "{}", n),
            Value::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Value::Date(d) => write!(f, "Date({})", d.millis()),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) | Value::Set(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} => {}", k, v)?;
                }
                f.write_str("}")
            }
            Value::Record(props) => {
                f.write_str("{")?;
                for (i, (k, v)) in props.iter().enumerate() {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_validity() {
        assert!(Date::from_millis(0.0).is_valid());
        assert!(Date::from_millis(MAX_SAFE_INTEGER).is_valid());
        assert!(!Date::from_millis(MAX_SAFE_INTEGER + 2.0).is_valid());
        assert!(!Date::from_millis(f64::NAN).is_valid());
        assert!(!Date::from_millis(f64::INFINITY).is_valid());
    }

    #[test]
    fn test_record_builder_keeps_order() {
        let value = Value::record([("b", Value::from(1)), ("a", Value::from(2))]);
        let keys: Vec<_> = value.as_record().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("hi").to_string(), "\"hi\"");
        assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_string(), "0xab01");
        assert_eq!(
            Value::List(vec![Value::from(1), Value::Null]).to_string(),
            "[1, null]"
        );
    }
}
