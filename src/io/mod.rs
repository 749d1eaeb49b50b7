//! The read/write protocol between types and wire formats.
//!
//! A [`Reader`] is positioned on one raw input of some format. A type asks it
//! for the semantic primitive it expects (`read_float64`, `read_record`, ...)
//! and passes a [`ReadVisitor`]; the reader decodes the raw input and, if the
//! shape matches, calls back exactly one `from_*` method of the visitor. On a
//! shape mismatch the reader writes a `BaseType` check instead.
//!
//! Nested values are handed to visitors as boxed sub-readers, so a format may
//! switch representation below the root (query strings carry nested values as
//! JSON text).
//!
//! A [`Writer`] is the push-style dual. Composite writes take handlers that
//! receive a fresh sub-writer for each key, item or entry.

/// Implements [`Reader`] for a wrapper by forwarding every call to `$target`.
macro_rules! delegate_reader {
    ($ty:ty, $self:ident => $target:expr) => {
        impl $crate::io::Reader for $ty {
            fn trust_input(&$self) -> bool {
                $crate::io::Reader::trust_input(&$target)
            }

            delegate_reader!(@read $self, $target, read_any, read_boolean, read_bytes, read_date,
                read_record, read_float64, read_list, read_map, read_null, read_string);
        }
    };
    (@read $self:ident, $target:expr, $($method:ident),*) => {
        $(
            fn $method(
                &$self,
                cx: &mut dyn $crate::context::Context,
                visitor: &dyn $crate::io::ReadVisitor,
            ) -> $crate::context::CheckResult<$crate::value::Value> {
                $crate::io::Reader::$method(&$target, cx, visitor)
            }
        )*
    };
}

pub mod bson;
pub mod json;
pub mod qs;
pub mod search_params;

use chrono::{DateTime, SecondsFormat};

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::value::{Date, Value, ValueKind, MAX_SAFE_INTEGER};

/// A boxed reader over a nested raw value.
pub type BoxReader<'r> = Box<dyn Reader + 'r>;

/// Callbacks a reader invokes once it has decoded a semantic primitive.
///
/// Every callback defaults to rejecting its primitive with a `BaseType` check
/// naming [`expected`](ReadVisitor::expected).
pub trait ReadVisitor {
    /// The primitive this visitor accepts, used in default rejections.
    fn expected(&self) -> ValueKind;

    fn from_boolean(&self, cx: &mut dyn Context, _input: bool) -> CheckResult<Value> {
        Err(reject(cx, self.expected(), ValueKind::Boolean))
    }

    fn from_bytes(&self, cx: &mut dyn Context, _input: Vec<u8>) -> CheckResult<Value> {
        Err(reject(cx, self.expected(), ValueKind::Bytes))
    }

    fn from_date(&self, cx: &mut dyn Context, _input: Date) -> CheckResult<Value> {
        Err(reject(cx, self.expected(), ValueKind::Date))
    }

    fn from_float64(&self, cx: &mut dyn Context, _input: f64) -> CheckResult<Value> {
        Err(reject(cx, self.expected(), ValueKind::Float64))
    }

    fn from_list<'r>(
        &self,
        cx: &mut dyn Context,
        _items: &mut dyn Iterator<Item = BoxReader<'r>>,
    ) -> CheckResult<Value> {
        Err(reject(cx, self.expected(), ValueKind::List))
    }

    /// Receives map or record entries as `(key reader, value reader)` pairs.
    fn from_map<'r>(
        &self,
        cx: &mut dyn Context,
        _entries: &mut dyn Iterator<Item = (BoxReader<'r>, BoxReader<'r>)>,
    ) -> CheckResult<Value> {
        Err(reject(cx, self.expected(), ValueKind::Map))
    }

    fn from_null(&self, cx: &mut dyn Context) -> CheckResult<Value> {
        Err(reject(cx, self.expected(), ValueKind::Null))
    }

    fn from_string(&self, cx: &mut dyn Context, _input: String) -> CheckResult<Value> {
        Err(reject(cx, self.expected(), ValueKind::String))
    }
}

fn reject(cx: &mut dyn Context, expected: ValueKind, actual: ValueKind) -> crate::CheckId {
    cx.write(Check::BaseType {
        expected,
        actual: Some(actual),
    })
}

/// A format-specific decoder positioned on one raw input.
pub trait Reader {
    /// When true, leaf types accept decoded primitives without re-checking
    /// their own invariants. The reader is then responsible for correctness.
    fn trust_input(&self) -> bool;

    /// Decodes the raw input into whatever primitive its shape suggests.
    fn read_any(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value>;

    fn read_boolean(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor)
        -> CheckResult<Value>;

    fn read_bytes(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value>;

    fn read_date(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value>;

    /// Reads string-keyed fields; keys arrive as [`KeyReader`]s.
    fn read_record(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor)
        -> CheckResult<Value>;

    fn read_float64(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor)
        -> CheckResult<Value>;

    fn read_list(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value>;

    /// Reads an explicit map encoding whose keys carry their own raw values.
    fn read_map(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value>;

    fn read_null(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value>;

    fn read_string(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor)
        -> CheckResult<Value>;
}

/// A format-specific encoder.
pub trait Writer {
    /// Encodes a value by its own shape, without a type to direct it.
    fn write_any(&mut self, value: &Value);

    fn write_boolean(&mut self, value: bool);

    fn write_bytes(&mut self, value: &[u8]);

    fn write_date(&mut self, value: Date);

    /// Writes string-keyed fields; `handler` is called once per key.
    fn write_record(&mut self, keys: &[String], handler: &mut dyn FnMut(&str, &mut dyn Writer));

    fn write_float64(&mut self, value: f64);

    /// Writes `size` items; `handler` is called once per index.
    fn write_list(&mut self, size: usize, handler: &mut dyn FnMut(usize, &mut dyn Writer));

    /// Writes `size` entries whose keys are encoded by `key_handler`.
    fn write_map(
        &mut self,
        size: usize,
        key_handler: &mut dyn FnMut(usize, &mut dyn Writer),
        value_handler: &mut dyn FnMut(usize, &mut dyn Writer),
    );

    fn write_null(&mut self);

    fn write_string(&mut self, value: &str);
}

/// Encodes `value` through `writer` following the value's own shape.
///
/// Records become records, maps become explicit maps, sets are written as
/// lists.
pub fn write_structural(writer: &mut dyn Writer, value: &Value) {
    match value {
        Value::Null => writer.write_null(),
        Value::Boolean(b) => writer.write_boolean(*b),
        Value::Float64(n) => writer.write_float64(*n),
        Value::Bytes(bytes) => writer.write_bytes(bytes),
        Value::Date(date) => writer.write_date(*date),
        Value::String(s) => writer.write_string(s),
        Value::List(items) | Value::Set(items) => {
            writer.write_list(items.len(), &mut |i, w| write_structural(w, &items[i]))
        }
        Value::Map(entries) => writer.write_map(
            entries.len(),
            &mut |i, w| write_structural(w, &entries[i].0),
            &mut |i, w| write_structural(w, &entries[i].1),
        ),
        Value::Record(props) => {
            let keys: Vec<String> = props.keys().cloned().collect();
            writer.write_record(&keys, &mut |key, w| {
                if let Some(v) = props.get(key) {
                    write_structural(w, v);
                }
            })
        }
    }
}

/// A visitor that rebuilds a value from whatever primitive it receives.
///
/// Nested items are read recursively with `read_any`.
pub struct AnyVisitor;

impl ReadVisitor for AnyVisitor {
    fn expected(&self) -> ValueKind {
        ValueKind::Null
    }

    fn from_boolean(&self, _cx: &mut dyn Context, input: bool) -> CheckResult<Value> {
        Ok(Value::Boolean(input))
    }

    fn from_bytes(&self, _cx: &mut dyn Context, input: Vec<u8>) -> CheckResult<Value> {
        Ok(Value::Bytes(input))
    }

    fn from_date(&self, _cx: &mut dyn Context, input: Date) -> CheckResult<Value> {
        Ok(Value::Date(input))
    }

    fn from_float64(&self, _cx: &mut dyn Context, input: f64) -> CheckResult<Value> {
        Ok(Value::Float64(input))
    }

    fn from_list<'r>(
        &self,
        cx: &mut dyn Context,
        items: &mut dyn Iterator<Item = BoxReader<'r>>,
    ) -> CheckResult<Value> {
        let mut values = Vec::new();
        for (index, item) in items.enumerate() {
            values.push(cx.enter(index, |cx| item.read_any(cx, self))?);
        }
        Ok(Value::List(values))
    }

    fn from_map<'r>(
        &self,
        cx: &mut dyn Context,
        entries: &mut dyn Iterator<Item = (BoxReader<'r>, BoxReader<'r>)>,
    ) -> CheckResult<Value> {
        let mut props = indexmap::IndexMap::new();
        for (key, value) in entries {
            let key = read_key(cx, key.as_ref())?;
            let value = cx.enter(key.as_str(), |cx| value.read_any(cx, self))?;
            props.insert(key, value);
        }
        Ok(Value::Record(props))
    }

    fn from_null(&self, _cx: &mut dyn Context) -> CheckResult<Value> {
        Ok(Value::Null)
    }

    fn from_string(&self, _cx: &mut dyn Context, input: String) -> CheckResult<Value> {
        Ok(Value::String(input))
    }
}

struct KeyVisitor;

impl ReadVisitor for KeyVisitor {
    fn expected(&self) -> ValueKind {
        ValueKind::String
    }

    fn from_string(&self, _cx: &mut dyn Context, input: String) -> CheckResult<Value> {
        Ok(Value::String(input))
    }
}

/// Reads a record key as a plain string.
pub fn read_key(cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<String> {
    match reader.read_string(cx, &KeyVisitor)? {
        Value::String(key) => Ok(key),
        other => Err(cx.write(Check::BaseType {
            expected: ValueKind::String,
            actual: Some(other.kind()),
        })),
    }
}

/// A reader over a record field name.
///
/// Only `read_string` and `read_any` succeed; a key is never another shape.
pub struct KeyReader<'a> {
    key: &'a str,
    trust_input: bool,
}

impl<'a> KeyReader<'a> {
    pub fn new(key: &'a str, trust_input: bool) -> Self {
        Self { key, trust_input }
    }

    fn mismatch(&self, cx: &mut dyn Context, expected: ValueKind) -> CheckResult<Value> {
        Err(reject(cx, expected, ValueKind::String))
    }
}

impl Reader for KeyReader<'_> {
    fn trust_input(&self) -> bool {
        self.trust_input
    }

    fn read_any(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        visitor.from_string(cx, self.key.to_string())
    }

    fn read_boolean(&self, cx: &mut dyn Context, _: &dyn ReadVisitor) -> CheckResult<Value> {
        self.mismatch(cx, ValueKind::Boolean)
    }

    fn read_bytes(&self, cx: &mut dyn Context, _: &dyn ReadVisitor) -> CheckResult<Value> {
        self.mismatch(cx, ValueKind::Bytes)
    }

    fn read_date(&self, cx: &mut dyn Context, _: &dyn ReadVisitor) -> CheckResult<Value> {
        self.mismatch(cx, ValueKind::Date)
    }

    fn read_record(&self, cx: &mut dyn Context, _: &dyn ReadVisitor) -> CheckResult<Value> {
        self.mismatch(cx, ValueKind::Record)
    }

    fn read_float64(&self, cx: &mut dyn Context, _: &dyn ReadVisitor) -> CheckResult<Value> {
        self.mismatch(cx, ValueKind::Float64)
    }

    fn read_list(&self, cx: &mut dyn Context, _: &dyn ReadVisitor) -> CheckResult<Value> {
        self.mismatch(cx, ValueKind::List)
    }

    fn read_map(&self, cx: &mut dyn Context, _: &dyn ReadVisitor) -> CheckResult<Value> {
        self.mismatch(cx, ValueKind::Map)
    }

    fn read_null(&self, cx: &mut dyn Context, _: &dyn ReadVisitor) -> CheckResult<Value> {
        self.mismatch(cx, ValueKind::Null)
    }

    fn read_string(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        visitor.from_string(cx, self.key.to_string())
    }
}

// Text encodings shared by the JSON and query-string adapters.

/// Renders a float, using string sentinels for values JSON cannot carry.
pub(crate) fn float_to_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value == 0.0 && value.is_sign_negative() {
        "-0".to_string()
    } else if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Parses a float sentinel (`NaN`, `Infinity`, `+Infinity`, `-Infinity`, `-0`).
pub(crate) fn float_sentinel(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        "-0" => Some(-0.0),
        _ => None,
    }
}

/// Parses a JSON number or a float sentinel.
pub(crate) fn text_to_float(text: &str) -> Option<f64> {
    float_sentinel(text).or_else(|| {
        serde_json::from_str::<serde_json::Number>(text)
            .ok()
            .and_then(|n| n.as_f64())
    })
}

/// Decodes lower-case hex (`^([0-9a-f]{2})*$`).
pub(crate) fn hex_to_bytes(text: &str) -> Option<Vec<u8>> {
    let well_formed = text.len() % 2 == 0
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if well_formed {
        hex::decode(text).ok()
    } else {
        None
    }
}

/// Renders a date as an ISO-8601 UTC timestamp with millisecond precision.
pub(crate) fn date_to_text(date: Date) -> String {
    DateTime::from_timestamp_millis(date.millis() as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| "Invalid Date".to_string())
}

/// Parses an RFC 3339 timestamp.
pub(crate) fn text_to_date(text: &str) -> Option<Date> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| Date::from_millis(dt.timestamp_millis() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ReportContext;

    #[test]
    fn test_float_text_round_trip() {
        for value in [0.0, 1.5, -3.0, 1e21, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(text_to_float(&float_to_text(value)), Some(value));
        }
        assert!(text_to_float("NaN").unwrap().is_nan());
        let neg_zero = text_to_float(&float_to_text(-0.0)).unwrap();
        assert!(neg_zero == 0.0 && neg_zero.is_sign_negative());
        assert_eq!(float_to_text(42.0), "42");
        assert_eq!(text_to_float("Infinity"), Some(f64::INFINITY));
        assert_eq!(text_to_float("inf"), None);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex_to_bytes("0aff"), Some(vec![0x0a, 0xff]));
        assert_eq!(hex_to_bytes(""), Some(vec![]));
        assert_eq!(hex_to_bytes("0AFF"), None);
        assert_eq!(hex_to_bytes("abc"), None);
    }

    #[test]
    fn test_date_text() {
        let epoch = Date::from_millis(0.0);
        assert_eq!(date_to_text(epoch), "1970-01-01T00:00:00.000Z");
        assert_eq!(text_to_date("1970-01-01T00:00:00.000Z"), Some(epoch));
        assert_eq!(text_to_date("yesterday"), None);
    }

    #[test]
    fn test_key_reader_only_reads_strings() {
        let mut cx = ReportContext::new();
        let reader = KeyReader::new("name", false);
        assert_eq!(read_key(&mut cx, &reader).unwrap(), "name");
        assert!(reader.read_float64(&mut cx, &AnyVisitor).is_err());
        assert_eq!(cx.len(), 1);
    }
}
