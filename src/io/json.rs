//! JSON adapter over `serde_json::Value`.
//!
//! Encoding rules:
//!
//! - floats are JSON numbers, except `NaN`, `±Infinity` and `-0` which are
//!   carried as the strings `"NaN"`, `"+Infinity"`, `"-Infinity"` and `"-0"`
//!   (`"Infinity"` is also accepted on read)
//! - bytes are lower-case hex strings
//! - dates are ISO-8601 strings such as `"1970-01-01T00:00:00.000Z"`
//! - records are objects; maps are objects whose keys are the JSON text of
//!   the encoded map keys
//! - lists and sets are arrays
//!
//! # Example
//!
//! ```rust
//! use kryo::io::json::{JsonReader, JsonWriter};
//! use kryo::io::Writer;
//! use kryo::types::{Float64Type, IoType};
//! use kryo::ReportContext;
//!
//! let ty = Float64Type::new();
//! let reader = JsonReader::parse("1.5").unwrap();
//! let value = ty.read(&mut ReportContext::new(), &reader).unwrap();
//!
//! let mut writer = JsonWriter::new();
//! ty.write(&mut writer, &value);
//! assert_eq!(writer.into_string(), "1.5");
//! ```

use serde_json::{Map, Number, Value as Json};

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::{
    date_to_text, float_sentinel, float_to_text, hex_to_bytes, text_to_date, write_structural,
    BoxReader, KeyReader, ReadVisitor, Reader, Writer,
};
use crate::value::{Date, Value, ValueKind, MAX_SAFE_INTEGER};

/// Shape of a raw JSON value, for base-type diagnostics.
fn json_kind(value: &Json) -> ValueKind {
    match value {
        Json::Null => ValueKind::Null,
        Json::Bool(_) => ValueKind::Boolean,
        Json::Number(_) => ValueKind::Float64,
        Json::String(_) => ValueKind::String,
        Json::Array(_) => ValueKind::List,
        Json::Object(_) => ValueKind::Record,
    }
}

/// A reader that owns its JSON document.
#[derive(Debug, Clone)]
pub struct JsonReader {
    value: Json,
    trust_input: bool,
}

impl JsonReader {
    /// Parses JSON text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self::from_value)
    }

    /// Wraps an already parsed document.
    pub fn from_value(value: Json) -> Self {
        Self {
            value,
            trust_input: false,
        }
    }

    /// Skips leaf re-validation of decoded primitives.
    pub fn with_trust_input(mut self, trust: bool) -> Self {
        self.trust_input = trust;
        self
    }

    fn borrowed(&self) -> JsonValueReader<'_> {
        JsonValueReader::new(&self.value, self.trust_input)
    }
}

delegate_reader!(JsonReader, self => self.borrowed());

/// A reader borrowing a node of a JSON document.
#[derive(Debug, Clone, Copy)]
pub struct JsonValueReader<'a> {
    value: &'a Json,
    trust_input: bool,
}

impl<'a> JsonValueReader<'a> {
    pub fn new(value: &'a Json, trust_input: bool) -> Self {
        Self { value, trust_input }
    }

    fn mismatch(&self, cx: &mut dyn Context, expected: ValueKind) -> CheckResult<Value> {
        Err(cx.write(Check::BaseType {
            expected,
            actual: Some(json_kind(self.value)),
        }))
    }

    fn fields<'s>(
        &'s self,
        object: &'s Map<String, Json>,
    ) -> impl Iterator<Item = (BoxReader<'s>, BoxReader<'s>)> + 's {
        let trust = self.trust_input;
        object.iter().map(move |(key, value)| {
            (
                Box::new(KeyReader::new(key, trust)) as BoxReader<'s>,
                Box::new(JsonValueReader::new(value, trust)) as BoxReader<'s>,
            )
        })
    }
}

impl Reader for JsonValueReader<'_> {
    fn trust_input(&self) -> bool {
        self.trust_input
    }

    fn read_any(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Json::Null => visitor.from_null(cx),
            Json::Bool(b) => visitor.from_boolean(cx, *b),
            Json::Number(_) => self.read_float64(cx, visitor),
            Json::String(s) => visitor.from_string(cx, s.clone()),
            Json::Array(_) => self.read_list(cx, visitor),
            Json::Object(_) => self.read_record(cx, visitor),
        }
    }

    fn read_boolean(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Json::Bool(b) => visitor.from_boolean(cx, *b),
            _ => self.mismatch(cx, ValueKind::Boolean),
        }
    }

    fn read_bytes(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value.as_str().and_then(hex_to_bytes) {
            Some(bytes) => visitor.from_bytes(cx, bytes),
            None => self.mismatch(cx, ValueKind::Bytes),
        }
    }

    fn read_date(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value.as_str().and_then(text_to_date) {
            Some(date) => visitor.from_date(cx, date),
            None => self.mismatch(cx, ValueKind::Date),
        }
    }

    fn read_record(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Json::Object(object) => visitor.from_map(cx, &mut self.fields(object)),
            _ => self.mismatch(cx, ValueKind::Record),
        }
    }

    fn read_float64(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        let number = match self.value {
            Json::Number(n) => n.as_f64(),
            Json::String(s) => float_sentinel(s),
            _ => None,
        };
        match number {
            Some(n) => visitor.from_float64(cx, n),
            None => self.mismatch(cx, ValueKind::Float64),
        }
    }

    fn read_list(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Json::Array(items) => {
                let trust = self.trust_input;
                let mut readers = items
                    .iter()
                    .map(|item| Box::new(JsonValueReader::new(item, trust)) as BoxReader<'_>);
                visitor.from_list(cx, &mut readers)
            }
            _ => self.mismatch(cx, ValueKind::List),
        }
    }

    fn read_map(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Json::Object(object) => {
                let trust = self.trust_input;
                // Keys that are not JSON text are taken as plain strings.
                let mut entries = object.iter().map(|(key, value)| {
                    let raw_key =
                        serde_json::from_str(key).unwrap_or_else(|_| Json::String(key.clone()));
                    (
                        Box::new(JsonReader::from_value(raw_key).with_trust_input(trust))
                            as BoxReader<'_>,
                        Box::new(JsonValueReader::new(value, trust)) as BoxReader<'_>,
                    )
                });
                visitor.from_map(cx, &mut entries)
            }
            _ => self.mismatch(cx, ValueKind::Map),
        }
    }

    fn read_null(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Json::Null => visitor.from_null(cx),
            _ => self.mismatch(cx, ValueKind::Null),
        }
    }

    fn read_string(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Json::String(s) => visitor.from_string(cx, s.clone()),
            _ => self.mismatch(cx, ValueKind::String),
        }
    }
}

/// Encodes a float as a JSON number or its string sentinel.
pub(crate) fn float_to_json(value: f64) -> Json {
    let negative_zero = value == 0.0 && value.is_sign_negative();
    if value.is_finite() && !negative_zero {
        if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
            return Json::from(value as i64);
        }
        if let Some(number) = Number::from_f64(value) {
            return Json::Number(number);
        }
    }
    Json::String(float_to_text(value))
}

/// A writer producing a `serde_json::Value`.
#[derive(Debug, Default)]
pub struct JsonWriter {
    value: Json,
}

impl JsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the written document (`null` if nothing was written).
    pub fn into_value(self) -> Json {
        self.value
    }

    /// Returns the written document as compact JSON text.
    pub fn into_string(self) -> String {
        self.value.to_string()
    }
}

impl Writer for JsonWriter {
    fn write_any(&mut self, value: &Value) {
        write_structural(self, value);
    }

    fn write_boolean(&mut self, value: bool) {
        self.value = Json::Bool(value);
    }

    fn write_bytes(&mut self, value: &[u8]) {
        self.value = Json::String(hex::encode(value));
    }

    fn write_date(&mut self, value: Date) {
        self.value = Json::String(date_to_text(value));
    }

    fn write_record(&mut self, keys: &[String], handler: &mut dyn FnMut(&str, &mut dyn Writer)) {
        let mut object = Map::new();
        for key in keys {
            let mut field = JsonWriter::new();
            handler(key.as_str(), &mut field);
            object.insert(key.clone(), field.into_value());
        }
        self.value = Json::Object(object);
    }

    fn write_float64(&mut self, value: f64) {
        self.value = float_to_json(value);
    }

    fn write_list(&mut self, size: usize, handler: &mut dyn FnMut(usize, &mut dyn Writer)) {
        let items = (0..size)
            .map(|index| {
                let mut item = JsonWriter::new();
                handler(index, &mut item);
                item.into_value()
            })
            .collect();
        self.value = Json::Array(items);
    }

    fn write_map(
        &mut self,
        size: usize,
        key_handler: &mut dyn FnMut(usize, &mut dyn Writer),
        value_handler: &mut dyn FnMut(usize, &mut dyn Writer),
    ) {
        let mut object = Map::new();
        for index in 0..size {
            let mut key = JsonWriter::new();
            key_handler(index, &mut key);
            let mut value = JsonWriter::new();
            value_handler(index, &mut value);
            object.insert(key.into_string(), value.into_value());
        }
        self.value = Json::Object(object);
    }

    fn write_null(&mut self) {
        self.value = Json::Null;
    }

    fn write_string(&mut self, value: &str) {
        self.value = Json::String(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ReportContext;
    use crate::io::AnyVisitor;
    use serde_json::json;

    fn read_any(text: &str) -> Value {
        let reader = JsonReader::parse(text).unwrap();
        reader
            .read_any(&mut ReportContext::new(), &AnyVisitor)
            .unwrap()
    }

    #[test]
    fn test_float_encoding() {
        assert_eq!(float_to_json(3.0), json!(3));
        assert_eq!(float_to_json(0.5), json!(0.5));
        assert_eq!(float_to_json(f64::NAN), json!("NaN"));
        assert_eq!(float_to_json(f64::INFINITY), json!("+Infinity"));
        assert_eq!(float_to_json(f64::NEG_INFINITY), json!("-Infinity"));
        assert_eq!(float_to_json(-0.0), json!("-0"));
    }

    #[test]
    fn test_read_float_sentinels() {
        let mut cx = ReportContext::new();
        for (text, expected) in [("\"Infinity\"", f64::INFINITY), ("\"-0\"", -0.0), ("2", 2.0)] {
            let reader = JsonReader::parse(text).unwrap();
            let value = reader.read_float64(&mut cx, &AnyVisitor).unwrap();
            assert_eq!(value, Value::Float64(expected));
        }
        let reader = JsonReader::parse("\"two\"").unwrap();
        assert!(reader.read_float64(&mut cx, &AnyVisitor).is_err());
    }

    #[test]
    fn test_mismatch_writes_base_type() {
        let mut cx = ReportContext::new();
        let reader = JsonReader::parse("[1]").unwrap();
        let id = reader.read_boolean(&mut cx, &AnyVisitor).unwrap_err();
        assert_eq!(
            cx.get(id),
            Some(&Check::BaseType {
                expected: ValueKind::Boolean,
                actual: Some(ValueKind::List)
            })
        );
    }

    #[test]
    fn test_read_any_structure() {
        let value = read_any(r#"{"a": [1, null, "x"], "b": true}"#);
        assert_eq!(
            value,
            Value::record([
                (
                    "a",
                    Value::List(vec![Value::from(1), Value::Null, Value::from("x")])
                ),
                ("b", Value::Boolean(true)),
            ])
        );
    }

    #[test]
    fn test_write_map_stringifies_keys() {
        let mut writer = JsonWriter::new();
        writer.write_any(&Value::Map(vec![(Value::from(1), Value::from("one"))]));
        assert_eq!(writer.into_value(), json!({"1": "one"}));
    }

    #[test]
    fn test_write_bytes_and_dates() {
        let mut writer = JsonWriter::new();
        writer.write_bytes(&[0xde, 0xad]);
        assert_eq!(writer.into_string(), "\"dead\"");

        let mut writer = JsonWriter::new();
        writer.write_date(Date::from_millis(0.0));
        assert_eq!(writer.into_value(), json!("1970-01-01T00:00:00.000Z"));
    }
}
