//! Adapter over decoded URL search parameters (`key=value` pairs).
//!
//! A record or map is the whole parameter set, one pair per field. A
//! top-level primitive lives under an envelope key (`_` unless configured).
//! Field values are text:
//!
//! - booleans are `true` / `false`, null is the empty string
//! - floats, bytes and dates use the same text forms as the JSON adapter
//! - lists, records and maps nested inside a field are JSON text
//!
//! When a key repeats, the first occurrence wins.
//!
//! Reading without a target type infers each field's shape from its text:
//! empty text is null, `true` / `false` are booleans, numbers and float
//! sentinels are floats, JSON arrays and objects are nested values and
//! anything else is a string. Strings that look like one of the other
//! shapes therefore do not survive such a read, and a parameter set whose
//! only key is the envelope key reads as the enveloped primitive.

use std::collections::HashSet;

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::json::{JsonReader, JsonWriter};
use crate::io::{
    date_to_text, float_to_text, hex_to_bytes, text_to_date, text_to_float, write_structural,
    BoxReader, KeyReader, ReadVisitor, Reader, Writer,
};
use crate::value::{Date, Value, ValueKind};

/// Envelope key used for top-level primitives.
pub const DEFAULT_PRIMITIVE_KEY: &str = "_";

/// A reader over a list of decoded parameters.
#[derive(Debug, Clone)]
pub struct SearchParamsReader {
    pairs: Vec<(String, String)>,
    primitive_key: String,
    trust_input: bool,
}

impl SearchParamsReader {
    pub fn new<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            primitive_key: DEFAULT_PRIMITIVE_KEY.to_string(),
            trust_input: false,
        }
    }

    /// Sets the envelope key of top-level primitives.
    pub fn with_primitive_key(mut self, key: impl Into<String>) -> Self {
        self.primitive_key = key.into();
        self
    }

    pub fn with_trust_input(mut self, trust: bool) -> Self {
        self.trust_input = trust;
        self
    }

    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn unique_pairs(&self) -> impl Iterator<Item = &(String, String)> + '_ {
        let mut seen = HashSet::new();
        self.pairs.iter().filter(move |(k, _)| seen.insert(k.as_str()))
    }

    fn primitive(&self, cx: &mut dyn Context, expected: ValueKind) -> CheckResult<FieldReader<'_>> {
        match self.get(&self.primitive_key) {
            Some(text) => Ok(FieldReader::new(text, self.trust_input)),
            None => Err(cx.write(Check::BaseType {
                expected,
                actual: Some(ValueKind::Record),
            })),
        }
    }
}

impl Reader for SearchParamsReader {
    fn trust_input(&self) -> bool {
        self.trust_input
    }

    fn read_any(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        let mut pairs = self.unique_pairs();
        match (pairs.next(), pairs.next()) {
            (Some((key, text)), None) if *key == self.primitive_key => {
                FieldReader::new(text, self.trust_input).read_any(cx, visitor)
            }
            _ => self.read_record(cx, visitor),
        }
    }

    fn read_boolean(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::Boolean)?
            .read_boolean(cx, visitor)
    }

    fn read_bytes(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::Bytes)?.read_bytes(cx, visitor)
    }

    fn read_date(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::Date)?.read_date(cx, visitor)
    }

    fn read_record(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        let trust = self.trust_input;
        let mut fields = self.unique_pairs().map(|(key, value)| {
            (
                Box::new(KeyReader::new(key, trust)) as BoxReader<'_>,
                Box::new(FieldReader::new(value, trust)) as BoxReader<'_>,
            )
        });
        visitor.from_map(cx, &mut fields)
    }

    fn read_float64(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::Float64)?
            .read_float64(cx, visitor)
    }

    fn read_list(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::List)?.read_list(cx, visitor)
    }

    fn read_map(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        let trust = self.trust_input;
        let mut entries = self.unique_pairs().map(|(key, value)| {
            let raw_key =
                serde_json::from_str(key).unwrap_or_else(|_| serde_json::Value::String(key.clone()));
            (
                Box::new(JsonReader::from_value(raw_key).with_trust_input(trust)) as BoxReader<'_>,
                Box::new(FieldReader::new(value, trust)) as BoxReader<'_>,
            )
        });
        visitor.from_map(cx, &mut entries)
    }

    fn read_null(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::Null)?.read_null(cx, visitor)
    }

    fn read_string(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::String)?
            .read_string(cx, visitor)
    }
}

/// A reader over the text of one parameter.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    text: &'a str,
    trust_input: bool,
}

impl<'a> FieldReader<'a> {
    pub fn new(text: &'a str, trust_input: bool) -> Self {
        Self { text, trust_input }
    }

    fn mismatch(&self, cx: &mut dyn Context, expected: ValueKind) -> CheckResult<Value> {
        Err(cx.write(Check::BaseType {
            expected,
            actual: Some(ValueKind::String),
        }))
    }

    /// Reads a nested structure carried as JSON text.
    fn nested(
        &self,
        cx: &mut dyn Context,
        expected: ValueKind,
        read: impl FnOnce(&JsonReader, &mut dyn Context) -> CheckResult<Value>,
    ) -> CheckResult<Value> {
        match JsonReader::parse(self.text) {
            Ok(reader) => read(&reader.with_trust_input(self.trust_input), cx),
            Err(error) => {
                log::trace!("field is not JSON text: {}", error);
                self.mismatch(cx, expected)
            }
        }
    }
}

impl Reader for FieldReader<'_> {
    fn trust_input(&self) -> bool {
        self.trust_input
    }

    fn read_any(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.text {
            "" => visitor.from_null(cx),
            "true" | "false" => self.read_boolean(cx, visitor),
            text if text.starts_with('[') || text.starts_with('{') => {
                match JsonReader::parse(text) {
                    Ok(reader) => reader
                        .with_trust_input(self.trust_input)
                        .read_any(cx, visitor),
                    Err(_) => visitor.from_string(cx, text.to_string()),
                }
            }
            text => match text_to_float(text) {
                Some(n) => visitor.from_float64(cx, n),
                None => visitor.from_string(cx, text.to_string()),
            },
        }
    }

    fn read_boolean(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.text {
            "true" => visitor.from_boolean(cx, true),
            "false" => visitor.from_boolean(cx, false),
            _ => self.mismatch(cx, ValueKind::Boolean),
        }
    }

    fn read_bytes(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match hex_to_bytes(self.text) {
            Some(bytes) => visitor.from_bytes(cx, bytes),
            None => self.mismatch(cx, ValueKind::Bytes),
        }
    }

    fn read_date(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match text_to_date(self.text) {
            Some(date) => visitor.from_date(cx, date),
            None => self.mismatch(cx, ValueKind::Date),
        }
    }

    fn read_record(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.nested(cx, ValueKind::Record, |reader, cx| {
            reader.read_record(cx, visitor)
        })
    }

    fn read_float64(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match text_to_float(self.text) {
            Some(n) => visitor.from_float64(cx, n),
            None => self.mismatch(cx, ValueKind::Float64),
        }
    }

    fn read_list(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.nested(cx, ValueKind::List, |reader, cx| reader.read_list(cx, visitor))
    }

    fn read_map(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.nested(cx, ValueKind::Map, |reader, cx| reader.read_map(cx, visitor))
    }

    fn read_null(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        if self.trust_input || self.text.is_empty() {
            visitor.from_null(cx)
        } else {
            self.mismatch(cx, ValueKind::Null)
        }
    }

    fn read_string(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        visitor.from_string(cx, self.text.to_string())
    }
}

/// A writer producing decoded parameters.
#[derive(Debug, Clone)]
pub struct SearchParamsWriter {
    pairs: Vec<(String, String)>,
    primitive_key: String,
}

impl Default for SearchParamsWriter {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            primitive_key: DEFAULT_PRIMITIVE_KEY.to_string(),
        }
    }
}

impl SearchParamsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primitive_key(mut self, key: impl Into<String>) -> Self {
        self.primitive_key = key.into();
        self
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    fn primitive(&mut self, write: impl FnOnce(&mut FieldWriter)) {
        let mut field = FieldWriter::default();
        write(&mut field);
        self.pairs = vec![(self.primitive_key.clone(), field.text)];
    }
}

impl Writer for SearchParamsWriter {
    fn write_any(&mut self, value: &Value) {
        write_structural(self, value);
    }

    fn write_boolean(&mut self, value: bool) {
        self.primitive(|w| w.write_boolean(value));
    }

    fn write_bytes(&mut self, value: &[u8]) {
        self.primitive(|w| w.write_bytes(value));
    }

    fn write_date(&mut self, value: Date) {
        self.primitive(|w| w.write_date(value));
    }

    fn write_record(&mut self, keys: &[String], handler: &mut dyn FnMut(&str, &mut dyn Writer)) {
        self.pairs = keys
            .iter()
            .map(|key| {
                let mut field = FieldWriter::default();
                handler(key.as_str(), &mut field);
                (key.clone(), field.text)
            })
            .collect();
    }

    fn write_float64(&mut self, value: f64) {
        self.primitive(|w| w.write_float64(value));
    }

    fn write_list(&mut self, size: usize, handler: &mut dyn FnMut(usize, &mut dyn Writer)) {
        self.primitive(|w| w.write_list(size, handler));
    }

    fn write_map(
        &mut self,
        size: usize,
        key_handler: &mut dyn FnMut(usize, &mut dyn Writer),
        value_handler: &mut dyn FnMut(usize, &mut dyn Writer),
    ) {
        self.pairs = (0..size)
            .map(|index| {
                let mut key = JsonWriter::new();
                key_handler(index, &mut key);
                let mut field = FieldWriter::default();
                value_handler(index, &mut field);
                (key.into_string(), field.text)
            })
            .collect();
    }

    fn write_null(&mut self) {
        self.primitive(|w| w.write_null());
    }

    fn write_string(&mut self, value: &str) {
        self.primitive(|w| w.write_string(value));
    }
}

/// A writer producing the text of one parameter.
#[derive(Debug, Default, Clone)]
pub struct FieldWriter {
    text: String,
}

impl FieldWriter {
    pub fn into_text(self) -> String {
        self.text
    }

    fn nested(&mut self, write: impl FnOnce(&mut JsonWriter)) {
        let mut json = JsonWriter::new();
        write(&mut json);
        self.text = json.into_string();
    }
}

impl Writer for FieldWriter {
    fn write_any(&mut self, value: &Value) {
        write_structural(self, value);
    }

    fn write_boolean(&mut self, value: bool) {
        self.text = value.to_string();
    }

    fn write_bytes(&mut self, value: &[u8]) {
        self.text = hex::encode(value);
    }

    fn write_date(&mut self, value: Date) {
        self.text = date_to_text(value);
    }

    fn write_record(&mut self, keys: &[String], handler: &mut dyn FnMut(&str, &mut dyn Writer)) {
        self.nested(|w| w.write_record(keys, handler));
    }

    fn write_float64(&mut self, value: f64) {
        self.text = float_to_text(value);
    }

    fn write_list(&mut self, size: usize, handler: &mut dyn FnMut(usize, &mut dyn Writer)) {
        self.nested(|w| w.write_list(size, handler));
    }

    fn write_map(
        &mut self,
        size: usize,
        key_handler: &mut dyn FnMut(usize, &mut dyn Writer),
        value_handler: &mut dyn FnMut(usize, &mut dyn Writer),
    ) {
        self.nested(|w| w.write_map(size, key_handler, value_handler));
    }

    fn write_null(&mut self) {
        self.text.clear();
    }

    fn write_string(&mut self, value: &str) {
        self.text = value.to_string();
    }
}
