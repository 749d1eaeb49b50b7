//! BSON adapter.
//!
//! Floats, booleans, strings, nulls, binary data and dates use their native
//! BSON elements; 32 and 64-bit integers are accepted as floats on read.
//! A BSON document must be a document, so a top-level value that is not a
//! record or map is wrapped as `{ "_": value }` (the key is configurable).
//! Reading without a target type unwraps that envelope, so a record whose
//! only key is the envelope key reads back as its field value.
//! Map keys are stored as the JSON text of the encoded key.

use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document};

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::json::{JsonReader, JsonWriter};
use crate::io::search_params::DEFAULT_PRIMITIVE_KEY;
use crate::io::{write_structural, BoxReader, KeyReader, ReadVisitor, Reader, Writer};
use crate::value::{Date, Value, ValueKind};

fn bson_kind(value: &Bson) -> Option<ValueKind> {
    match value {
        Bson::Null => Some(ValueKind::Null),
        Bson::Boolean(_) => Some(ValueKind::Boolean),
        Bson::Double(_) | Bson::Int32(_) | Bson::Int64(_) => Some(ValueKind::Float64),
        Bson::String(_) => Some(ValueKind::String),
        Bson::Binary(_) => Some(ValueKind::Bytes),
        Bson::DateTime(_) => Some(ValueKind::Date),
        Bson::Array(_) => Some(ValueKind::List),
        Bson::Document(_) => Some(ValueKind::Record),
        _ => None,
    }
}

/// A reader over a decoded BSON document.
#[derive(Debug, Clone)]
pub struct BsonReader {
    root: Bson,
    primitive_key: String,
    trust_input: bool,
}

impl BsonReader {
    /// Decodes a serialized document.
    pub fn parse(mut bytes: &[u8]) -> Result<Self, bson::de::Error> {
        Document::from_reader(&mut bytes).map(Self::from_document)
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            root: Bson::Document(document),
            primitive_key: DEFAULT_PRIMITIVE_KEY.to_string(),
            trust_input: false,
        }
    }

    pub fn with_primitive_key(mut self, key: impl Into<String>) -> Self {
        self.primitive_key = key.into();
        self
    }

    pub fn with_trust_input(mut self, trust: bool) -> Self {
        self.trust_input = trust;
        self
    }

    fn document(&self) -> BsonValueReader<'_> {
        BsonValueReader::new(&self.root, self.trust_input)
    }

    /// Unwraps the envelope of a top-level primitive.
    fn primitive(&self, cx: &mut dyn Context, expected: ValueKind) -> CheckResult<BsonValueReader<'_>> {
        let inner = match &self.root {
            Bson::Document(document) => document.get(&self.primitive_key),
            _ => None,
        };
        match inner {
            Some(value) => Ok(BsonValueReader::new(value, self.trust_input)),
            None => Err(cx.write(Check::BaseType {
                expected,
                actual: bson_kind(&self.root),
            })),
        }
    }
}

impl Reader for BsonReader {
    fn trust_input(&self) -> bool {
        self.trust_input
    }

    /// A document whose only key is the primitive key is read as the
    /// enveloped value, so a record with just that key is ambiguous here.
    fn read_any(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        let enveloped = match &self.root {
            Bson::Document(document) if document.len() == 1 => document.get(&self.primitive_key),
            _ => None,
        };
        match enveloped {
            Some(inner) => BsonValueReader::new(inner, self.trust_input).read_any(cx, visitor),
            None => self.document().read_any(cx, visitor),
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
        self.document().read_record(cx, visitor)
    }

    fn read_float64(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::Float64)?
            .read_float64(cx, visitor)
    }

    fn read_list(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::List)?.read_list(cx, visitor)
    }

    fn read_map(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.document().read_map(cx, visitor)
    }

    fn read_null(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::Null)?.read_null(cx, visitor)
    }

    fn read_string(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        self.primitive(cx, ValueKind::String)?
            .read_string(cx, visitor)
    }
}

/// A reader borrowing one BSON element.
#[derive(Debug, Clone, Copy)]
pub struct BsonValueReader<'a> {
    value: &'a Bson,
    trust_input: bool,
}

impl<'a> BsonValueReader<'a> {
    pub fn new(value: &'a Bson, trust_input: bool) -> Self {
        Self { value, trust_input }
    }

    fn mismatch(&self, cx: &mut dyn Context, expected: ValueKind) -> CheckResult<Value> {
        Err(cx.write(Check::BaseType {
            expected,
            actual: bson_kind(self.value),
        }))
    }
}

impl Reader for BsonValueReader<'_> {
    fn trust_input(&self) -> bool {
        self.trust_input
    }

    fn read_any(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::Null => visitor.from_null(cx),
            Bson::Boolean(b) => visitor.from_boolean(cx, *b),
            Bson::String(s) => visitor.from_string(cx, s.clone()),
            Bson::Double(_) | Bson::Int32(_) | Bson::Int64(_) => self.read_float64(cx, visitor),
            Bson::Binary(_) => self.read_bytes(cx, visitor),
            Bson::DateTime(_) => self.read_date(cx, visitor),
            Bson::Array(_) => self.read_list(cx, visitor),
            Bson::Document(_) => self.read_record(cx, visitor),
            _ => Err(cx.write(Check::InstanceOf {
                class: "supported BSON element",
            })),
        }
    }

    fn read_boolean(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::Boolean(b) => visitor.from_boolean(cx, *b),
            _ => self.mismatch(cx, ValueKind::Boolean),
        }
    }

    fn read_bytes(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::Binary(binary) => visitor.from_bytes(cx, binary.bytes.clone()),
            _ => self.mismatch(cx, ValueKind::Bytes),
        }
    }

    fn read_date(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::DateTime(dt) => {
                visitor.from_date(cx, Date::from_millis(dt.timestamp_millis() as f64))
            }
            _ => self.mismatch(cx, ValueKind::Date),
        }
    }

    fn read_record(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::Document(document) => {
                let trust = self.trust_input;
                let mut fields = document.iter().map(|(key, value)| {
                    (
                        Box::new(KeyReader::new(key, trust)) as BoxReader<'_>,
                        Box::new(BsonValueReader::new(value, trust)) as BoxReader<'_>,
                    )
                });
                visitor.from_map(cx, &mut fields)
            }
            _ => self.mismatch(cx, ValueKind::Record),
        }
    }

    fn read_float64(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::Double(n) => visitor.from_float64(cx, *n),
            Bson::Int32(n) => visitor.from_float64(cx, f64::from(*n)),
            Bson::Int64(n) => visitor.from_float64(cx, *n as f64),
            _ => self.mismatch(cx, ValueKind::Float64),
        }
    }

    fn read_list(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::Array(items) => {
                let trust = self.trust_input;
                let mut readers = items
                    .iter()
                    .map(|item| Box::new(BsonValueReader::new(item, trust)) as BoxReader<'_>);
                visitor.from_list(cx, &mut readers)
            }
            _ => self.mismatch(cx, ValueKind::List),
        }
    }

    fn read_map(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::Document(document) => {
                let trust = self.trust_input;
                let mut entries = document.iter().map(|(key, value)| {
                    let raw_key = serde_json::from_str(key)
                        .unwrap_or_else(|_| serde_json::Value::String(key.clone()));
                    (
                        Box::new(JsonReader::from_value(raw_key).with_trust_input(trust))
                            as BoxReader<'_>,
                        Box::new(BsonValueReader::new(value, trust)) as BoxReader<'_>,
                    )
                });
                visitor.from_map(cx, &mut entries)
            }
            _ => self.mismatch(cx, ValueKind::Map),
        }
    }

    fn read_null(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::Null => visitor.from_null(cx),
            _ => self.mismatch(cx, ValueKind::Null),
        }
    }

    fn read_string(&self, cx: &mut dyn Context, visitor: &dyn ReadVisitor) -> CheckResult<Value> {
        match self.value {
            Bson::String(s) => visitor.from_string(cx, s.clone()),
            _ => self.mismatch(cx, ValueKind::String),
        }
    }
}

/// A writer producing a BSON document.
#[derive(Debug, Clone)]
pub struct BsonWriter {
    value: Bson,
    primitive_key: String,
}

impl Default for BsonWriter {
    fn default() -> Self {
        Self {
            value: Bson::Null,
            primitive_key: DEFAULT_PRIMITIVE_KEY.to_string(),
        }
    }
}

impl BsonWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primitive_key(mut self, key: impl Into<String>) -> Self {
        self.primitive_key = key.into();
        self
    }

    /// Returns the written element without the top-level envelope.
    pub fn into_bson(self) -> Bson {
        self.value
    }

    /// Returns the top-level document, enveloping non-document values.
    pub fn into_document(self) -> Document {
        match self.value {
            Bson::Document(document) => document,
            other => {
                let mut document = Document::new();
                document.insert(self.primitive_key, other);
                document
            }
        }
    }

    /// Serializes the top-level document.
    pub fn into_bytes(self) -> Result<Vec<u8>, bson::ser::Error> {
        let mut bytes = Vec::new();
        self.into_document().to_writer(&mut bytes)?;
        Ok(bytes)
    }

    fn child(write: impl FnOnce(&mut BsonWriter)) -> Bson {
        let mut child = BsonWriter::new();
        write(&mut child);
        child.value
    }
}

impl Writer for BsonWriter {
    fn write_any(&mut self, value: &Value) {
        write_structural(self, value);
    }

    fn write_boolean(&mut self, value: bool) {
        self.value = Bson::Boolean(value);
    }

    fn write_bytes(&mut self, value: &[u8]) {
        self.value = Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: value.to_vec(),
        });
    }

    fn write_date(&mut self, value: Date) {
        self.value = Bson::DateTime(bson::DateTime::from_millis(value.millis() as i64));
    }

    fn write_record(&mut self, keys: &[String], handler: &mut dyn FnMut(&str, &mut dyn Writer)) {
        let mut document = Document::new();
        for key in keys {
            let value = Self::child(|w| handler(key.as_str(), w));
            document.insert(key.clone(), value);
        }
        self.value = Bson::Document(document);
    }

    fn write_float64(&mut self, value: f64) {
        self.value = Bson::Double(value);
    }

    fn write_list(&mut self, size: usize, handler: &mut dyn FnMut(usize, &mut dyn Writer)) {
        let items = (0..size)
            .map(|index| Self::child(|w| handler(index, w)))
            .collect();
        self.value = Bson::Array(items);
    }

    fn write_map(
        &mut self,
        size: usize,
        key_handler: &mut dyn FnMut(usize, &mut dyn Writer),
        value_handler: &mut dyn FnMut(usize, &mut dyn Writer),
    ) {
        let mut document = Document::new();
        for index in 0..size {
            let mut key = JsonWriter::new();
            key_handler(index, &mut key);
            let value = Self::child(|w| value_handler(index, w));
            document.insert(key.into_string(), value);
        }
        self.value = Bson::Document(document);
    }

    fn write_null(&mut self) {
        self.value = Bson::Null;
    }

    fn write_string(&mut self, value: &str) {
        self.value = Bson::String(value.to_string());
    }
}
