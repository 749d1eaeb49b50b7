//! Query-string adapter.
//!
//! A thin layer over [`search_params`](crate::io::search_params): the query
//! text is percent-decoded into pairs on read and encoded back with
//! `application/x-www-form-urlencoded` rules on write.
//!
//! # Example
//!
//! ```rust
//! use kryo::io::qs::QsWriter;
//! use kryo::io::Writer;
//!
//! let mut writer = QsWriter::new();
//! writer.write_string("a b&c");
//! assert_eq!(writer.into_string(), "_=a+b%26c");
//! ```

use url::form_urlencoded;

use crate::io::search_params::{SearchParamsReader, SearchParamsWriter};
use crate::io::{Reader, Writer};
use crate::value::{Date, Value};

/// A reader over query-string text.
#[derive(Debug, Clone)]
pub struct QsReader {
    params: SearchParamsReader,
}

impl QsReader {
    /// Decodes `text`; a leading `?` is ignored.
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix('?').unwrap_or(text);
        let pairs = form_urlencoded::parse(text.as_bytes()).into_owned();
        Self {
            params: SearchParamsReader::new(pairs),
        }
    }

    pub fn with_primitive_key(mut self, key: impl Into<String>) -> Self {
        self.params = self.params.with_primitive_key(key);
        self
    }

    pub fn with_trust_input(mut self, trust: bool) -> Self {
        self.params = self.params.with_trust_input(trust);
        self
    }
}

delegate_reader!(QsReader, self => self.params);

/// A writer producing query-string text.
#[derive(Debug, Clone, Default)]
pub struct QsWriter {
    params: SearchParamsWriter,
}

impl QsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primitive_key(mut self, key: impl Into<String>) -> Self {
        self.params = self.params.with_primitive_key(key);
        self
    }

    /// Returns the encoded query, without a leading `?`.
    pub fn into_string(self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.into_pairs())
            .finish()
    }
}

impl Writer for QsWriter {
    fn write_any(&mut self, value: &Value) {
        self.params.write_any(value);
    }

    fn write_boolean(&mut self, value: bool) {
        self.params.write_boolean(value);
    }

    fn write_bytes(&mut self, value: &[u8]) {
        self.params.write_bytes(value);
    }

    fn write_date(&mut self, value: Date) {
        self.params.write_date(value);
    }

    fn write_record(&mut self, keys: &[String], handler: &mut dyn FnMut(&str, &mut dyn Writer)) {
        self.params.write_record(keys, handler);
    }

    fn write_float64(&mut self, value: f64) {
        self.params.write_float64(value);
    }

    fn write_list(&mut self, size: usize, handler: &mut dyn FnMut(usize, &mut dyn Writer)) {
        self.params.write_list(size, handler);
    }

    fn write_map(
        &mut self,
        size: usize,
        key_handler: &mut dyn FnMut(usize, &mut dyn Writer),
        value_handler: &mut dyn FnMut(usize, &mut dyn Writer),
    ) {
        self.params.write_map(size, key_handler, value_handler);
    }

    fn write_null(&mut self) {
        self.params.write_null();
    }

    fn write_string(&mut self, value: &str) {
        self.params.write_string(value);
    }
}
