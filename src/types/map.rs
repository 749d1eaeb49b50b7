//! Key/value map type.

use crate::check::Check;
use crate::context::{CheckId, CheckResult, Context};
use crate::io::search_params::FieldWriter;
use crate::io::{read_key, BoxReader, ReadVisitor, Reader, Writer};
use crate::lazy::Lazy;
use crate::path::PathSegment;
use crate::types::{base_type, IoType, Type, TypeRef, VersionedType};
use crate::value::{Value, ValueKind};

/// Options of a [`MapType`].
pub struct MapTypeOptions {
    pub key_type: TypeRef,
    pub value_type: TypeRef,
    pub max_size: usize,
    /// Encode the map as a record whose field names are the keys' text form.
    ///
    /// Only meaningful when the key type reads from and writes to strings.
    pub assume_string_key: bool,
}

impl MapTypeOptions {
    pub fn new(key_type: TypeRef, value_type: TypeRef, max_size: usize) -> Self {
        Self {
            key_type,
            value_type,
            max_size,
            assume_string_key: false,
        }
    }

    pub fn assume_string_key(mut self, assume: bool) -> Self {
        self.assume_string_key = assume;
        self
    }
}

/// A map from keys of one type to values of another.
///
/// With `assume_string_key`, entries are read and written as plain record
/// fields. Otherwise the format's explicit map encoding is used, where keys
/// carry their own encoded values.
///
/// # Example
///
/// ```rust
/// use kryo::io::json::{JsonReader, JsonWriter};
/// use kryo::types::{IoType, MapType, MapTypeOptions, Types};
/// use kryo::{read_or_fail, Value};
///
/// let scores = MapType::new(
///     MapTypeOptions::new(Types::usv_string(), Types::uint8(), 10).assume_string_key(true),
/// );
/// let value = read_or_fail(&scores, &JsonReader::parse(r#"{"ann": 3}"#).unwrap()).unwrap();
/// assert_eq!(value, Value::Map(vec![(Value::from("ann"), Value::from(3))]));
///
/// let by_id = MapType::new(MapTypeOptions::new(Types::uint8(), Types::boolean(), 10));
/// let mut writer = JsonWriter::new();
/// by_id.write(&mut writer, &Value::Map(vec![(Value::from(7), Value::Boolean(true))]));
/// assert_eq!(writer.into_string(), r#"{"7":true}"#);
/// ```
pub struct MapType {
    options: Lazy<MapTypeOptions>,
}

impl MapType {
    pub fn new(options: MapTypeOptions) -> Self {
        Self {
            options: Lazy::eager("Map", options),
        }
    }

    pub fn lazy<F>(options: F) -> Self
    where
        F: FnOnce() -> MapTypeOptions + Send + 'static,
    {
        Self {
            options: Lazy::deferred("Map", options),
        }
    }

    fn size_check(&self, cx: &mut dyn Context, size: usize) -> CheckResult<()> {
        let max = self.options.get().max_size;
        if size > max {
            Err(cx.write(Check::Size {
                min: 0,
                max,
                actual: size,
            }))
        } else {
            Ok(())
        }
    }

    /// Returns the text form of a key, as used in record-encoded maps.
    fn key_text(&self, key: &Value) -> String {
        let mut writer = FieldWriter::default();
        self.options.get().key_type.write(&mut writer, key);
        writer.into_text()
    }
}

fn entries(value: &Value) -> Option<&[(Value, Value)]> {
    match value {
        Value::Map(entries) => Some(entries),
        _ => None,
    }
}

fn segment(key: &Value, index: usize) -> PathSegment {
    match key {
        Value::String(s) => PathSegment::Field(s.clone()),
        _ => PathSegment::Index(index),
    }
}

impl Type for MapType {
    fn name(&self) -> &'static str {
        "Map"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let options = self.options.get();
        let entries = match entries(value) {
            Some(entries) => entries,
            None => return Err(base_type(cx, ValueKind::Map, value)),
        };
        self.size_check(cx, entries.len())?;
        let mut failures = Vec::new();
        for (index, (key, value)) in entries.iter().enumerate() {
            cx.enter(segment(key, index), |cx| {
                if let Err(cause) = options.key_type.test(cx, key) {
                    failures.push(cx.write(Check::PropertyKeyFormat {
                        key: key.to_string(),
                        cause,
                    }));
                }
                if let Err(cause) = options.value_type.test(cx, value) {
                    failures.push(cx.write(Check::PropertyValue {
                        key: key.to_string(),
                        cause,
                    }));
                }
            });
        }
        cx.aggregate(failures)
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        let options = self.options.get();
        match (entries(left), entries(right)) {
            (Some(l), Some(r)) => {
                l.len() == r.len()
                    && l.iter().all(|(lk, lv)| {
                        r.iter().any(|(rk, rv)| {
                            options.key_type.equals(lk, rk) && options.value_type.equals(lv, rv)
                        })
                    })
            }
            _ => false,
        }
    }

    fn clone_value(&self, value: &Value) -> Value {
        let options = self.options.get();
        match entries(value) {
            Some(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (options.key_type.clone_value(k), options.value_type.clone_value(v)))
                    .collect(),
            ),
            None => value.clone(),
        }
    }
}

impl VersionedType for MapType {}

struct MapVisitor<'t> {
    ty: &'t MapType,
    trusted: bool,
}

impl MapVisitor<'_> {
    /// Reads one key; returns its label for diagnostics alongside the result.
    fn read_entry_key(
        &self,
        cx: &mut dyn Context,
        index: usize,
        reader: &dyn Reader,
    ) -> (String, CheckResult<Value>) {
        let key_type = &self.ty.options.get().key_type;
        if self.ty.options.get().assume_string_key {
            match read_key(cx, reader) {
                Ok(raw) => {
                    let key = Value::String(raw.clone());
                    if self.trusted {
                        (raw, Ok(key))
                    } else {
                        let checked = key_type.test(cx, &key).map(|()| key);
                        (raw, checked)
                    }
                }
                Err(id) => (index.to_string(), Err(id)),
            }
        } else {
            (index.to_string(), key_type.read(cx, reader))
        }
    }
}

impl ReadVisitor for MapVisitor<'_> {
    fn expected(&self) -> ValueKind {
        ValueKind::Map
    }

    fn from_map<'r>(
        &self,
        cx: &mut dyn Context,
        raw_entries: &mut dyn Iterator<Item = (BoxReader<'r>, BoxReader<'r>)>,
    ) -> CheckResult<Value> {
        let options = self.ty.options.get();
        let mut entries: Vec<(Value, Value)> = Vec::new();
        let mut failures: Vec<CheckId> = Vec::new();
        for (index, (key_reader, value_reader)) in raw_entries.enumerate() {
            let (label, key) = self.read_entry_key(cx, index, key_reader.as_ref());
            cx.enter(label.as_str(), |cx| {
                let key = key.map_err(|cause| {
                    cx.write(Check::PropertyKeyFormat {
                        key: label.clone(),
                        cause,
                    })
                });
                let value = options
                    .value_type
                    .read(cx, value_reader.as_ref())
                    .map_err(|cause| {
                        cx.write(Check::PropertyValue {
                            key: label.clone(),
                            cause,
                        })
                    });
                match (key, value) {
                    (Ok(key), Ok(value)) => {
                        match entries.iter_mut().find(|(k, _)| options.key_type.equals(k, &key)) {
                            Some(entry) => entry.1 = value,
                            None => entries.push((key, value)),
                        }
                    }
                    (key, value) => failures.extend(key.err().into_iter().chain(value.err())),
                }
            });
        }
        cx.aggregate(failures)?;
        self.ty.size_check(cx, entries.len())?;
        Ok(Value::Map(entries))
    }
}

impl IoType for MapType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        let visitor = MapVisitor {
            ty: self,
            trusted: reader.trust_input(),
        };
        if self.options.get().assume_string_key {
            reader.read_record(cx, &visitor)
        } else {
            reader.read_map(cx, &visitor)
        }
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        let options = self.options.get();
        let Some(entries) = entries(value) else {
            return;
        };
        if options.assume_string_key {
            let keys: Vec<String> = entries.iter().map(|(k, _)| self.key_text(k)).collect();
            writer.write_record(&keys, &mut |key, w| {
                if let Some(index) = keys.iter().position(|k| k == key) {
                    options.value_type.write(w, &entries[index].1);
                }
            });
        } else {
            writer.write_map(
                entries.len(),
                &mut |index, w| options.key_type.write(w, &entries[index].0),
                &mut |index, w| options.value_type.write(w, &entries[index].1),
            );
        }
    }
}
