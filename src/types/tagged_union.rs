//! Discriminated union of record types.
//!
//! Every variant declares the tag property as a [`LiteralType`] over one
//! shared [`TsEnumType`](crate::types::TsEnumType). The literal values are the
//! discriminants; a value is dispatched to its variant with one map lookup.
//!
//! [`LiteralType`]: crate::types::LiteralType

use std::collections::HashMap;
use std::sync::Arc;

use crate::check::Check;
use crate::context::{CheckResult, Context, NoopContext};
use crate::error::{fatal, ConfigError};
use crate::io::{read_key, AnyVisitor, BoxReader, ReadVisitor, Reader, Writer};
use crate::lazy::Lazy;
use crate::types::{base_type, IoType, RecordType, Type, TypeRef, VersionedType};
use crate::value::{Value, ValueKind};

/// Hashable form of a tag value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TagKey {
    Number(u64),
    Text(String),
}

impl TagKey {
    fn of(value: &Value) -> Option<Self> {
        match value {
            // -0 and 0 name the same enumerant
            Value::Float64(n) if *n == 0.0 => Some(TagKey::Number(0.0f64.to_bits())),
            Value::Float64(n) => Some(TagKey::Number(n.to_bits())),
            Value::String(s) => Some(TagKey::Text(s.clone())),
            _ => None,
        }
    }
}

struct Resolved {
    variants: Vec<Arc<RecordType>>,
    tag: String,
    out_tag: String,
    tag_type: TypeRef,
    dispatch: HashMap<TagKey, usize>,
    allowed: Vec<Value>,
}

impl Resolved {
    fn new(tag: String, variants: Vec<Arc<RecordType>>) -> Result<Self, ConfigError> {
        let mut shared: Option<(String, TypeRef)> = None;
        let mut dispatch = HashMap::new();
        let mut allowed = Vec::new();
        for (index, variant) in variants.iter().enumerate() {
            let descriptor = variant.property(&tag).ok_or_else(|| ConfigError::MissingTag {
                variant: index,
                tag: tag.clone(),
            })?;
            let literal = descriptor
                .ty
                .as_literal()
                .filter(|literal| literal.base_type().as_ts_enum().is_some())
                .ok_or_else(|| ConfigError::TagNotLiteral {
                    variant: index,
                    tag: tag.clone(),
                })?;
            let out_tag = variant.out_key(&tag).unwrap_or(&tag).to_string();
            let (first_out, first_type) = shared
                .get_or_insert_with(|| (out_tag.clone(), Arc::clone(literal.base_type())));
            let same_type =
                std::ptr::addr_eq(Arc::as_ptr(first_type), Arc::as_ptr(literal.base_type()));
            if *first_out != out_tag || !same_type {
                return Err(ConfigError::TagConflict(tag));
            }
            let key = TagKey::of(literal.value())
                .ok_or_else(|| ConfigError::TagNotLiteral {
                    variant: index,
                    tag: tag.clone(),
                })?;
            if dispatch.insert(key, index).is_some() {
                return Err(ConfigError::DuplicateTagValue(literal.value().to_string()));
            }
            allowed.push(literal.value().clone());
        }
        let Some((out_tag, tag_type)) = shared else {
            return Err(ConfigError::MissingTag { variant: 0, tag });
        };
        log::trace!("tagged union on '{}' with {} variant(s)", out_tag, variants.len());
        Ok(Self {
            variants,
            tag,
            out_tag,
            tag_type,
            dispatch,
            allowed,
        })
    }

    fn variant(&self, tag_value: &Value) -> Option<&Arc<RecordType>> {
        let index = self.dispatch.get(&TagKey::of(tag_value)?)?;
        self.variants.get(*index)
    }
}

/// A union of records dispatched on a shared tag property.
///
/// An input without the tag fails with `UnionTagPresent`, an unknown tag with
/// `UnionTagValue`. Once a variant is chosen, its own failures are wrapped in
/// `UnionMatch`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use kryo::io::json::JsonReader;
/// use kryo::types::{LiteralType, RecordType, RecordTypeOptions, TaggedUnionType, TsEnumType, Types};
/// use kryo::{read_or_fail, Value};
///
/// let kind = Arc::new(TsEnumType::new([("File", Value::from(0)), ("Directory", Value::from(1))]));
/// let file = RecordType::new(
///     RecordTypeOptions::new()
///         .property("tag", Arc::new(LiteralType::new(kind.clone(), Value::from(0))))
///         .property("size", Types::uint53()),
/// );
/// let directory = RecordType::new(
///     RecordTypeOptions::new()
///         .property("tag", Arc::new(LiteralType::new(kind.clone(), Value::from(1))))
///         .property("name", Types::usv_string()),
/// );
/// let node = TaggedUnionType::new("tag", vec![Arc::new(file), Arc::new(directory)]);
///
/// let value = read_or_fail(&node, &JsonReader::parse(r#"{"tag": "File", "size": 10}"#).unwrap()).unwrap();
/// assert_eq!(value, Value::record([("tag", Value::from(0)), ("size", Value::from(10))]));
///
/// let error = read_or_fail(&node, &JsonReader::parse(r#"{"tag": "File"}"#).unwrap()).unwrap_err();
/// assert!(error.report().contains("no union variant matched"));
/// ```
pub struct TaggedUnionType {
    resolved: Lazy<Resolved>,
}

impl TaggedUnionType {
    /// Creates a union; the variants are inspected on first use.
    pub fn new(tag: impl Into<String>, variants: Vec<Arc<RecordType>>) -> Self {
        let tag = tag.into();
        Self {
            resolved: Lazy::deferred("TaggedUnion", move || {
                Resolved::new(tag, variants).unwrap_or_else(|error| fatal(error))
            }),
        }
    }

    /// Creates a union, validating the variants immediately.
    pub fn try_new(
        tag: impl Into<String>,
        variants: Vec<Arc<RecordType>>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            resolved: Lazy::eager("TaggedUnion", Resolved::new(tag.into(), variants)?),
        })
    }

    /// Defers building the variant list until first use.
    pub fn lazy<F>(tag: impl Into<String>, variants: F) -> Self
    where
        F: FnOnce() -> Vec<Arc<RecordType>> + Send + 'static,
    {
        let tag = tag.into();
        Self {
            resolved: Lazy::deferred("TaggedUnion", move || {
                Resolved::new(tag, variants()).unwrap_or_else(|error| fatal(error))
            }),
        }
    }

    pub fn tag(&self) -> &str {
        &self.resolved.get().tag
    }

    pub fn variants(&self) -> &[Arc<RecordType>] {
        &self.resolved.get().variants
    }

    /// Returns the variant selected by the tag of `value`.
    pub fn variant_of(&self, value: &Value) -> Option<&Arc<RecordType>> {
        self.match_variant(&mut NoopContext, value).ok()
    }

    fn match_variant(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<&Arc<RecordType>> {
        let resolved = self.resolved.get();
        let Some(record) = value.as_record() else {
            return Err(base_type(cx, ValueKind::Record, value));
        };
        let Some(tag_value) = record.get(&resolved.tag) else {
            return Err(cx.write(Check::UnionTagPresent {
                tag: resolved.tag.clone(),
            }));
        };
        resolved.variant(tag_value).ok_or_else(|| {
            cx.write(Check::UnionTagValue {
                tag: resolved.tag.clone(),
                allowed: resolved.allowed.clone(),
                actual: tag_value.clone(),
            })
        })
    }
}

impl Type for TaggedUnionType {
    fn name(&self) -> &'static str {
        "TaggedUnion"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let variant = self.match_variant(cx, value)?;
        variant
            .test(cx, value)
            .map_err(|cause| cx.write(Check::UnionMatch { cause }))
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        match (self.variant_of(left), self.variant_of(right)) {
            (Some(l), Some(r)) if Arc::ptr_eq(l, r) => l.equals(left, right),
            _ => false,
        }
    }

    fn clone_value(&self, value: &Value) -> Value {
        match self.variant_of(value) {
            Some(variant) => variant.clone_value(value),
            None => value.clone(),
        }
    }
}

impl VersionedType for TaggedUnionType {}

/// Scans a record input for the serialized tag and decodes it.
struct TagVisitor<'t> {
    resolved: &'t Resolved,
}

impl ReadVisitor for TagVisitor<'_> {
    fn expected(&self) -> ValueKind {
        ValueKind::Record
    }

    fn from_map<'r>(
        &self,
        cx: &mut dyn Context,
        entries: &mut dyn Iterator<Item = (BoxReader<'r>, BoxReader<'r>)>,
    ) -> CheckResult<Value> {
        let resolved = self.resolved;
        for (key_reader, value_reader) in entries {
            if read_key(cx, key_reader.as_ref())? != resolved.out_tag {
                continue;
            }
            let value_reader = value_reader.as_ref();
            if let Ok(value) = resolved.tag_type.read(&mut NoopContext, value_reader) {
                return Ok(value);
            }
            let actual = value_reader
                .read_any(&mut NoopContext, &AnyVisitor)
                .unwrap_or(Value::Null);
            return Err(cx.write(Check::UnionTagValue {
                tag: resolved.out_tag.clone(),
                allowed: resolved.allowed.clone(),
                actual,
            }));
        }
        Err(cx.write(Check::UnionTagPresent {
            tag: resolved.out_tag.clone(),
        }))
    }
}

impl IoType for TaggedUnionType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        let resolved = self.resolved.get();
        let tag_value = reader.read_record(cx, &TagVisitor { resolved })?;
        let Some(variant) = resolved.variant(&tag_value) else {
            return Err(cx.write(Check::UnionTagValue {
                tag: resolved.out_tag.clone(),
                allowed: resolved.allowed.clone(),
                actual: tag_value,
            }));
        };
        variant
            .read(cx, reader)
            .map_err(|cause| cx.write(Check::UnionMatch { cause }))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        match self.variant_of(value) {
            Some(variant) => variant.write(writer, value),
            None => fatal(ConfigError::UnmatchedWrite(self.name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::json::{JsonReader, JsonWriter};
    use crate::types::{LiteralType, RecordTypeOptions, TsEnumType, Types};
    use crate::ReportContext;

    fn kind() -> Arc<TsEnumType> {
        Arc::new(TsEnumType::new([
            ("File", Value::from(0)),
            ("Directory", Value::from(1)),
        ]))
    }

    fn variant(kind: &Arc<TsEnumType>, tag: i32, field: &str, ty: TypeRef) -> Arc<RecordType> {
        Arc::new(RecordType::new(
            RecordTypeOptions::new()
                .property("tag", Arc::new(LiteralType::new(kind.clone(), Value::from(tag))))
                .property(field, ty),
        ))
    }

    fn node() -> TaggedUnionType {
        let kind = kind();
        TaggedUnionType::new(
            "tag",
            vec![
                variant(&kind, 0, "size", Types::uint53()),
                variant(&kind, 1, "name", Types::usv_string()),
            ],
        )
    }

    fn read(text: &str) -> (ReportContext, CheckResult<Value>) {
        let mut cx = ReportContext::new();
        let result = node().read(&mut cx, &JsonReader::parse(text).unwrap());
        (cx, result)
    }

    #[test]
    fn test_dispatch_on_tag() {
        let (_, result) = read(r#"{"name": "docs", "tag": "Directory"}"#);
        assert_eq!(
            result,
            Ok(Value::record([("tag", Value::from(1)), ("name", Value::from("docs"))]))
        );
    }

    #[test]
    fn test_missing_tag() {
        let (cx, result) = read(r#"{"size": 1}"#);
        assert_eq!(cx.get(result.unwrap_err()).unwrap().code(), "UnionTagPresent");
    }

    #[test]
    fn test_unknown_tag() {
        let (cx, result) = read(r#"{"tag": "Link"}"#);
        match cx.get(result.unwrap_err()) {
            Some(Check::UnionTagValue { actual, .. }) => assert_eq!(actual, &Value::from("Link")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_variant_failure_is_wrapped() {
        let (cx, result) = read(r#"{"tag": "File"}"#);
        let id = result.unwrap_err();
        match cx.get(id) {
            Some(Check::UnionMatch { cause }) => {
                assert_eq!(cx.get(*cause).unwrap().code(), "PropertyKey")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_test_and_write() {
        let ty = node();
        let value = Value::record([("tag", Value::from(0)), ("size", Value::from(3))]);
        assert!(ty.is_valid(&value));
        assert!(!ty.is_valid(&Value::record([("tag", Value::from(7))])));
        let mut writer = JsonWriter::new();
        ty.write(&mut writer, &value);
        assert_eq!(writer.into_string(), r#"{"tag":"File","size":3}"#);
    }

    #[test]
    fn test_configuration_errors() {
        let kind = kind();
        let duplicate = TaggedUnionType::try_new(
            "tag",
            vec![
                variant(&kind, 0, "a", Types::boolean()),
                variant(&kind, 0, "b", Types::boolean()),
            ],
        );
        assert!(matches!(duplicate, Err(ConfigError::DuplicateTagValue(_))));

        let missing = TaggedUnionType::try_new(
            "kind",
            vec![variant(&kind, 0, "a", Types::boolean())],
        );
        assert!(matches!(missing, Err(ConfigError::MissingTag { variant: 0, .. })));

        let other_enum = self::kind();
        let conflict = TaggedUnionType::try_new(
            "tag",
            vec![
                variant(&kind, 0, "a", Types::boolean()),
                variant(&other_enum, 1, "b", Types::boolean()),
            ],
        );
        assert!(matches!(conflict, Err(ConfigError::TagConflict(_))));

        let plain = Arc::new(RecordType::new(
            RecordTypeOptions::new().property("tag", Types::usv_string()),
        ));
        let not_literal = TaggedUnionType::try_new("tag", vec![plain]);
        assert!(matches!(not_literal, Err(ConfigError::TagNotLiteral { .. })));
    }
}
