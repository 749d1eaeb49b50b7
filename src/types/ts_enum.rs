//! Named-constant enumeration type.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::case_style::CaseStyle;
use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::error::{fatal, ConfigError};
use crate::io::{ReadVisitor, Reader, Writer};
use crate::types::{IoType, Type, VersionedType};
use crate::value::{Value, ValueKind};

/// An enumeration of named values, serialized by (renamed) name.
///
/// Values are numbers or strings. Unknown names are rejected on read.
///
/// # Example
///
/// ```rust
/// use kryo::io::json::{JsonReader, JsonWriter};
/// use kryo::types::{IoType, TsEnumType};
/// use kryo::{read_or_fail, CaseStyle, Value};
///
/// let op = TsEnumType::new([("BinaryAnd", Value::from(0)), ("BinaryOr", Value::from(1))])
///     .change_case(CaseStyle::KebabCase);
///
/// let mut writer = JsonWriter::new();
/// op.write(&mut writer, &Value::from(1));
/// assert_eq!(writer.into_string(), "\"binary-or\"");
///
/// let value = read_or_fail(&op, &JsonReader::parse("\"binary-and\"").unwrap()).unwrap();
/// assert_eq!(value, Value::from(0));
/// assert!(read_or_fail(&op, &JsonReader::parse("\"BinaryAnd\"").unwrap()).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TsEnumType {
    variants: IndexMap<String, Value>,
    rename: HashMap<String, String>,
    change_case: Option<CaseStyle>,
    out_names: Vec<String>,
    by_out_name: HashMap<String, usize>,
}

impl TsEnumType {
    /// Creates an enum from `(name, value)` pairs.
    pub fn new<K, I>(variants: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let variants = variants.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::try_build(variants, HashMap::new(), None).unwrap_or_else(|error| fatal(error))
    }

    /// Serializes every name in `style` unless renamed explicitly.
    pub fn change_case(self, style: CaseStyle) -> Self {
        Self::try_build(self.variants, self.rename, Some(style)).unwrap_or_else(|error| fatal(error))
    }

    /// Serializes variant `name` as `out_name`.
    pub fn rename(mut self, name: impl Into<String>, out_name: impl Into<String>) -> Self {
        self.rename.insert(name.into(), out_name.into());
        Self::try_build(self.variants, self.rename, self.change_case)
            .unwrap_or_else(|error| fatal(error))
    }

    fn try_build(
        variants: IndexMap<String, Value>,
        rename: HashMap<String, String>,
        change_case: Option<CaseStyle>,
    ) -> Result<Self, ConfigError> {
        let mut out_names = Vec::with_capacity(variants.len());
        let mut by_out_name = HashMap::new();
        for (index, name) in variants.keys().enumerate() {
            let out_name = match (rename.get(name), change_case) {
                (Some(renamed), _) => renamed.clone(),
                (None, Some(style)) => style.rename(name),
                (None, None) => name.clone(),
            };
            if let Some(previous) = by_out_name.insert(out_name.clone(), index) {
                return Err(ConfigError::DuplicateOutKey {
                    key: out_name,
                    first: variants
                        .get_index(previous)
                        .map(|(k, _)| k.clone())
                        .unwrap_or_default(),
                    second: name.clone(),
                });
            }
            out_names.push(out_name);
        }
        Ok(Self {
            variants,
            rename,
            change_case,
            out_names,
            by_out_name,
        })
    }

    /// Returns the enumerant values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.variants.values()
    }

    fn index_of(&self, value: &Value) -> Option<usize> {
        self.variants.values().position(|v| v == value)
    }

    /// Returns the serialized name of `value`.
    pub fn out_name(&self, value: &Value) -> Option<&str> {
        self.index_of(value).map(|index| self.out_names[index].as_str())
    }
}

impl Type for TsEnumType {
    fn name(&self) -> &'static str {
        "TsEnum"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        match self.index_of(value) {
            Some(_) => Ok(()),
            None => Err(cx.write(Check::LiteralValue {
                allowed: self.values().cloned().collect(),
                actual: value.clone(),
            })),
        }
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        left == right
    }

    fn as_ts_enum(&self) -> Option<&TsEnumType> {
        Some(self)
    }
}

impl VersionedType for TsEnumType {}

struct NameVisitor<'t> {
    ty: &'t TsEnumType,
}

impl ReadVisitor for NameVisitor<'_> {
    fn expected(&self) -> ValueKind {
        ValueKind::String
    }

    fn from_string(&self, cx: &mut dyn Context, input: String) -> CheckResult<Value> {
        match self.ty.by_out_name.get(&input) {
            Some(&index) => Ok(self.ty.variants[index].clone()),
            None => Err(cx.write(Check::LiteralValue {
                allowed: self.ty.out_names.iter().map(|n| Value::from(n.as_str())).collect(),
                actual: Value::String(input),
            })),
        }
    }
}

impl IoType for TsEnumType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_string(cx, &NameVisitor { ty: self })
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        match self.out_name(value) {
            Some(name) => writer.write_string(name),
            None => fatal(ConfigError::UnmatchedWrite(self.name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReportContext;

    fn color() -> TsEnumType {
        TsEnumType::new([
            ("Red", Value::from(0)),
            ("Green", Value::from(1)),
            ("Blue", Value::from(2)),
        ])
    }

    #[test]
    fn test_values() {
        let ty = color();
        assert!(ty.is_valid(&Value::from(2)));
        assert!(!ty.is_valid(&Value::from(3)));
        assert!(!ty.is_valid(&Value::from("Red")));
    }

    #[test]
    fn test_rename_takes_precedence() {
        let ty = color().change_case(CaseStyle::SnakeCase).rename("Blue", "BLUE!");
        assert_eq!(ty.out_name(&Value::from(0)), Some("red"));
        assert_eq!(ty.out_name(&Value::from(2)), Some("BLUE!"));
    }

    #[test]
    fn test_unknown_name() {
        let ty = color();
        let mut cx = ReportContext::new();
        let reader = crate::io::json::JsonReader::parse("\"Purple\"").unwrap();
        let id = ty.read(&mut cx, &reader).unwrap_err();
        assert_eq!(cx.get(id).unwrap().code(), "LiteralValue");
    }

    #[test]
    #[should_panic(expected = "serialized key 'x'")]
    fn test_colliding_names_are_fatal() {
        TsEnumType::new([("X", Value::from(0)), ("x", Value::from(1))])
            .change_case(CaseStyle::SnakeCase);
    }
}
