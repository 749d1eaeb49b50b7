//! Type descriptors.
//!
//! Every descriptor validates [`Value`]s and, through the [`io`](crate::io)
//! protocol, reads and writes them in any supported format. Leaf types cover
//! primitives; composite types hold child types as [`TypeRef`]s.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use kryo::io::json::JsonReader;
//! use kryo::types::{RecordType, RecordTypeOptions, Types};
//! use kryo::{read_or_fail, Value};
//!
//! let point = RecordType::new(
//!     RecordTypeOptions::new()
//!         .property("x", Types::sint32())
//!         .property("y", Types::sint32()),
//! );
//!
//! let value = read_or_fail(&point, &JsonReader::parse(r#"{"x": 1, "y": -2}"#).unwrap()).unwrap();
//! assert_eq!(value, Value::record([("x", Value::from(1)), ("y", Value::from(-2))]));
//!
//! let error = read_or_fail(&point, &JsonReader::parse(r#"{"x": 1}"#).unwrap()).unwrap_err();
//! assert!(error.report().contains("missing properties [y]"));
//! ```

mod any;
mod array;
mod boolean;
mod bytes;
mod date;
mod float64;
mod generic;
mod integer;
pub(crate) mod literal;
mod literal_union;
mod map;
mod null;
pub(crate) mod record;
mod set;
mod string;
mod tagged_union;
mod traits;
pub(crate) mod ts_enum;
mod try_union;

use std::sync::Arc;

use crate::check::Check;
use crate::context::{CheckResult, Context, ReportContext};
use crate::error::ReportError;
use crate::io::{ReadVisitor, Reader};
use crate::value::{Date, Value, ValueKind, MAX_SAFE_INTEGER, MIN_SAFE_INTEGER};

pub use any::AnyType;
pub use array::{ArrayType, ArrayTypeOptions};
pub use boolean::BooleanType;
pub use bytes::BytesType;
pub use date::DateType;
pub use float64::Float64Type;
pub use generic::GenericType;
pub use integer::IntegerType;
pub use literal::LiteralType;
pub use literal_union::LiteralUnionType;
pub use map::{MapType, MapTypeOptions};
pub use null::NullType;
pub use record::{PropertyDescriptor, RecordDiff, RecordType, RecordTypeOptions};
pub use set::{SetType, SetTypeOptions};
pub use string::{Ucs2StringType, UsvStringType};
pub use tagged_union::TaggedUnionType;
pub use traits::{Diff, IoType, OrdIoType, Ordered, Type, TypeRef, VersionedType};
pub use ts_enum::TsEnumType;
pub use try_union::TryUnionType;

/// Reads `reader` with `ty`, rendering a report on failure.
///
/// This is the bridge for callers that want one error value instead of a
/// check log.
pub fn read_or_fail<T: IoType + ?Sized>(ty: &T, reader: &dyn Reader) -> Result<Value, ReportError> {
    let mut cx = ReportContext::new();
    ty.read(&mut cx, reader).map_err(|id| {
        let error = cx.fail(id);
        log::debug!("{} rejected input: {}", ty.name(), error.report());
        error
    })
}

/// Visitor shared by the leaf types.
///
/// Accepts exactly one primitive kind and, unless the reader is trusted,
/// re-validates the decoded value with the owning type.
pub(crate) struct LeafVisitor<'t> {
    ty: &'t dyn Type,
    kind: ValueKind,
    trusted: bool,
}

impl<'t> LeafVisitor<'t> {
    pub(crate) fn new(ty: &'t dyn Type, kind: ValueKind, reader: &dyn Reader) -> Self {
        Self {
            ty,
            kind,
            trusted: reader.trust_input(),
        }
    }

    fn accept(&self, cx: &mut dyn Context, value: Value) -> CheckResult<Value> {
        if value.kind() != self.kind {
            return Err(cx.write(Check::BaseType {
                expected: self.kind,
                actual: Some(value.kind()),
            }));
        }
        if !self.trusted {
            self.ty.test(cx, &value)?;
        }
        Ok(value)
    }
}

impl ReadVisitor for LeafVisitor<'_> {
    fn expected(&self) -> ValueKind {
        self.kind
    }

    fn from_boolean(&self, cx: &mut dyn Context, input: bool) -> CheckResult<Value> {
        self.accept(cx, Value::Boolean(input))
    }

    fn from_bytes(&self, cx: &mut dyn Context, input: Vec<u8>) -> CheckResult<Value> {
        self.accept(cx, Value::Bytes(input))
    }

    fn from_date(&self, cx: &mut dyn Context, input: Date) -> CheckResult<Value> {
        self.accept(cx, Value::Date(input))
    }

    fn from_float64(&self, cx: &mut dyn Context, input: f64) -> CheckResult<Value> {
        self.accept(cx, Value::Float64(input))
    }

    fn from_null(&self, cx: &mut dyn Context) -> CheckResult<Value> {
        self.accept(cx, Value::Null)
    }

    fn from_string(&self, cx: &mut dyn Context, input: String) -> CheckResult<Value> {
        self.accept(cx, Value::String(input))
    }
}

/// Writes a `BaseType` check for a value of the wrong shape.
pub(crate) fn base_type(cx: &mut dyn Context, expected: ValueKind, value: &Value) -> crate::CheckId {
    cx.write(Check::BaseType {
        expected,
        actual: Some(value.kind()),
    })
}

/// Entry point for the built-in types and integer aliases.
///
/// Each constructor returns a fresh `Arc`, ready to be used as a child type.
pub struct Types;

impl Types {
    pub fn any() -> Arc<AnyType> {
        Arc::new(AnyType::new())
    }

    pub fn boolean() -> Arc<BooleanType> {
        Arc::new(BooleanType::new())
    }

    pub fn bytes() -> Arc<BytesType> {
        Arc::new(BytesType::new())
    }

    pub fn date() -> Arc<DateType> {
        Arc::new(DateType::new())
    }

    pub fn float64() -> Arc<Float64Type> {
        Arc::new(Float64Type::new())
    }

    pub fn null() -> Arc<NullType> {
        Arc::new(NullType::new())
    }

    /// A string measured in Unicode scalar values, NFC-normalized.
    pub fn usv_string() -> Arc<UsvStringType> {
        Arc::new(UsvStringType::new())
    }

    /// A string measured in UTF-16 code units.
    pub fn ucs2_string() -> Arc<Ucs2StringType> {
        Arc::new(Ucs2StringType::new())
    }

    /// Integers in `[-2^53, 2^53 - 1]`.
    pub fn integer() -> Arc<IntegerType> {
        Arc::new(IntegerType::new())
    }

    pub fn safe_integer() -> Arc<IntegerType> {
        Self::integer_range(MIN_SAFE_INTEGER as i64, MAX_SAFE_INTEGER as i64)
    }

    pub fn sint8() -> Arc<IntegerType> {
        Self::integer_range(i8::MIN.into(), i8::MAX.into())
    }

    pub fn sint16() -> Arc<IntegerType> {
        Self::integer_range(i16::MIN.into(), i16::MAX.into())
    }

    pub fn sint32() -> Arc<IntegerType> {
        Self::integer_range(i32::MIN.into(), i32::MAX.into())
    }

    /// 54-bit two's complement integers (`[-2^53, 2^53 - 1]`).
    pub fn sint54() -> Arc<IntegerType> {
        Self::integer_range(-(1 << 53), MAX_SAFE_INTEGER as i64)
    }

    pub fn uint8() -> Arc<IntegerType> {
        Self::integer_range(0, u8::MAX.into())
    }

    pub fn uint16() -> Arc<IntegerType> {
        Self::integer_range(0, u16::MAX.into())
    }

    pub fn uint32() -> Arc<IntegerType> {
        Self::integer_range(0, u32::MAX.into())
    }

    pub fn uint53() -> Arc<IntegerType> {
        Self::integer_range(0, MAX_SAFE_INTEGER as i64)
    }

    fn integer_range(min: i64, max: i64) -> Arc<IntegerType> {
        Arc::new(IntegerType::new().min(min).max(max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_aliases() {
        assert!(Types::uint8().is_valid(&Value::from(255)));
        assert!(!Types::uint8().is_valid(&Value::from(256)));
        assert!(!Types::uint8().is_valid(&Value::from(-1)));
        assert!(Types::sint8().is_valid(&Value::from(-128)));
        assert!(Types::sint32().is_valid(&Value::from(i32::MIN)));
        assert!(Types::uint32().is_valid(&Value::from(u32::MAX)));
        assert!(Types::safe_integer().is_valid(&Value::Float64(MAX_SAFE_INTEGER)));
        assert!(!Types::safe_integer().is_valid(&Value::Float64(MIN_SAFE_INTEGER - 1.0)));
        assert!(Types::integer().is_valid(&Value::Float64(MIN_SAFE_INTEGER - 1.0)));
    }

    #[test]
    fn test_read_or_fail_reports() {
        let reader = crate::io::json::JsonReader::parse("\"x\"").unwrap();
        let error = read_or_fail(&Float64Type::new(), &reader).unwrap_err();
        assert_eq!(error.report(), "#0: expected Float64, got String");
    }
}
