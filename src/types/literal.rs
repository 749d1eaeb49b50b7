//! Single-value type.

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::{Reader, Writer};
use crate::types::{Diff, IoType, Type, TypeRef, VersionedType};
use crate::value::Value;

/// Accepts exactly one value of a base type.
///
/// A value the base type rejects fails with `LiteralType`, wrapping the base
/// failure; a valid value that is not the literal fails with `LiteralValue`.
///
/// # Example
///
/// ```rust
/// use kryo::types::{LiteralType, Type, Types};
/// use kryo::Value;
///
/// let zero = LiteralType::new(Types::uint8(), Value::from(0));
/// assert!(zero.is_valid(&Value::from(0)));
/// assert!(!zero.is_valid(&Value::from(1)));
/// ```
pub struct LiteralType {
    base: TypeRef,
    value: Value,
}

impl LiteralType {
    pub fn new(base: TypeRef, value: Value) -> Self {
        Self { base, value }
    }

    pub fn base_type(&self) -> &TypeRef {
        &self.base
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn check_value(&self, cx: &mut dyn Context, value: Value) -> CheckResult<Value> {
        if self.base.equals(&self.value, &value) {
            Ok(value)
        } else {
            Err(cx.write(Check::LiteralValue {
                allowed: vec![self.value.clone()],
                actual: value,
            }))
        }
    }
}

impl Type for LiteralType {
    fn name(&self) -> &'static str {
        "Literal"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        self.base
            .test(cx, value)
            .map_err(|cause| cx.write(Check::LiteralType { cause }))?;
        self.check_value(cx, value.clone()).map(drop)
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        self.base.equals(left, right)
    }

    fn clone_value(&self, value: &Value) -> Value {
        self.base.clone_value(value)
    }

    fn as_literal(&self) -> Option<&LiteralType> {
        Some(self)
    }
}

impl VersionedType for LiteralType {
    fn diff(&self, _old: &Value, _new: &Value) -> Option<Diff> {
        None
    }
}

impl IoType for LiteralType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        let value = self
            .base
            .read(cx, reader)
            .map_err(|cause| cx.write(Check::LiteralType { cause }))?;
        self.check_value(cx, value)
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        self.base.write(writer, value);
    }
}
