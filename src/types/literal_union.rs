//! Union of literal values sharing one base type.

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::{Reader, Writer};
use crate::types::{IoType, Type, TypeRef, VersionedType};
use crate::value::Value;

/// Accepts any of a fixed set of values of one base type.
///
/// # Example
///
/// ```rust
/// use kryo::types::{LiteralUnionType, Type, Types};
/// use kryo::Value;
///
/// let method = LiteralUnionType::new(
///     Types::usv_string(),
///     vec![Value::from("GET"), Value::from("POST")],
/// );
/// assert!(method.is_valid(&Value::from("GET")));
/// assert!(!method.is_valid(&Value::from("PUT")));
/// ```
pub struct LiteralUnionType {
    base: TypeRef,
    values: Vec<Value>,
}

impl LiteralUnionType {
    pub fn new(base: TypeRef, values: Vec<Value>) -> Self {
        Self { base, values }
    }

    pub fn base_type(&self) -> &TypeRef {
        &self.base
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    fn check_member(&self, cx: &mut dyn Context, value: Value) -> CheckResult<Value> {
        if self.values.iter().any(|allowed| self.base.equals(allowed, &value)) {
            Ok(value)
        } else {
            Err(cx.write(Check::LiteralValue {
                allowed: self.values.clone(),
                actual: value,
            }))
        }
    }
}

impl Type for LiteralUnionType {
    fn name(&self) -> &'static str {
        "LiteralUnion"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        self.base
            .test(cx, value)
            .map_err(|cause| cx.write(Check::LiteralType { cause }))?;
        self.check_member(cx, value.clone()).map(drop)
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        self.base.equals(left, right)
    }

    fn clone_value(&self, value: &Value) -> Value {
        self.base.clone_value(value)
    }
}

impl VersionedType for LiteralUnionType {}

impl IoType for LiteralUnionType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        let value = self
            .base
            .read(cx, reader)
            .map_err(|cause| cx.write(Check::LiteralType { cause }))?;
        self.check_member(cx, value)
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        self.base.write(writer, value);
    }
}
