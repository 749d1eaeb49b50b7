//! The type whose only value is `null`.

use crate::context::{CheckResult, Context};
use crate::io::{Reader, Writer};
use crate::types::{base_type, IoType, LeafVisitor, Type, VersionedType};
use crate::value::{Value, ValueKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct NullType;

impl NullType {
    pub fn new() -> Self {
        Self
    }
}

impl Type for NullType {
    fn name(&self) -> &'static str {
        "Null"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        match value {
            Value::Null => Ok(()),
            other => Err(base_type(cx, ValueKind::Null, other)),
        }
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        matches!((left, right), (Value::Null, Value::Null))
    }
}

impl VersionedType for NullType {}

impl IoType for NullType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_null(cx, &LeafVisitor::new(self, ValueKind::Null, reader))
    }

    fn write(&self, writer: &mut dyn Writer, _value: &Value) {
        writer.write_null();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_null_equals_null() {
        let ty = NullType::new();
        assert!(ty.equals(&Value::Null, &Value::Null));
        assert!(!ty.equals(&Value::Null, &Value::Boolean(false)));
        assert!(!ty.equals(&Value::from(0), &Value::from(0)));
    }
}
