//! Boolean type.

use crate::context::{CheckResult, Context};
use crate::io::{Reader, Writer};
use crate::types::{base_type, IoType, LeafVisitor, Ordered, Type, VersionedType};
use crate::value::{Value, ValueKind};

/// Accepts `true` and `false`; `false` sorts first.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanType;

impl BooleanType {
    pub fn new() -> Self {
        Self
    }
}

impl Type for BooleanType {
    fn name(&self) -> &'static str {
        "Boolean"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        match value {
            Value::Boolean(_) => Ok(()),
            other => Err(base_type(cx, ValueKind::Boolean, other)),
        }
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        left.as_bool() == right.as_bool()
    }
}

impl VersionedType for BooleanType {}

impl IoType for BooleanType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_boolean(cx, &LeafVisitor::new(self, ValueKind::Boolean, reader))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        if let Value::Boolean(b) = value {
            writer.write_boolean(*b);
        }
    }
}

impl Ordered for BooleanType {
    fn lte(&self, left: &Value, right: &Value) -> bool {
        left.as_bool() <= right.as_bool()
    }
}
