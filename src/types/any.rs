//! A type accepting any value.

use crate::context::{CheckResult, Context};
use crate::io::{AnyVisitor, Reader, Writer};
use crate::types::{IoType, Type, VersionedType};
use crate::value::Value;

/// Accepts every value and reads inputs by their own shape.
///
/// Values round-trip structurally: objects read back as records, sets are
/// written as lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyType;

impl AnyType {
    pub fn new() -> Self {
        Self
    }
}

impl Type for AnyType {
    fn name(&self) -> &'static str {
        "Any"
    }

    fn test(&self, _cx: &mut dyn Context, _value: &Value) -> CheckResult<()> {
        Ok(())
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        left == right
    }
}

impl VersionedType for AnyType {}

impl IoType for AnyType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_any(cx, &AnyVisitor)
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        writer.write_any(value);
    }
}
