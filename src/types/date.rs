//! Date type.

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::{Reader, Writer};
use crate::types::{base_type, IoType, LeafVisitor, Ordered, Type, VersionedType};
use crate::value::{Value, ValueKind};

/// Accepts dates whose timestamp is a finite safe integer of milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateType;

impl DateType {
    pub fn new() -> Self {
        Self
    }
}

fn millis(value: &Value) -> Option<f64> {
    match value {
        Value::Date(date) => Some(date.millis()),
        _ => None,
    }
}

impl Type for DateType {
    fn name(&self) -> &'static str {
        "Date"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        match value {
            Value::Date(date) if date.is_valid() => Ok(()),
            Value::Date(date) => Err(cx.write(Check::UnixTimestamp {
                actual: date.millis(),
            })),
            other => Err(base_type(cx, ValueKind::Date, other)),
        }
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        millis(left) == millis(right)
    }
}

impl VersionedType for DateType {}

impl IoType for DateType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_date(cx, &LeafVisitor::new(self, ValueKind::Date, reader))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        if let Value::Date(date) = value {
            writer.write_date(*date);
        }
    }
}

impl Ordered for DateType {
    fn lte(&self, left: &Value, right: &Value) -> bool {
        match (millis(left), millis(right)) {
            (Some(l), Some(r)) => l <= r,
            _ => false,
        }
    }
}
