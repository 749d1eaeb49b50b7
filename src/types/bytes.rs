//! Byte-string type.

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::{Reader, Writer};
use crate::types::{base_type, IoType, LeafVisitor, Ordered, Type, VersionedType};
use crate::value::{Value, ValueKind};

/// Accepts byte strings up to a maximum length.
#[derive(Debug, Clone, Copy)]
pub struct BytesType {
    max_length: usize,
}

impl Default for BytesType {
    fn default() -> Self {
        Self {
            max_length: usize::MAX,
        }
    }
}

impl BytesType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = max;
        self
    }
}

impl Type for BytesType {
    fn name(&self) -> &'static str {
        "Bytes"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        match value {
            Value::Bytes(bytes) if bytes.len() <= self.max_length => Ok(()),
            Value::Bytes(bytes) => Err(cx.write(Check::Size {
                min: 0,
                max: self.max_length,
                actual: bytes.len(),
            })),
            other => Err(base_type(cx, ValueKind::Bytes, other)),
        }
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        left == right
    }
}

impl VersionedType for BytesType {}

impl IoType for BytesType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_bytes(cx, &LeafVisitor::new(self, ValueKind::Bytes, reader))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        if let Value::Bytes(bytes) = value {
            writer.write_bytes(bytes);
        }
    }
}

impl Ordered for BytesType {
    fn lte(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Bytes(l), Value::Bytes(r)) => l <= r,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::json::JsonReader;
    use crate::ReportContext;

    #[test]
    fn test_max_length() {
        let ty = BytesType::new().max_length(2);
        assert!(ty.is_valid(&Value::Bytes(vec![1, 2])));
        assert!(!ty.is_valid(&Value::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn test_read_hex() {
        let ty = BytesType::new();
        let mut cx = ReportContext::new();
        assert_eq!(
            ty.read(&mut cx, &JsonReader::parse("\"00ff\"").unwrap()),
            Ok(Value::Bytes(vec![0x00, 0xff]))
        );
        assert!(ty.read(&mut cx, &JsonReader::parse("\"0g\"").unwrap()).is_err());
    }
}
