//! Integer type over 64-bit floats.

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::error::{fatal, ConfigError};
use crate::io::{Reader, Writer};
use crate::types::{base_type, Diff, IoType, LeafVisitor, Ordered, Type, VersionedType};
use crate::value::{Value, ValueKind, MAX_SAFE_INTEGER, MIN_SAFE_INTEGER};

/// Accepts integral floats within an inclusive range.
///
/// The default range is `[-2^53, 2^53 - 1]`: the safe-integer span extended by
/// one at the low end, which is the range of a 54-bit two's complement
/// integer. Changes are diffed as numeric deltas.
///
/// # Example
///
/// ```rust
/// use kryo::types::{IntegerType, Type, VersionedType};
/// use kryo::Value;
///
/// let percent = IntegerType::new().min(0).max(100);
/// assert!(percent.is_valid(&Value::from(100)));
/// assert!(!percent.is_valid(&Value::from(101)));
/// assert!(!percent.is_valid(&Value::Float64(1.5)));
///
/// let diff = percent.diff(&Value::from(10), &Value::from(25));
/// assert_eq!(percent.patch(&Value::from(10), diff.as_ref()), Value::from(25));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct IntegerType {
    min: f64,
    max: f64,
}

impl Default for IntegerType {
    fn default() -> Self {
        Self {
            min: MIN_SAFE_INTEGER - 1.0,
            max: MAX_SAFE_INTEGER,
        }
    }
}

impl IntegerType {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inclusive lower bound.
    pub fn min(mut self, min: i64) -> Self {
        self.min = min as f64;
        self
    }

    /// Sets the inclusive upper bound.
    pub fn max(mut self, max: i64) -> Self {
        self.max = max as f64;
        self
    }

    pub fn min_value(&self) -> f64 {
        self.min
    }

    pub fn max_value(&self) -> f64 {
        self.max
    }
}

impl Type for IntegerType {
    fn name(&self) -> &'static str {
        "Integer"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let n = match value {
            Value::Float64(n) => *n,
            other => return Err(base_type(cx, ValueKind::Float64, other)),
        };
        if n.is_finite() && n.trunc() == n && self.min <= n && n <= self.max {
            Ok(())
        } else {
            Err(cx.write(Check::Range {
                min: self.min,
                max: self.max,
                actual: n,
            }))
        }
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        left.as_f64() == right.as_f64()
    }
}

impl VersionedType for IntegerType {
    fn diff(&self, old: &Value, new: &Value) -> Option<Diff> {
        match (old, new) {
            (Value::Float64(old), Value::Float64(new)) if old != new => {
                Some(Diff::Delta(*new as i64 - *old as i64))
            }
            _ => None,
        }
    }

    fn patch(&self, old: &Value, diff: Option<&Diff>) -> Value {
        match (old, diff) {
            (_, None) => old.clone(),
            (Value::Float64(n), Some(Diff::Delta(delta))) => {
                Value::Float64((*n as i64 + delta) as f64)
            }
            _ => fatal(ConfigError::DiffMismatch(self.name())),
        }
    }

    fn reverse_diff(&self, diff: Option<&Diff>) -> Option<Diff> {
        match diff {
            None => None,
            Some(Diff::Delta(delta)) => Some(Diff::Delta(-delta)),
            Some(_) => fatal(ConfigError::DiffMismatch(self.name())),
        }
    }

    fn squash(&self, first: Option<&Diff>, second: Option<&Diff>) -> Option<Diff> {
        match (first, second) {
            (None, other) | (other, None) => other.cloned(),
            (Some(Diff::Delta(a)), Some(Diff::Delta(b))) => match a.checked_add(*b) {
                Some(0) => None,
                Some(sum) => Some(Diff::Delta(sum)),
                None => fatal(ConfigError::DiffMismatch(self.name())),
            },
            _ => fatal(ConfigError::DiffMismatch(self.name())),
        }
    }
}

impl IoType for IntegerType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_float64(cx, &LeafVisitor::new(self, ValueKind::Float64, reader))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        if let Value::Float64(n) = value {
            writer.write_float64(*n);
        }
    }
}

impl Ordered for IntegerType {
    fn lte(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Float64(l), Value::Float64(r)) => l <= r,
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
    fn test_default_bounds() {
        let ty = IntegerType::new();
        assert!(ty.is_valid(&Value::Float64(MAX_SAFE_INTEGER)));
        assert!(ty.is_valid(&Value::Float64(MIN_SAFE_INTEGER - 1.0)));
        assert!(!ty.is_valid(&Value::Float64(MAX_SAFE_INTEGER + 1.0)));
        assert!(!ty.is_valid(&Value::Float64(f64::INFINITY)));
        assert!(!ty.is_valid(&Value::Float64(f64::NAN)));
    }

    #[test]
    fn test_range_check() {
        let ty = IntegerType::new().min(-5).max(5);
        let mut cx = ReportContext::new();
        let id = ty.test(&mut cx, &Value::from(6)).unwrap_err();
        assert_eq!(
            cx.get(id),
            Some(&Check::Range {
                min: -5.0,
                max: 5.0,
                actual: 6.0
            })
        );
    }

    #[test]
    fn test_read_fraction_fails() {
        let ty = IntegerType::new();
        let mut cx = ReportContext::new();
        assert!(ty.read(&mut cx, &JsonReader::parse("1.25").unwrap()).is_err());
        assert_eq!(
            ty.read(&mut cx, &JsonReader::parse("-7").unwrap()),
            Ok(Value::from(-7))
        );
    }

    #[test]
    fn test_delta_diffs() {
        let ty = IntegerType::new();
        let first = ty.diff(&Value::from(1), &Value::from(4));
        let second = ty.diff(&Value::from(4), &Value::from(2));
        assert_eq!(first, Some(Diff::Delta(3)));
        let squashed = ty.squash(first.as_ref(), second.as_ref());
        assert_eq!(squashed, Some(Diff::Delta(1)));
        assert_eq!(ty.reverse_diff(squashed.as_ref()), Some(Diff::Delta(-1)));
        let undone = ty.squash(first.as_ref(), ty.reverse_diff(first.as_ref()).as_ref());
        assert_eq!(undone, None);
    }
}
