//! IEEE-754 double type.

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::{Reader, Writer};
use crate::types::{base_type, IoType, LeafVisitor, Ordered, Type, VersionedType};
use crate::value::{Value, ValueKind};

/// Accepts 64-bit floats.
///
/// `NaN`, the infinities and `-0` are rejected unless allowed. Equality is
/// same-value equality (`NaN` equals `NaN`, `0` differs from `-0`) and the
/// order is total with `NaN` greatest.
///
/// # Example
///
/// ```rust
/// use kryo::types::{Float64Type, Type};
/// use kryo::Value;
///
/// let strict = Float64Type::new();
/// assert!(strict.is_valid(&Value::Float64(1.5)));
/// assert!(!strict.is_valid(&Value::Float64(f64::NAN)));
///
/// let lenient = Float64Type::new().allow_nan(true).allow_infinity(true);
/// assert!(lenient.is_valid(&Value::Float64(f64::NEG_INFINITY)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Float64Type {
    allow_nan: bool,
    allow_infinity: bool,
    allow_negative_zero: bool,
}

impl Float64Type {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_nan(mut self, allow: bool) -> Self {
        self.allow_nan = allow;
        self
    }

    pub fn allow_infinity(mut self, allow: bool) -> Self {
        self.allow_infinity = allow;
        self
    }

    pub fn allow_negative_zero(mut self, allow: bool) -> Self {
        self.allow_negative_zero = allow;
        self
    }

    fn accepts(&self, n: f64) -> bool {
        if n.is_nan() {
            self.allow_nan
        } else if n.is_infinite() {
            self.allow_infinity
        } else if n == 0.0 && n.is_sign_negative() {
            self.allow_negative_zero
        } else {
            true
        }
    }
}

/// Same-value equality.
pub(crate) fn same_value(left: f64, right: f64) -> bool {
    if left.is_nan() || right.is_nan() {
        left.is_nan() && right.is_nan()
    } else {
        left == right && left.is_sign_negative() == right.is_sign_negative()
    }
}

/// Total order with `-0 < 0` and `NaN` greatest.
pub(crate) fn float_lte(left: f64, right: f64) -> bool {
    match (left.is_nan(), right.is_nan()) {
        (_, true) => true,
        (true, false) => false,
        (false, false) => left.total_cmp(&right).is_le(),
    }
}

impl Type for Float64Type {
    fn name(&self) -> &'static str {
        "Float64"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let n = match value {
            Value::Float64(n) => *n,
            other => return Err(base_type(cx, ValueKind::Float64, other)),
        };
        if self.accepts(n) {
            Ok(())
        } else {
            Err(cx.write(Check::Float64 {
                allow_nan: self.allow_nan,
                allow_infinity: self.allow_infinity,
                allow_negative_zero: self.allow_negative_zero,
                actual: n,
            }))
        }
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Float64(l), Value::Float64(r)) => same_value(*l, *r),
            _ => false,
        }
    }
}

impl VersionedType for Float64Type {}

impl IoType for Float64Type {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_float64(cx, &LeafVisitor::new(self, ValueKind::Float64, reader))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        if let Value::Float64(n) = value {
            writer.write_float64(*n);
        }
    }
}

impl Ordered for Float64Type {
    fn lte(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Float64(l), Value::Float64(r)) => float_lte(*l, *r),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::json::{JsonReader, JsonWriter};
    use crate::ReportContext;

    #[test]
    fn test_special_values_rejected_by_default() {
        let ty = Float64Type::new();
        let mut cx = ReportContext::new();
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0] {
            let id = ty.test(&mut cx, &Value::Float64(n)).unwrap_err();
            assert_eq!(cx.get(id).unwrap().code(), "Float64");
        }
        assert!(ty.is_valid(&Value::Float64(0.0)));
    }

    #[test]
    fn test_same_value_equality() {
        let ty = Float64Type::new();
        assert!(ty.equals(&Value::Float64(f64::NAN), &Value::Float64(f64::NAN)));
        assert!(!ty.equals(&Value::Float64(0.0), &Value::Float64(-0.0)));
        assert!(ty.equals(&Value::Float64(2.5), &Value::Float64(2.5)));
    }

    #[test]
    fn test_total_order() {
        let ty = Float64Type::new();
        let ordered = [f64::NEG_INFINITY, -1.0, -0.0, 0.0, 1.0, f64::INFINITY, f64::NAN];
        for pair in ordered.windows(2) {
            assert!(ty.lte(&Value::Float64(pair[0]), &Value::Float64(pair[1])));
            assert!(!ty.lte(&Value::Float64(pair[1]), &Value::Float64(pair[0])));
        }
        assert!(ty.lte(&Value::Float64(f64::NAN), &Value::Float64(f64::NAN)));
    }

    #[test]
    fn test_specials_round_trip_through_json() {
        let ty = Float64Type::new()
            .allow_nan(true)
            .allow_infinity(true)
            .allow_negative_zero(true);
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, -0.0, 0.5] {
            let mut writer = JsonWriter::new();
            ty.write(&mut writer, &Value::Float64(n));
            let reader = JsonReader::from_value(writer.into_value());
            let back = ty.read(&mut ReportContext::new(), &reader).unwrap();
            assert!(ty.equals(&back, &Value::Float64(n)));
        }
    }

    #[test]
    fn test_trusted_reader_skips_checks() {
        let ty = Float64Type::new();
        let reader = JsonReader::parse("\"NaN\"").unwrap().with_trust_input(true);
        let value = ty.read(&mut ReportContext::new(), &reader).unwrap();
        assert!(value.as_f64().unwrap().is_nan());
    }
}
