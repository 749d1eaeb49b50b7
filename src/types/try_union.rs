//! Ordered first-match union.

use crate::check::Check;
use crate::context::{CheckId, CheckResult, Context, NoopContext};
use crate::error::{fatal, ConfigError};
use crate::io::{Reader, Writer};
use crate::lazy::Lazy;
use crate::types::{IoType, Type, TypeRef, VersionedType};
use crate::value::Value;

/// A union that tries its variants in declared order.
///
/// The first variant that accepts the input wins, even if a later one would
/// match too. When every variant fails, their failures are collected in an
/// `Aggregate` wrapped in `UnionMatch`.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use kryo::types::{RecordType, RecordTypeOptions, TryUnionType, TypeRef, Types};
/// use kryo::Value;
///
/// let rectangle = Arc::new(RecordType::new(
///     RecordTypeOptions::new()
///         .property("width", Types::float64())
///         .property("height", Types::float64()),
/// ));
/// let circle = Arc::new(RecordType::new(
///     RecordTypeOptions::new().property("radius", Types::float64()),
/// ));
/// let shape = TryUnionType::new(vec![rectangle.clone() as TypeRef, circle]);
///
/// let value = Value::record([("width", Value::from(10)), ("height", Value::from(20))]);
/// let matched = shape.match_value(&value).unwrap();
/// assert!(std::ptr::addr_eq(Arc::as_ptr(matched), Arc::as_ptr(&rectangle)));
/// ```
pub struct TryUnionType {
    variants: Lazy<Vec<TypeRef>>,
}

impl TryUnionType {
    pub fn new(variants: Vec<TypeRef>) -> Self {
        Self {
            variants: Lazy::eager("TryUnion", variants),
        }
    }

    /// Defers building the variant list until first use.
    pub fn lazy<F>(variants: F) -> Self
    where
        F: FnOnce() -> Vec<TypeRef> + Send + 'static,
    {
        Self {
            variants: Lazy::deferred("TryUnion", variants),
        }
    }

    pub fn variants(&self) -> &[TypeRef] {
        self.variants.get()
    }

    /// Returns the first variant accepting `value`.
    pub fn match_value(&self, value: &Value) -> Option<&TypeRef> {
        self.variants().iter().find(|variant| variant.is_valid(value))
    }

    fn no_match(cx: &mut dyn Context, failures: Vec<CheckId>) -> CheckId {
        let cause = cx.write(Check::Aggregate { children: failures });
        cx.write(Check::UnionMatch { cause })
    }
}

impl Type for TryUnionType {
    fn name(&self) -> &'static str {
        "TryUnion"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let mut failures = Vec::new();
        for variant in self.variants() {
            match variant.test(cx, value) {
                Ok(()) => return Ok(()),
                Err(id) => failures.push(id),
            }
        }
        Err(Self::no_match(cx, failures))
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        match self.match_value(left) {
            Some(variant) => variant.is_valid(right) && variant.equals(left, right),
            None => false,
        }
    }

    fn clone_value(&self, value: &Value) -> Value {
        match self.match_value(value) {
            Some(variant) => variant.clone_value(value),
            None => value.clone(),
        }
    }
}

impl VersionedType for TryUnionType {}

impl IoType for TryUnionType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        let mut failures = Vec::new();
        for variant in self.variants() {
            match variant.read(cx, reader) {
                Ok(value) => return Ok(value),
                Err(id) => failures.push(id),
            }
        }
        Err(Self::no_match(cx, failures))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        let variant = self
            .variants()
            .iter()
            .find(|variant| variant.test(&mut NoopContext, value).is_ok());
        match variant {
            Some(variant) => variant.write(writer, value),
            None => fatal(ConfigError::UnmatchedWrite(self.name())),
        }
    }
}
