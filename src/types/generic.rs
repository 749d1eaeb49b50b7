//! Parametric type constructors.

use std::fmt;

use crate::types::TypeRef;

type Build = dyn Fn(&[TypeRef]) -> TypeRef + Send + Sync;

/// A type constructor applied to concrete type arguments at the use site.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use kryo::types::{GenericType, RecordType, RecordTypeOptions, Type, TypeRef, Types};
/// use kryo::{Date, Value};
///
/// let timestamped = GenericType::new(|args| {
///     Arc::new(RecordType::new(
///         RecordTypeOptions::new()
///             .property("time", Types::date())
///             .property("value", args[0].clone()),
///     )) as TypeRef
/// });
///
/// let reading = timestamped.apply(&[Types::float64() as TypeRef]);
/// let value = Value::record([
///     ("time", Value::Date(Date::from_millis(0.0))),
///     ("value", Value::from(21.5)),
/// ]);
/// assert!(reading.is_valid(&value));
/// ```
pub struct GenericType {
    build: Box<Build>,
}

impl GenericType {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&[TypeRef]) -> TypeRef + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
        }
    }

    /// Builds the type for `args`. Each call constructs a fresh type.
    pub fn apply(&self, args: &[TypeRef]) -> TypeRef {
        (self.build)(args)
    }
}

impl fmt::Debug for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericType").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::{ArrayType, ArrayTypeOptions, Type, Types};
    use crate::Value;

    #[test]
    fn test_apply_builds_per_argument() {
        let pair = GenericType::new(|args| {
            Arc::new(ArrayType::new(ArrayTypeOptions::new(args[0].clone(), 2).min_length(2))) as TypeRef
        });
        let booleans = pair.apply(&[Types::boolean() as TypeRef]);
        let nulls = pair.apply(&[Types::null() as TypeRef]);
        let two_true = Value::List(vec![Value::Boolean(true), Value::Boolean(true)]);
        assert!(booleans.is_valid(&two_true));
        assert!(!nulls.is_valid(&two_true));
        assert!(nulls.is_valid(&Value::List(vec![Value::Null, Value::Null])));
    }
}
