//! Homogeneous list type.

use std::sync::Arc;

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::{BoxReader, ReadVisitor, Reader, Writer};
use crate::lazy::Lazy;
use crate::types::{base_type, IoType, Ordered, Type, VersionedType};
use crate::value::{Value, ValueKind};

/// Options of an [`ArrayType`].
pub struct ArrayTypeOptions<T: ?Sized = dyn IoType> {
    pub item_type: Arc<T>,
    pub min_length: usize,
    pub max_length: usize,
}

impl<T: ?Sized> ArrayTypeOptions<T> {
    pub fn new(item_type: Arc<T>, max_length: usize) -> Self {
        Self {
            item_type,
            min_length: 0,
            max_length,
        }
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = min;
        self
    }
}

/// A list of items of one type, with bounded length.
///
/// Reading stops at the first item past `max_length`, so an oversized input
/// is rejected without decoding the rest of it. Item failures are reported
/// together.
///
/// # Example
///
/// ```rust
/// use kryo::io::json::JsonReader;
/// use kryo::types::{ArrayType, ArrayTypeOptions, Types};
/// use kryo::read_or_fail;
///
/// let ty = ArrayType::new(ArrayTypeOptions::new(Types::uint8(), 3));
/// assert!(read_or_fail(&ty, &JsonReader::parse("[1, 2, 3]").unwrap()).is_ok());
///
/// let error = read_or_fail(&ty, &JsonReader::parse("[1, -2, 300]").unwrap()).unwrap_err();
/// assert!(error.report().contains("[1]#"));
/// assert!(error.report().contains("[2]#"));
/// ```
pub struct ArrayType<T: ?Sized + IoType = dyn IoType> {
    options: Lazy<ArrayTypeOptions<T>>,
}

impl<T: ?Sized + IoType + 'static> ArrayType<T> {
    pub fn new(options: ArrayTypeOptions<T>) -> Self {
        Self {
            options: Lazy::eager("Array", options),
        }
    }

    /// Defers building the options until first use.
    pub fn lazy<F>(options: F) -> Self
    where
        F: FnOnce() -> ArrayTypeOptions<T> + Send + 'static,
    {
        Self {
            options: Lazy::deferred("Array", options),
        }
    }

    pub fn options(&self) -> &ArrayTypeOptions<T> {
        self.options.get()
    }
}

fn items(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) => Some(items),
        _ => None,
    }
}

impl<T: ?Sized + IoType> Type for ArrayType<T> {
    fn name(&self) -> &'static str {
        "Array"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let options = self.options.get();
        let items = match items(value) {
            Some(items) => items,
            None => return Err(base_type(cx, ValueKind::List, value)),
        };
        if items.len() < options.min_length || items.len() > options.max_length {
            return Err(cx.write(Check::Size {
                min: options.min_length,
                max: options.max_length,
                actual: items.len(),
            }));
        }
        let failures = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                cx.enter(index, |cx| options.item_type.test(cx, item)).err()
            })
            .collect();
        cx.aggregate(failures)
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        let item_type = &self.options.get().item_type;
        match (items(left), items(right)) {
            (Some(l), Some(r)) => {
                l.len() == r.len() && l.iter().zip(r).all(|(a, b)| item_type.equals(a, b))
            }
            _ => false,
        }
    }

    fn clone_value(&self, value: &Value) -> Value {
        let item_type = &self.options.get().item_type;
        match items(value) {
            Some(items) => Value::List(items.iter().map(|item| item_type.clone_value(item)).collect()),
            None => value.clone(),
        }
    }
}

impl<T: ?Sized + IoType> VersionedType for ArrayType<T> {}

struct ArrayVisitor<'t, T: ?Sized> {
    options: &'t ArrayTypeOptions<T>,
}

impl<T: ?Sized + IoType> ReadVisitor for ArrayVisitor<'_, T> {
    fn expected(&self) -> ValueKind {
        ValueKind::List
    }

    fn from_list<'r>(
        &self,
        cx: &mut dyn Context,
        items: &mut dyn Iterator<Item = BoxReader<'r>>,
    ) -> CheckResult<Value> {
        let options = self.options;
        let mut values = Vec::new();
        let mut failures = Vec::new();
        for (index, item) in items.enumerate() {
            if index >= options.max_length {
                return Err(cx.write(Check::Size {
                    min: options.min_length,
                    max: options.max_length,
                    actual: index + 1,
                }));
            }
            match cx.enter(index, |cx| options.item_type.read(cx, item.as_ref())) {
                Ok(value) => values.push(value),
                Err(id) => failures.push(id),
            }
        }
        cx.aggregate(failures)?;
        if values.len() < options.min_length {
            return Err(cx.write(Check::Size {
                min: options.min_length,
                max: options.max_length,
                actual: values.len(),
            }));
        }
        Ok(Value::List(values))
    }
}

impl<T: ?Sized + IoType> IoType for ArrayType<T> {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        let visitor = ArrayVisitor {
            options: self.options.get(),
        };
        reader.read_list(cx, &visitor)
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        let item_type = &self.options.get().item_type;
        if let Some(items) = items(value) {
            writer.write_list(items.len(), &mut |index, w| item_type.write(w, &items[index]));
        }
    }
}

impl<T: ?Sized + IoType + Ordered> Ordered for ArrayType<T> {
    /// Lexicographic order; a prefix sorts first.
    fn lte(&self, left: &Value, right: &Value) -> bool {
        let item_type = &self.options.get().item_type;
        let (Some(l), Some(r)) = (items(left), items(right)) else {
            return false;
        };
        for (a, b) in l.iter().zip(r) {
            if !item_type.equals(a, b) {
                return item_type.lte(a, b);
            }
        }
        l.len() <= r.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::json::JsonReader;
    use crate::types::{Float64Type, TypeRef, Types};
    use crate::ReportContext;

    #[test]
    fn test_oversized_input_short_circuits() {
        let ty = ArrayType::new(ArrayTypeOptions::new(Types::uint8(), 2));
        let mut cx = ReportContext::new();
        let reader = JsonReader::parse(r#"[1, 2, "not read"]"#).unwrap();
        let id = ty.read(&mut cx, &reader).unwrap_err();
        assert_eq!(
            cx.get(id),
            Some(&Check::Size {
                min: 0,
                max: 2,
                actual: 3
            })
        );
        assert_eq!(cx.len(), 1);
    }

    #[test]
    fn test_min_length() {
        let ty = ArrayType::new(ArrayTypeOptions::new(Types::boolean(), 4).min_length(1));
        assert!(!ty.is_valid(&Value::List(vec![])));
        assert!(ty.is_valid(&Value::List(vec![Value::Boolean(true)])));
    }

    #[test]
    fn test_item_errors_are_aggregated() {
        let ty = ArrayType::new(ArrayTypeOptions::new(Types::uint8(), 10));
        let mut cx = ReportContext::new();
        let value = Value::List(vec![Value::from(1), Value::from(-1), Value::from(999)]);
        let id = ty.test(&mut cx, &value).unwrap_err();
        match cx.get(id) {
            Some(Check::Aggregate { children }) => {
                assert_eq!(children.len(), 2);
                assert_eq!(cx.path_of(children[0]).unwrap().to_string(), "[1]");
                assert_eq!(cx.path_of(children[1]).unwrap().to_string(), "[2]");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_lexicographic_order() {
        let ty = ArrayType::new(ArrayTypeOptions::new(Arc::new(Float64Type::new()), 8));
        let list = |items: &[f64]| Value::List(items.iter().map(|n| Value::Float64(*n)).collect());
        assert!(ty.lte(&list(&[1.0, 2.0]), &list(&[1.0, 3.0])));
        assert!(ty.lte(&list(&[1.0]), &list(&[1.0, 0.0])));
        assert!(!ty.lte(&list(&[2.0]), &list(&[1.0, 5.0])));
    }

    #[test]
    fn test_lazy_options() {
        let ty: ArrayType = ArrayType::lazy(|| ArrayTypeOptions::new(Types::null() as TypeRef, 1));
        assert!(ty.is_valid(&Value::List(vec![Value::Null])));
    }
}
