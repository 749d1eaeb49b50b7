//! Unordered collection type with canonical encoding.

use std::sync::Arc;

use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::io::{BoxReader, ReadVisitor, Reader, Writer};
use crate::lazy::Lazy;
use crate::types::{base_type, IoType, OrdIoType, Ordered, Type, VersionedType};
use crate::value::{Value, ValueKind};

/// Options of a [`SetType`].
pub struct SetTypeOptions<T: ?Sized = dyn OrdIoType> {
    pub item_type: Arc<T>,
    pub max_size: usize,
}

impl<T: ?Sized> SetTypeOptions<T> {
    pub fn new(item_type: Arc<T>, max_size: usize) -> Self {
        Self {
            item_type,
            max_size,
        }
    }
}

/// A set of distinct items.
///
/// The item type must be [`Ordered`]: items are kept sorted and deduplicated,
/// which gives every set exactly one encoding regardless of insertion order.
///
/// # Example
///
/// ```rust
/// use kryo::io::json::{JsonReader, JsonWriter};
/// use kryo::types::{IoType, SetType, SetTypeOptions, Types};
/// use kryo::read_or_fail;
///
/// let ty = SetType::new(SetTypeOptions::new(Types::sint32(), 10));
/// let value = read_or_fail(&ty, &JsonReader::parse("[3, 1, 3, 2]").unwrap()).unwrap();
///
/// let mut writer = JsonWriter::new();
/// ty.write(&mut writer, &value);
/// assert_eq!(writer.into_string(), "[1,2,3]");
/// ```
pub struct SetType<T: ?Sized + OrdIoType = dyn OrdIoType> {
    options: Lazy<SetTypeOptions<T>>,
}

impl<T: ?Sized + OrdIoType + 'static> SetType<T> {
    pub fn new(options: SetTypeOptions<T>) -> Self {
        Self {
            options: Lazy::eager("Set", options),
        }
    }

    pub fn lazy<F>(options: F) -> Self
    where
        F: FnOnce() -> SetTypeOptions<T> + Send + 'static,
    {
        Self {
            options: Lazy::deferred("Set", options),
        }
    }
}

fn items(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Set(items) => Some(items),
        _ => None,
    }
}

/// Sorts `items` and drops adjacent duplicates.
fn canonicalize<T: ?Sized + OrdIoType>(item_type: &T, items: &[Value]) -> Vec<Value> {
    let mut sorted: Vec<Value> = items.to_vec();
    sorted.sort_by(|a, b| item_type.compare(a, b));
    sorted.dedup_by(|next, kept| item_type.equals(kept, next));
    sorted
}

impl<T: ?Sized + OrdIoType> SetType<T> {
    fn size_check(&self, cx: &mut dyn Context, size: usize) -> CheckResult<()> {
        let max = self.options.get().max_size;
        if size > max {
            Err(cx.write(Check::Size {
                min: 0,
                max,
                actual: size,
            }))
        } else {
            Ok(())
        }
    }
}

impl<T: ?Sized + OrdIoType> Type for SetType<T> {
    fn name(&self) -> &'static str {
        "Set"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let item_type = &self.options.get().item_type;
        let items = match items(value) {
            Some(items) => items,
            None => return Err(base_type(cx, ValueKind::Set, value)),
        };
        let failures = items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| cx.enter(index, |cx| item_type.test(cx, item)).err())
            .collect();
        cx.aggregate(failures)?;
        self.size_check(cx, canonicalize(item_type.as_ref(), items).len())
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        let item_type = self.options.get().item_type.as_ref();
        match (items(left), items(right)) {
            (Some(l), Some(r)) => {
                let l = canonicalize(item_type, l);
                let r = canonicalize(item_type, r);
                l.len() == r.len() && l.iter().zip(&r).all(|(a, b)| item_type.equals(a, b))
            }
            _ => false,
        }
    }

    fn clone_value(&self, value: &Value) -> Value {
        let item_type = &self.options.get().item_type;
        match items(value) {
            Some(items) => Value::Set(items.iter().map(|item| item_type.clone_value(item)).collect()),
            None => value.clone(),
        }
    }
}

impl<T: ?Sized + OrdIoType> VersionedType for SetType<T> {}

struct SetVisitor<'t, T: ?Sized + OrdIoType> {
    ty: &'t SetType<T>,
}

impl<T: ?Sized + OrdIoType> ReadVisitor for SetVisitor<'_, T> {
    fn expected(&self) -> ValueKind {
        ValueKind::Set
    }

    fn from_list<'r>(
        &self,
        cx: &mut dyn Context,
        items: &mut dyn Iterator<Item = BoxReader<'r>>,
    ) -> CheckResult<Value> {
        let item_type = &self.ty.options.get().item_type;
        let mut values = Vec::new();
        let mut failures = Vec::new();
        for (index, item) in items.enumerate() {
            match cx.enter(index, |cx| item_type.read(cx, item.as_ref())) {
                Ok(value) => values.push(value),
                Err(id) => failures.push(id),
            }
        }
        cx.aggregate(failures)?;
        let values = canonicalize(item_type.as_ref(), &values);
        self.ty.size_check(cx, values.len())?;
        Ok(Value::Set(values))
    }
}

impl<T: ?Sized + OrdIoType> IoType for SetType<T> {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_list(cx, &SetVisitor { ty: self })
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        let item_type = &self.options.get().item_type;
        if let Some(items) = items(value) {
            let sorted = canonicalize(item_type.as_ref(), items);
            writer.write_list(sorted.len(), &mut |index, w| item_type.write(w, &sorted[index]));
        }
    }
}

impl<T: ?Sized + OrdIoType> Ordered for SetType<T> {
    /// Lexicographic order over the canonical item lists.
    fn lte(&self, left: &Value, right: &Value) -> bool {
        let item_type = self.options.get().item_type.as_ref();
        let (Some(l), Some(r)) = (items(left), items(right)) else {
            return false;
        };
        let l = canonicalize(item_type, l);
        let r = canonicalize(item_type, r);
        for (a, b) in l.iter().zip(&r) {
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
    use crate::io::json::{JsonReader, JsonWriter};
    use crate::types::{Float64Type, Types, UsvStringType};
    use crate::ReportContext;

    #[test]
    fn test_read_sorts_and_dedups() {
        let ty = SetType::new(SetTypeOptions::new(Types::usv_string(), 5));
        let reader = JsonReader::parse(r#"["b", "a", "b", "c"]"#).unwrap();
        let value = ty.read(&mut ReportContext::new(), &reader).unwrap();
        assert_eq!(
            value,
            Value::Set(vec![Value::from("a"), Value::from("b"), Value::from("c")])
        );
    }

    #[test]
    fn test_max_size_counts_distinct_items() {
        let ty = SetType::new(SetTypeOptions::new(Types::uint8(), 2));
        let mut cx = ReportContext::new();
        let ok = JsonReader::parse("[1, 1, 1, 2]").unwrap();
        assert!(ty.read(&mut cx, &ok).is_ok());
        let too_big = JsonReader::parse("[1, 2, 3]").unwrap();
        let id = ty.read(&mut cx, &too_big).unwrap_err();
        assert_eq!(cx.get(id).unwrap().code(), "Size");
    }

    #[test]
    fn test_equality_ignores_order() {
        let ty = SetType::new(SetTypeOptions::new(Arc::new(UsvStringType::new()), 5));
        let left = Value::Set(vec![Value::from("x"), Value::from("y")]);
        let right = Value::Set(vec![Value::from("y"), Value::from("x")]);
        assert!(ty.equals(&left, &right));
    }

    #[test]
    fn test_write_is_canonical() {
        let ty = SetType::new(SetTypeOptions::new(
            Arc::new(Float64Type::new().allow_nan(true)),
            5,
        ));
        let value = Value::Set(vec![
            Value::Float64(f64::NAN),
            Value::Float64(2.0),
            Value::Float64(-1.0),
        ]);
        let mut writer = JsonWriter::new();
        ty.write(&mut writer, &value);
        assert_eq!(writer.into_string(), r#"[-1,2,"NaN"]"#);
    }

    #[test]
    fn test_lte_compares_canonical_lists() {
        let ty = SetType::new(SetTypeOptions::new(Types::sint32(), 4));
        let small = Value::Set(vec![Value::from(2), Value::from(1)]);
        let large = Value::Set(vec![Value::from(1), Value::from(3)]);
        let prefix = Value::Set(vec![Value::from(1)]);
        assert!(ty.lte(&small, &large));
        assert!(!ty.lte(&large, &small));
        assert!(ty.lte(&prefix, &small));
        assert!(!ty.lte(&small, &prefix));
        let shuffled = Value::Set(vec![Value::from(1), Value::from(2), Value::from(2)]);
        assert!(ty.lte(&small, &shuffled) && ty.lte(&shuffled, &small));
    }

    #[test]
    fn test_set_of_sets() {
        let inner = Arc::new(SetType::new(SetTypeOptions::new(Types::sint32(), 4)));
        let ty = SetType::new(SetTypeOptions::new(inner, 4));
        let reader = JsonReader::parse("[[2, 1], [3], [1, 2, 2]]").unwrap();
        let value = ty.read(&mut ReportContext::new(), &reader).unwrap();
        let mut writer = JsonWriter::new();
        ty.write(&mut writer, &value);
        assert_eq!(writer.into_string(), "[[1,2],[3]]");
    }

    #[test]
    fn test_dynamic_item_type() {
        let item: Arc<dyn OrdIoType> = Types::boolean();
        let ty: SetType = SetType::new(SetTypeOptions::new(item, 2));
        assert!(ty.is_valid(&Value::Set(vec![Value::Boolean(true)])));
    }
}
