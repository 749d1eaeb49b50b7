//! Type registry for named types and recursive references.
//!
//! This module provides the [`TypeRegistry`] type that stores named types and
//! the [`RefType`] handle that resolves a name at use time. References let
//! self- and mutually-recursive types be declared without building cyclic
//! `Arc`s by hand.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use crate::context::{CheckResult, Context};
use crate::error::{fatal, ConfigError, ReportError};
use crate::io::{Reader, Writer};
use crate::types::{Diff, IoType, LiteralType, TsEnumType, Type, TypeRef, VersionedType};
use crate::value::Value;

#[derive(Default)]
struct Inner {
    types: RwLock<HashMap<String, TypeRef>>,
    references: Mutex<BTreeSet<String>>,
}

/// A thread-safe registry of named types.
///
/// Clones share the same storage. References handed out by
/// [`reference`](TypeRegistry::reference) stay usable while any clone is alive.
///
/// # Thread Safety
///
/// - Multiple threads can validate concurrently (read-only access)
/// - Registration operations are serialized (write access)
///
/// # Example
///
/// ```rust
/// use kryo::types::{ArrayType, ArrayTypeOptions, RecordType, RecordTypeOptions, Type, Types};
/// use kryo::{TypeRegistry, Value};
/// use std::sync::Arc;
///
/// let registry = TypeRegistry::new();
/// let children = ArrayType::new(ArrayTypeOptions::new(registry.reference("Tree"), 8));
/// registry
///     .register(
///         "Tree",
///         RecordType::new(
///             RecordTypeOptions::new()
///                 .property("label", Types::usv_string())
///                 .property("children", Arc::new(children)),
///         ),
///     )
///     .unwrap();
///
/// let leaf = Value::record([("label", Value::from("leaf")), ("children", Value::List(vec![]))]);
/// let root = Value::record([("label", Value::from("root")), ("children", Value::List(vec![leaf]))]);
/// assert!(registry.get("Tree").unwrap().is_valid(&root));
/// assert!(registry.unresolved().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct TypeRegistry {
    inner: Arc<Inner>,
}

impl TypeRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type with the given name and returns its shared handle.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::DuplicateName` if the name is already registered.
    pub fn register<T>(&self, name: impl Into<String>, ty: T) -> Result<TypeRef, ConfigError>
    where
        T: IoType + 'static,
    {
        let ty: TypeRef = Arc::new(ty);
        self.register_shared(name, Arc::clone(&ty))?;
        Ok(ty)
    }

    /// Registers an already shared type.
    pub fn register_shared(&self, name: impl Into<String>, ty: TypeRef) -> Result<(), ConfigError> {
        let name = name.into();
        let mut types = self.inner.types.write();
        if types.contains_key(&name) {
            return Err(ConfigError::DuplicateName(name));
        }
        log::trace!("registering type '{}'", name);
        types.insert(name, ty);
        Ok(())
    }

    /// Retrieves a type by name.
    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.inner.types.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.types.read().contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.inner.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.types.read().is_empty()
    }

    /// Returns a handle that resolves `name` each time it is used.
    ///
    /// The name does not have to be registered yet.
    pub fn reference(&self, name: impl Into<String>) -> Arc<RefType> {
        let name = name.into();
        self.inner.references.lock().insert(name.clone());
        Arc::new(RefType {
            name,
            registry: Arc::downgrade(&self.inner),
            pinned: OnceCell::new(),
        })
    }

    /// Lists referenced names that are not registered, sorted.
    ///
    /// Call this after all types are registered to ensure every reference
    /// will resolve.
    pub fn unresolved(&self) -> Vec<String> {
        let types = self.inner.types.read();
        self.inner
            .references
            .lock()
            .iter()
            .filter(|name| !types.contains_key(*name))
            .cloned()
            .collect()
    }

    /// Validates a value against a named type.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::TypeNotFound` if the name is not registered.
    pub fn check(&self, name: &str, value: &Value) -> Result<Result<(), ReportError>, ConfigError> {
        let ty = self
            .get(name)
            .ok_or_else(|| ConfigError::TypeNotFound(name.to_string()))?;
        Ok(ty.check(value))
    }
}

/// A named reference into a [`TypeRegistry`].
///
/// Every operation looks the name up and delegates to the registered type.
/// Using a reference whose name was never registered, or whose registry was
/// dropped, is a configuration error.
pub struct RefType {
    name: String,
    registry: Weak<Inner>,
    // Literal and ts-enum targets, held strongly so they can be borrowed.
    // Neither kind can lead back to this reference.
    pinned: OnceCell<TypeRef>,
}

impl RefType {
    pub fn target_name(&self) -> &str {
        &self.name
    }

    /// Looks up the referenced type.
    pub fn try_resolve(&self) -> Result<TypeRef, ConfigError> {
        let inner = self
            .registry
            .upgrade()
            .ok_or_else(|| ConfigError::RegistryDropped(self.name.clone()))?;
        let resolved = inner.types.read().get(&self.name).cloned();
        resolved.ok_or_else(|| ConfigError::TypeNotFound(self.name.clone()))
    }

    fn resolve(&self) -> TypeRef {
        self.try_resolve().unwrap_or_else(|error| fatal(error))
    }

    fn pinned(&self) -> Option<&TypeRef> {
        if let Some(target) = self.pinned.get() {
            return Some(target);
        }
        let target = self.resolve();
        if target.as_literal().is_none() && target.as_ts_enum().is_none() {
            return None;
        }
        Some(self.pinned.get_or_init(|| target))
    }
}

impl Type for RefType {
    fn name(&self) -> &'static str {
        "Ref"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        self.resolve().test(cx, value)
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        self.resolve().equals(left, right)
    }

    fn clone_value(&self, value: &Value) -> Value {
        self.resolve().clone_value(value)
    }

    fn as_literal(&self) -> Option<&LiteralType> {
        self.pinned()?.as_literal()
    }

    fn as_ts_enum(&self) -> Option<&TsEnumType> {
        self.pinned()?.as_ts_enum()
    }
}

impl VersionedType for RefType {
    fn diff(&self, old: &Value, new: &Value) -> Option<Diff> {
        self.resolve().diff(old, new)
    }

    fn patch(&self, old: &Value, diff: Option<&Diff>) -> Value {
        self.resolve().patch(old, diff)
    }

    fn reverse_diff(&self, diff: Option<&Diff>) -> Option<Diff> {
        self.resolve().reverse_diff(diff)
    }

    fn squash(&self, first: Option<&Diff>, second: Option<&Diff>) -> Option<Diff> {
        self.resolve().squash(first, second)
    }
}

impl IoType for RefType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        self.resolve().read(cx, reader)
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        self.resolve().write(writer, value);
    }
}
