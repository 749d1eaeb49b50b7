//! Record type: a fixed set of named, typed properties.
//!
//! Properties are addressed by name in values and by *serialized key* on the
//! wire. The serialized key of a property is, by precedence:
//!
//! 1. the property's own `rename`
//! 2. the property's own `change_case` applied to its name
//! 3. the record-level `rename` entry for the name
//! 4. the record-level `change_case` applied to the name
//! 5. the name itself
//!
//! Two properties resolving to the same serialized key is a configuration
//! error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::case_style::CaseStyle;
use crate::check::Check;
use crate::context::{CheckResult, Context};
use crate::error::{fatal, ConfigError};
use crate::io::{read_key, BoxReader, ReadVisitor, Reader, Writer};
use crate::lazy::Lazy;
use crate::types::{base_type, Diff, IoType, Type, TypeRef, VersionedType};
use crate::value::{Value, ValueKind};

/// Declaration of one record property.
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub ty: TypeRef,
    pub optional: bool,
    pub rename: Option<String>,
    pub change_case: Option<CaseStyle>,
}

impl PropertyDescriptor {
    pub fn new(ty: TypeRef) -> Self {
        Self {
            ty,
            optional: false,
            rename: None,
            change_case: None,
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Serializes this property under `key`.
    pub fn rename(mut self, key: impl Into<String>) -> Self {
        self.rename = Some(key.into());
        self
    }

    pub fn change_case(mut self, style: CaseStyle) -> Self {
        self.change_case = Some(style);
        self
    }
}

/// Options of a [`RecordType`].
#[derive(Clone, Default)]
pub struct RecordTypeOptions {
    pub properties: IndexMap<String, PropertyDescriptor>,
    pub no_extra_keys: bool,
    pub rename: HashMap<String, String>,
    pub change_case: Option<CaseStyle>,
}

impl RecordTypeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required property.
    pub fn property(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.descriptor(name, PropertyDescriptor::new(ty))
    }

    /// Adds an optional property.
    pub fn optional(self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.descriptor(name, PropertyDescriptor::new(ty).optional(true))
    }

    /// Adds a property with a full descriptor.
    pub fn descriptor(mut self, name: impl Into<String>, descriptor: PropertyDescriptor) -> Self {
        self.properties.insert(name.into(), descriptor);
        self
    }

    /// Rejects inputs with keys that match no property.
    pub fn no_extra_keys(mut self, deny: bool) -> Self {
        self.no_extra_keys = deny;
        self
    }

    /// Serializes property `name` under `key` unless the property renames itself.
    pub fn rename(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.rename.insert(name.into(), key.into());
        self
    }

    pub fn change_case(mut self, style: CaseStyle) -> Self {
        self.change_case = Some(style);
        self
    }

    fn out_key(&self, name: &str, descriptor: &PropertyDescriptor) -> String {
        if let Some(key) = &descriptor.rename {
            return key.clone();
        }
        if let Some(style) = descriptor.change_case {
            return style.rename(name);
        }
        if let Some(key) = self.rename.get(name) {
            return key.clone();
        }
        match self.change_case {
            Some(style) => style.rename(name),
            None => name.to_string(),
        }
    }

    /// Keeps only the named properties.
    fn pick(&self, names: &[String]) -> Result<Self, ConfigError> {
        for name in names {
            if !self.properties.contains_key(name) {
                return Err(ConfigError::UnknownProperty(name.clone()));
            }
        }
        Ok(self.retain(|name| names.iter().any(|n| n == name)))
    }

    /// Drops the named properties.
    fn omit(&self, names: &[String]) -> Result<Self, ConfigError> {
        for name in names {
            if !self.properties.contains_key(name) {
                return Err(ConfigError::UnknownProperty(name.clone()));
            }
        }
        Ok(self.retain(|name| !names.iter().any(|n| n == name)))
    }

    fn retain(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self {
            properties: self
                .properties
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, descriptor)| (name.clone(), descriptor.clone()))
                .collect(),
            no_extra_keys: self.no_extra_keys,
            rename: self
                .rename
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, key)| (name.clone(), key.clone()))
                .collect(),
            change_case: self.change_case,
        }
    }
}

/// Options with their serialized keys resolved.
struct Resolved {
    options: RecordTypeOptions,
    out_keys: IndexMap<String, String>,
    in_keys: HashMap<String, String>,
}

impl Resolved {
    fn new(options: RecordTypeOptions) -> Result<Self, ConfigError> {
        let mut out_keys = IndexMap::new();
        let mut in_keys: HashMap<String, String> = HashMap::new();
        for (name, descriptor) in &options.properties {
            let key = options.out_key(name, descriptor);
            if let Some(first) = in_keys.insert(key.clone(), name.clone()) {
                return Err(ConfigError::DuplicateOutKey {
                    key,
                    first,
                    second: name.clone(),
                });
            }
            out_keys.insert(name.clone(), key);
        }
        log::trace!("resolved record keys {:?}", out_keys);
        Ok(Self {
            options,
            out_keys,
            in_keys,
        })
    }
}

/// Property-level change between two records.
///
/// `set` holds properties that became present, `unset` the previous values
/// of properties that became absent, and `update` the diffs of properties
/// present on both sides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDiff {
    pub set: IndexMap<String, Value>,
    pub unset: IndexMap<String, Value>,
    pub update: IndexMap<String, Diff>,
}

impl RecordDiff {
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty() && self.update.is_empty()
    }

    fn into_diff(self) -> Option<Diff> {
        if self.is_empty() {
            None
        } else {
            Some(Diff::Record(self))
        }
    }
}

/// A record of named properties.
///
/// Reads and tests report missing required properties and, with
/// `no_extra_keys`, unknown keys as one `PropertyKey` check. Invalid property
/// values are reported together under an `Aggregate`. Unknown keys are
/// dropped when allowed.
///
/// # Example
///
/// ```rust
/// use kryo::io::json::JsonWriter;
/// use kryo::types::{IoType, PropertyDescriptor, RecordType, RecordTypeOptions, Types};
/// use kryo::{CaseStyle, Value};
///
/// let bounds = RecordType::new(
///     RecordTypeOptions::new()
///         .property("xMin", Types::sint32())
///         .descriptor("xMax", PropertyDescriptor::new(Types::sint32()).change_case(CaseStyle::ScreamingSnakeCase))
///         .descriptor("yMin", PropertyDescriptor::new(Types::sint32()).rename("__yMin"))
///         .property("yMax", Types::sint32())
///         .rename("xMin", "xmin")
///         .change_case(CaseStyle::KebabCase),
/// );
///
/// let value = Value::record([
///     ("xMin", Value::from(0)),
///     ("xMax", Value::from(10)),
///     ("yMin", Value::from(20)),
///     ("yMax", Value::from(30)),
/// ]);
/// let mut writer = JsonWriter::new();
/// bounds.write(&mut writer, &value);
/// assert_eq!(
///     writer.into_string(),
///     r#"{"xmin":0,"X_MAX":10,"__yMin":20,"y-max":30}"#
/// );
/// ```
pub struct RecordType {
    resolved: Lazy<Resolved>,
}

impl RecordType {
    /// Creates a record type.
    ///
    /// # Panics
    ///
    /// Panics if two properties share a serialized key. Use
    /// [`try_new`](RecordType::try_new) to handle that as an error.
    pub fn new(options: RecordTypeOptions) -> Self {
        Self::try_new(options).unwrap_or_else(|error| fatal(error))
    }

    pub fn try_new(options: RecordTypeOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            resolved: Lazy::eager("Record", Resolved::new(options)?),
        })
    }

    /// Defers building the options until first use.
    ///
    /// Use this for self-referential records; configuration errors surface
    /// as panics on first use.
    pub fn lazy<F>(options: F) -> Self
    where
        F: FnOnce() -> RecordTypeOptions + Send + 'static,
    {
        Self {
            resolved: Lazy::deferred("Record", move || {
                Resolved::new(options()).unwrap_or_else(|error| fatal(error))
            }),
        }
    }

    fn derived<F>(options: F) -> Self
    where
        F: FnOnce() -> Result<RecordTypeOptions, ConfigError> + Send + 'static,
    {
        Self::lazy(move || options().unwrap_or_else(|error| fatal(error)))
    }

    pub fn options(&self) -> &RecordTypeOptions {
        &self.resolved.get().options
    }

    /// Returns the declaration of property `name`.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.options().properties.get(name)
    }

    /// Returns the serialized key of property `name`.
    pub fn out_key(&self, name: &str) -> Option<&str> {
        self.resolved.get().out_keys.get(name).map(String::as_str)
    }

    /// A record with only the named properties, derived on first use.
    pub fn pick(self: &Arc<Self>, names: &[&str]) -> RecordType {
        let base = Arc::clone(self);
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        Self::derived(move || base.options().pick(&names))
    }

    /// A record without the named properties, derived on first use.
    pub fn omit(self: &Arc<Self>, names: &[&str]) -> RecordType {
        let base = Arc::clone(self);
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        Self::derived(move || base.options().omit(&names))
    }

    /// A record with the properties of `self` and of `extension`.
    ///
    /// Base properties keep their serialized keys. The extension's
    /// record-level renaming applies to its own properties.
    pub fn extend(self: &Arc<Self>, extension: RecordTypeOptions) -> RecordType {
        let base = Arc::clone(self);
        Self::derived(move || base.extended_options(extension))
    }

    /// Like [`pick`](RecordType::pick), resolved immediately.
    pub fn try_pick(&self, names: &[&str]) -> Result<RecordType, ConfigError> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        Self::try_new(self.options().pick(&names)?)
    }

    /// Like [`omit`](RecordType::omit), resolved immediately.
    pub fn try_omit(&self, names: &[&str]) -> Result<RecordType, ConfigError> {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        Self::try_new(self.options().omit(&names)?)
    }

    /// Like [`extend`](RecordType::extend), resolved immediately.
    pub fn try_extend(&self, extension: RecordTypeOptions) -> Result<RecordType, ConfigError> {
        Self::try_new(self.extended_options(extension)?)
    }

    fn extended_options(
        &self,
        extension: RecordTypeOptions,
    ) -> Result<RecordTypeOptions, ConfigError> {
        let resolved = self.resolved.get();
        let mut properties = IndexMap::new();
        for (name, descriptor) in &resolved.options.properties {
            let mut descriptor = descriptor.clone();
            descriptor.rename = resolved.out_keys.get(name).cloned();
            properties.insert(name.clone(), descriptor);
        }
        for (name, descriptor) in extension.properties {
            if properties.contains_key(&name) {
                return Err(ConfigError::ExtendCollision(name));
            }
            properties.insert(name, descriptor);
        }
        Ok(RecordTypeOptions {
            properties,
            no_extra_keys: resolved.options.no_extra_keys || extension.no_extra_keys,
            rename: extension.rename,
            change_case: extension.change_case,
        })
    }
}

fn props(value: &Value) -> Option<&IndexMap<String, Value>> {
    value.as_record()
}

impl Type for RecordType {
    fn name(&self) -> &'static str {
        "Record"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let options = self.options();
        let Some(props) = props(value) else {
            return Err(base_type(cx, ValueKind::Record, value));
        };
        let missing: Vec<String> = options
            .properties
            .iter()
            .filter(|(name, d)| !d.optional && !props.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect();
        let extra: Vec<String> = if options.no_extra_keys {
            props
                .keys()
                .filter(|key| !options.properties.contains_key(*key))
                .cloned()
                .collect()
        } else {
            Vec::new()
        };
        if !missing.is_empty() || !extra.is_empty() {
            return Err(cx.write(Check::PropertyKey { missing, extra }));
        }
        let failures = options
            .properties
            .iter()
            .filter_map(|(name, descriptor)| {
                let value = props.get(name)?;
                cx.enter(name.as_str(), |cx| descriptor.ty.test(cx, value))
                    .err()
            })
            .collect();
        cx.aggregate(failures)
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        let (Some(l), Some(r)) = (props(left), props(right)) else {
            return false;
        };
        self.options()
            .properties
            .iter()
            .all(|(name, descriptor)| match (l.get(name), r.get(name)) {
                (None, None) => true,
                (Some(a), Some(b)) => descriptor.ty.equals(a, b),
                _ => false,
            })
    }

    fn clone_value(&self, value: &Value) -> Value {
        let Some(props) = props(value) else {
            return value.clone();
        };
        Value::Record(
            self.options()
                .properties
                .iter()
                .filter_map(|(name, descriptor)| {
                    let value = props.get(name)?;
                    Some((name.clone(), descriptor.ty.clone_value(value)))
                })
                .collect(),
        )
    }
}

/// How one property changed within a [`RecordDiff`].
enum Change<'d> {
    Same,
    Set(&'d Value),
    Unset(&'d Value),
    Update(&'d Diff),
}

fn change<'d>(diff: &'d RecordDiff, name: &str) -> Change<'d> {
    if let Some(value) = diff.set.get(name) {
        Change::Set(value)
    } else if let Some(value) = diff.unset.get(name) {
        Change::Unset(value)
    } else if let Some(update) = diff.update.get(name) {
        Change::Update(update)
    } else {
        Change::Same
    }
}

impl RecordType {
    fn record_diff<'d>(&self, diff: &'d Diff) -> &'d RecordDiff {
        match diff {
            Diff::Record(diff) => diff,
            _ => fatal(ConfigError::DiffMismatch(self.name())),
        }
    }
}

impl VersionedType for RecordType {
    fn diff(&self, old: &Value, new: &Value) -> Option<Diff> {
        let (Some(old), Some(new)) = (props(old), props(new)) else {
            fatal(ConfigError::DiffMismatch(self.name()));
        };
        let mut diff = RecordDiff::default();
        for (name, descriptor) in &self.options().properties {
            match (old.get(name), new.get(name)) {
                (Some(o), Some(n)) => {
                    if let Some(update) = descriptor.ty.diff(o, n) {
                        diff.update.insert(name.clone(), update);
                    }
                }
                (None, Some(n)) => {
                    diff.set.insert(name.clone(), descriptor.ty.clone_value(n));
                }
                (Some(o), None) => {
                    diff.unset.insert(name.clone(), descriptor.ty.clone_value(o));
                }
                (None, None) => {}
            }
        }
        diff.into_diff()
    }

    fn patch(&self, old: &Value, diff: Option<&Diff>) -> Value {
        let Some(diff) = diff else {
            return self.clone_value(old);
        };
        let diff = self.record_diff(diff);
        let old = props(old);
        let mut patched = IndexMap::new();
        for (name, descriptor) in &self.options().properties {
            match change(diff, name) {
                Change::Set(value) => {
                    patched.insert(name.clone(), descriptor.ty.clone_value(value));
                }
                Change::Unset(_) => {}
                Change::Update(update) => {
                    if let Some(value) = old.and_then(|o| o.get(name)) {
                        patched.insert(name.clone(), descriptor.ty.patch(value, Some(update)));
                    }
                }
                Change::Same => {
                    if let Some(value) = old.and_then(|o| o.get(name)) {
                        patched.insert(name.clone(), descriptor.ty.clone_value(value));
                    }
                }
            }
        }
        Value::Record(patched)
    }

    fn reverse_diff(&self, diff: Option<&Diff>) -> Option<Diff> {
        let diff = self.record_diff(diff?);
        let mut reversed = RecordDiff {
            set: diff.unset.clone(),
            unset: diff.set.clone(),
            update: IndexMap::new(),
        };
        for (name, update) in &diff.update {
            let ty = match self.property(name) {
                Some(descriptor) => &descriptor.ty,
                None => fatal(ConfigError::UnknownProperty(name.clone())),
            };
            if let Some(update) = ty.reverse_diff(Some(update)) {
                reversed.update.insert(name.clone(), update);
            }
        }
        reversed.into_diff()
    }

    fn squash(&self, first: Option<&Diff>, second: Option<&Diff>) -> Option<Diff> {
        let (first, second) = match (first, second) {
            (None, other) | (other, None) => return other.cloned(),
            (Some(a), Some(b)) => (self.record_diff(a), self.record_diff(b)),
        };
        let mut squashed = RecordDiff::default();
        for (name, descriptor) in &self.options().properties {
            let ty = &descriptor.ty;
            let name = name.clone();
            match (change(first, &name), change(second, &name)) {
                (Change::Same, Change::Same) => {}
                (Change::Set(v), Change::Same) => {
                    squashed.set.insert(name, v.clone());
                }
                (Change::Unset(v), Change::Same) | (Change::Same, Change::Unset(v)) => {
                    squashed.unset.insert(name, v.clone());
                }
                (Change::Update(u), Change::Same) | (Change::Same, Change::Update(u)) => {
                    squashed.update.insert(name, u.clone());
                }
                (Change::Same, Change::Set(v)) => {
                    squashed.set.insert(name, v.clone());
                }
                (Change::Set(v), Change::Update(u)) => {
                    squashed.set.insert(name, ty.patch(v, Some(u)));
                }
                (Change::Set(_), Change::Unset(_)) => {}
                (Change::Unset(old), Change::Set(new)) => {
                    if let Some(update) = ty.diff(old, new) {
                        squashed.update.insert(name, update);
                    }
                }
                (Change::Update(a), Change::Update(b)) => {
                    if let Some(update) = ty.squash(Some(a), Some(b)) {
                        squashed.update.insert(name, update);
                    }
                }
                (Change::Update(u), Change::Unset(last)) => {
                    let original = ty.patch(last, ty.reverse_diff(Some(u)).as_ref());
                    squashed.unset.insert(name, original);
                }
                _ => fatal(ConfigError::DiffMismatch(self.name())),
            }
        }
        squashed.into_diff()
    }
}

struct RecordVisitor<'t> {
    resolved: &'t Resolved,
}

impl ReadVisitor for RecordVisitor<'_> {
    fn expected(&self) -> ValueKind {
        ValueKind::Record
    }

    fn from_map<'r>(
        &self,
        cx: &mut dyn Context,
        entries: &mut dyn Iterator<Item = (BoxReader<'r>, BoxReader<'r>)>,
    ) -> CheckResult<Value> {
        let Resolved {
            options,
            out_keys,
            in_keys,
        } = self.resolved;
        let mut values: HashMap<String, Value> = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut extra = Vec::new();
        let mut failures = Vec::new();
        for (key_reader, value_reader) in entries {
            let key = read_key(cx, key_reader.as_ref())?;
            let Some(name) = in_keys.get(&key) else {
                extra.push(key);
                continue;
            };
            let descriptor = &options.properties[name.as_str()];
            seen.insert(name.clone());
            match cx.enter(key.as_str(), |cx| descriptor.ty.read(cx, value_reader.as_ref())) {
                Ok(value) => {
                    values.insert(name.clone(), value);
                }
                Err(id) => failures.push(id),
            }
        }
        let missing: Vec<String> = options
            .properties
            .iter()
            .filter(|(name, d)| !d.optional && !seen.contains(*name))
            .map(|(name, _)| out_keys[name.as_str()].clone())
            .collect();
        if !options.no_extra_keys {
            if !extra.is_empty() {
                log::trace!("ignoring unknown record keys {:?}", extra);
            }
            extra.clear();
        }
        if !missing.is_empty() || !extra.is_empty() {
            return Err(cx.write(Check::PropertyKey { missing, extra }));
        }
        cx.aggregate(failures)?;
        let record = options
            .properties
            .keys()
            .filter_map(|name| values.remove_entry(name))
            .collect();
        Ok(Value::Record(record))
    }
}

impl IoType for RecordType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        let visitor = RecordVisitor {
            resolved: self.resolved.get(),
        };
        reader.read_record(cx, &visitor)
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        let resolved = self.resolved.get();
        let Some(props) = props(value) else {
            return;
        };
        let keys: Vec<String> = resolved
            .out_keys
            .iter()
            .filter(|(name, _)| props.contains_key(*name))
            .map(|(_, key)| key.clone())
            .collect();
        writer.write_record(&keys, &mut |key, w| {
            let Some(name) = resolved.in_keys.get(key) else {
                return;
            };
            if let (Some(descriptor), Some(value)) =
                (resolved.options.properties.get(name), props.get(name))
            {
                descriptor.ty.write(w, value);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::json::JsonReader;
    use crate::types::{DateType, Types};
    use crate::ReportContext;

    fn shape() -> Arc<RecordType> {
        Arc::new(RecordType::new(
            RecordTypeOptions::new()
                .property("name", Types::usv_string())
                .property("size", Types::uint32())
                .optional("color", Types::usv_string())
                .no_extra_keys(true),
        ))
    }

    fn read(ty: &RecordType, text: &str) -> (ReportContext, CheckResult<Value>) {
        let mut cx = ReportContext::new();
        let result = ty.read(&mut cx, &JsonReader::parse(text).unwrap());
        (cx, result)
    }

    #[test]
    fn test_read_keeps_declared_order() {
        let (_, result) = read(&shape(), r#"{"size": 3, "name": "box"}"#);
        let keys: Vec<_> = result.unwrap().as_record().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "size"]);
    }

    #[test]
    fn test_missing_and_extra_keys() {
        let (cx, result) = read(&shape(), r#"{"name": "box", "weight": 1}"#);
        let id = result.unwrap_err();
        assert_eq!(
            cx.get(id),
            Some(&Check::PropertyKey {
                missing: vec!["size".to_string()],
                extra: vec!["weight".to_string()],
            })
        );
    }

    #[test]
    fn test_extra_keys_dropped_when_allowed() {
        let ty = RecordType::new(RecordTypeOptions::new().property("a", Types::boolean()));
        let (_, result) = read(&ty, r#"{"a": true, "b": 1}"#);
        assert_eq!(result, Ok(Value::record([("a", Value::Boolean(true))])));
    }

    #[test]
    fn test_invalid_values_are_aggregated() {
        let (cx, result) = read(&shape(), r#"{"name": 1, "size": -1}"#);
        let id = result.unwrap_err();
        let report = cx.report(id).unwrap();
        assert!(report.starts_with("#2: 2 nested error(s)"), "{}", report);
        assert!(report.contains("name#0: expected String"), "{}", report);
        assert!(report.contains("size#1: "), "{}", report);
    }

    #[test]
    fn test_test_matches_read() {
        let ty = shape();
        let mut cx = ReportContext::new();
        let value = Value::record([("name", Value::from(1)), ("size", Value::from(-1))]);
        let id = ty.test(&mut cx, &value).unwrap_err();
        match cx.get(id) {
            Some(Check::Aggregate { children }) => assert_eq!(children.len(), 2),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_out_key_is_an_error() {
        let result = RecordType::try_new(
            RecordTypeOptions::new()
                .property("a_b", Types::boolean())
                .property("aB", Types::boolean())
                .change_case(CaseStyle::CamelCase),
        );
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateOutKey { ref key, .. }) if key == "aB"
        ));
    }

    #[test]
    fn test_pick_and_omit() {
        let base = shape();
        let picked = base.pick(&["name"]);
        assert!(picked.is_valid(&Value::record([("name", Value::from("x"))])));
        let omitted = base.omit(&["name", "color"]);
        assert_eq!(
            omitted.options().properties.keys().collect::<Vec<_>>(),
            vec!["size"]
        );
        assert!(matches!(
            base.try_pick(&["nope"]),
            Err(ConfigError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_extend_keeps_base_keys() {
        let base = Arc::new(RecordType::new(
            RecordTypeOptions::new()
                .property("createdAt", Arc::new(DateType::new()))
                .change_case(CaseStyle::SnakeCase),
        ));
        let extended = base.extend(RecordTypeOptions::new().property("fileName", Types::usv_string()));
        assert_eq!(extended.out_key("createdAt"), Some("created_at"));
        assert_eq!(extended.out_key("fileName"), Some("fileName"));
        assert!(matches!(
            base.try_extend(RecordTypeOptions::new().property("createdAt", Types::boolean())),
            Err(ConfigError::ExtendCollision(_))
        ));
    }

    #[test]
    fn test_diff_patch_reverse() {
        let ty = shape();
        let old = Value::record([("name", Value::from("a")), ("size", Value::from(1))]);
        let new = Value::record([
            ("name", Value::from("a")),
            ("size", Value::from(5)),
            ("color", Value::from("red")),
        ]);
        let diff = ty.diff(&old, &new);
        match &diff {
            Some(Diff::Record(d)) => {
                assert_eq!(d.update.get("size"), Some(&Diff::Delta(4)));
                assert_eq!(d.set.get("color"), Some(&Value::from("red")));
                assert!(d.unset.is_empty());
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(ty.equals(&ty.patch(&old, diff.as_ref()), &new));
        let back = ty.reverse_diff(diff.as_ref());
        assert!(ty.equals(&ty.patch(&new, back.as_ref()), &old));
        assert_eq!(ty.diff(&old, &old), None);
    }

    #[test]
    fn test_squash() {
        let ty = shape();
        let a = Value::record([("name", Value::from("a")), ("size", Value::from(1))]);
        let b = Value::record([
            ("name", Value::from("b")),
            ("size", Value::from(2)),
            ("color", Value::from("red")),
        ]);
        let c = Value::record([("name", Value::from("c")), ("size", Value::from(4))]);
        let ab = ty.diff(&a, &b);
        let bc = ty.diff(&b, &c);
        let ac = ty.squash(ab.as_ref(), bc.as_ref());
        assert!(ty.equals(&ty.patch(&a, ac.as_ref()), &c));
        match ac {
            Some(Diff::Record(d)) => {
                assert!(d.set.is_empty() && d.unset.is_empty());
                assert_eq!(d.update.get("size"), Some(&Diff::Delta(3)));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_lazy_self_reference() {
        use std::sync::OnceLock;
        static NODE: OnceLock<Arc<RecordType>> = OnceLock::new();
        let node = NODE.get_or_init(|| {
            Arc::new(RecordType::lazy(|| {
                RecordTypeOptions::new()
                    .property("value", Types::sint32())
                    .optional(
                        "next",
                        NODE.get().cloned().expect("node type initialized") as TypeRef,
                    )
            }))
        });
        let list = Value::record([
            ("value", Value::from(1)),
            ("next", Value::record([("value", Value::from(2))])),
        ]);
        assert!(node.is_valid(&list));
        let bad = Value::record([("value", Value::from(1)), ("next", Value::Record(IndexMap::new()))]);
        assert!(!node.is_valid(&bad));
    }
}
