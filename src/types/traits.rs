//! Capability traits shared by every kryo type.
//!
//! Capabilities are layered:
//!
//! - [`Type`]: test, compare and clone values
//! - [`VersionedType`]: diff, patch, reverse and squash changes
//! - [`IoType`]: read from a [`Reader`] and write to a [`Writer`]
//! - [`Ordered`]: a total order, required by set item types
//!
//! Composite types hold their children as [`TypeRef`]s (`Arc<dyn IoType>`),
//! so one item type can be shared by many containers and across threads.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::context::{CheckResult, Context, NoopContext, ReportContext};
use crate::error::{fatal, ConfigError, ReportError};
use crate::io::{Reader, Writer};
use crate::types::literal::LiteralType;
use crate::types::record::RecordDiff;
use crate::types::ts_enum::TsEnumType;
use crate::value::Value;

/// A shared, thread-safe handle to a readable and writable type.
pub type TypeRef = Arc<dyn IoType>;

/// The base capability: validation and value semantics.
///
/// The `Send + Sync` bound lets types be shared through [`TypeRef`]s and used
/// from several threads at once.
pub trait Type: Send + Sync {
    /// Short name used in configuration errors and logs.
    fn name(&self) -> &'static str;

    /// Validates `value`, writing checks to `cx` on failure.
    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()>;

    /// Type-aware equality of two valid values.
    fn equals(&self, left: &Value, right: &Value) -> bool;

    /// Deep-copies a valid value.
    fn clone_value(&self, value: &Value) -> Value {
        value.clone()
    }

    /// Validates `value` without collecting diagnostics.
    fn is_valid(&self, value: &Value) -> bool {
        self.test(&mut NoopContext, value).is_ok()
    }

    /// Validates `value` and renders a report on failure.
    fn check(&self, value: &Value) -> Result<(), ReportError> {
        let mut cx = ReportContext::new();
        self.test(&mut cx, value).map_err(|id| cx.fail(id))
    }

    /// Returns this type as a literal, if it is one.
    fn as_literal(&self) -> Option<&LiteralType> {
        None
    }

    /// Returns this type as a ts-enum, if it is one.
    fn as_ts_enum(&self) -> Option<&TsEnumType> {
        None
    }
}

/// A change between two values of one type.
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Replace the whole value.
    Replace { old: Value, new: Value },
    /// Add a signed amount to an integer.
    ///
    /// The amount is exact: the difference of two integers in the 54-bit
    /// range does not always fit a float.
    Delta(i64),
    /// Set, unset and update individual record properties.
    Record(RecordDiff),
}

/// Change tracking between values.
///
/// A diff of `None` means the values are equal. The provided methods
/// implement whole-value replacement, which is correct for every type; types
/// with a finer representation override them.
pub trait VersionedType: Type {
    /// Computes the change turning `old` into `new`.
    fn diff(&self, old: &Value, new: &Value) -> Option<Diff> {
        if self.equals(old, new) {
            None
        } else {
            Some(Diff::Replace {
                old: self.clone_value(old),
                new: self.clone_value(new),
            })
        }
    }

    /// Applies `diff` to `old`.
    fn patch(&self, old: &Value, diff: Option<&Diff>) -> Value {
        match diff {
            None => self.clone_value(old),
            Some(Diff::Replace { new, .. }) => self.clone_value(new),
            Some(_) => fatal(ConfigError::DiffMismatch(self.name())),
        }
    }

    /// Returns the change that undoes `diff`.
    fn reverse_diff(&self, diff: Option<&Diff>) -> Option<Diff> {
        match diff {
            None => None,
            Some(Diff::Replace { old, new }) => Some(Diff::Replace {
                old: new.clone(),
                new: old.clone(),
            }),
            Some(_) => fatal(ConfigError::DiffMismatch(self.name())),
        }
    }

    /// Combines two consecutive changes into one.
    fn squash(&self, first: Option<&Diff>, second: Option<&Diff>) -> Option<Diff> {
        match (first, second) {
            (None, other) | (other, None) => other.cloned(),
            (Some(Diff::Replace { old, .. }), Some(Diff::Replace { new, .. })) => {
                if self.equals(old, new) {
                    None
                } else {
                    Some(Diff::Replace {
                        old: old.clone(),
                        new: new.clone(),
                    })
                }
            }
            _ => fatal(ConfigError::DiffMismatch(self.name())),
        }
    }
}

/// A type with a wire representation.
pub trait IoType: VersionedType {
    /// Decodes and validates a value from `reader`.
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value>;

    /// Encodes a valid value.
    fn write(&self, writer: &mut dyn Writer, value: &Value);
}

/// A type whose values are totally ordered.
pub trait Ordered: Type {
    /// Returns true if `left` sorts before or equal to `right`.
    fn lte(&self, left: &Value, right: &Value) -> bool;

    /// Derives a comparison from [`lte`](Ordered::lte) and equality.
    fn compare(&self, left: &Value, right: &Value) -> Ordering {
        if !self.lte(left, right) {
            Ordering::Greater
        } else if self.equals(left, right) {
            Ordering::Equal
        } else {
            Ordering::Less
        }
    }
}

/// An ordered type with a wire representation, usable as a set item type.
pub trait OrdIoType: IoType + Ordered {}

impl<T: IoType + Ordered + ?Sized> OrdIoType for T {}
