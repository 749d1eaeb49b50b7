//! Diagnostic facts produced by failed validation.
//!
//! A [`Check`] records one reason an input was rejected. Checks that summarize
//! deeper failures (aggregates, union mismatches, wrapped property errors)
//! reference their causes by [`CheckId`], so a context can render the whole
//! cause tree from a single id.

use std::fmt::{self, Display};

use crate::context::CheckId;
use crate::value::{Value, ValueKind};

/// Unicode normalization forms enforced by `UsvStringType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormalizationForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

impl Display for NormalizationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NormalizationForm::Nfc => "NFC",
            NormalizationForm::Nfd => "NFD",
            NormalizationForm::Nfkc => "NFKC",
            NormalizationForm::Nfkd => "NFKD",
        })
    }
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// The input has the wrong shape.
    BaseType {
        expected: ValueKind,
        actual: Option<ValueKind>,
    },
    /// A collection or string length is out of bounds.
    Size {
        min: usize,
        max: usize,
        actual: usize,
    },
    /// A number is outside an inclusive range or not integral.
    Range { min: f64, max: f64, actual: f64 },
    /// A float uses a special value its type does not allow.
    Float64 {
        allow_nan: bool,
        allow_infinity: bool,
        allow_negative_zero: bool,
        actual: f64,
    },
    /// The raw input is not an instance of a format-specific class.
    InstanceOf { class: &'static str },
    /// A literal's base type rejected the input.
    LiteralType { cause: CheckId },
    /// The input has the right type but not one of the allowed values.
    LiteralValue { allowed: Vec<Value>, actual: Value },
    /// A string contains upper-case characters.
    LowerCase { actual: String },
    /// Record properties are missing or unexpected.
    PropertyKey {
        missing: Vec<String>,
        extra: Vec<String>,
    },
    /// A map key does not satisfy the key type.
    PropertyKeyFormat { key: String, cause: CheckId },
    /// A map value does not satisfy the value type.
    PropertyValue { key: String, cause: CheckId },
    /// A string does not match its pattern.
    StringPattern { pattern: String, actual: String },
    /// A string has leading or trailing whitespace.
    Trimmed { actual: String },
    /// A string is not in the required normalization form.
    UnicodeNormalization { form: NormalizationForm },
    /// No union variant accepted the input.
    UnionMatch { cause: CheckId },
    /// The tag property of a tagged union is absent.
    UnionTagPresent { tag: String },
    /// The tag property holds a value no variant declares.
    UnionTagValue {
        tag: String,
        allowed: Vec<Value>,
        actual: Value,
    },
    /// A date timestamp is not finite or outside the safe-integer range.
    UnixTimestamp { actual: f64 },
    /// Several independent failures.
    Aggregate { children: Vec<CheckId> },
    /// A failure reported by a user-defined type.
    Custom { message: String },
}

impl Check {
    /// Returns the checks this one wraps, in order.
    pub fn children(&self) -> Vec<CheckId> {
        match self {
            Check::Aggregate { children } => children.clone(),
            Check::LiteralType { cause }
            | Check::PropertyKeyFormat { cause, .. }
            | Check::PropertyValue { cause, .. }
            | Check::UnionMatch { cause } => vec![*cause],
            _ => Vec::new(),
        }
    }

    /// Short machine-readable name of the check kind.
    pub fn code(&self) -> &'static str {
        match self {
            Check::BaseType { .. } => "BaseType",
            Check::Size { .. } => "Size",
            Check::Range { .. } => "Range",
            Check::Float64 { .. } => "Float64",
            Check::InstanceOf { .. } => "InstanceOf",
            Check::LiteralType { .. } => "LiteralType",
            Check::LiteralValue { .. } => "LiteralValue",
            Check::LowerCase { .. } => "LowerCase",
            Check::PropertyKey { .. } => "PropertyKey",
            Check::PropertyKeyFormat { .. } => "PropertyKeyFormat",
            Check::PropertyValue { .. } => "PropertyValue",
            Check::StringPattern { .. } => "StringPattern",
            Check::Trimmed { .. } => "Trimmed",
            Check::UnicodeNormalization { .. } => "UnicodeNormalization",
            Check::UnionMatch { .. } => "UnionMatch",
            Check::UnionTagPresent { .. } => "UnionTagPresent",
            Check::UnionTagValue { .. } => "UnionTagValue",
            Check::UnixTimestamp { .. } => "UnixTimestamp",
            Check::Aggregate { .. } => "Aggregate",
            Check::Custom { .. } => "Custom",
        }
    }
}

fn join<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::BaseType { expected, actual } => match actual {
                Some(actual) => write!(f, "expected {}, got {}", expected, actual),
                None => write!(f, "expected {}", expected),
            },
            Check::Size { min, max, actual } => write!(
                f,
                "size {} is outside the allowed range [{}, {}]",
                actual, min, max
            ),
            Check::Range { min, max, actual } => write!(
                f,
                "{} is not an integer in the range [{}, {}]",
                actual, min, max
            ),
            Check::Float64 {
                allow_nan,
                allow_infinity,
                allow_negative_zero,
                actual,
            } => write!(
                f,
                "float {} is not allowed (NaN: {}, infinity: {}, -0: {})",
                if *actual == 0.0 { "-0".to_string() } else { actual.to_string() },
                allow_nan,
                allow_infinity,
                allow_negative_zero
            ),
            Check::InstanceOf { class } => write!(f, "expected an instance of {}", class),
            Check::LiteralType { .. } => write!(f, "literal base type mismatch"),
            Check::LiteralValue { allowed, actual } => {
                write!(f, "{} is not one of [{}]", actual, join(allowed))
            }
            Check::LowerCase { actual } => write!(f, "{:?} is not lower case", actual),
            Check::PropertyKey { missing, extra } => {
                let mut parts = Vec::new();
                if !missing.is_empty() {
                    parts.push(format!("missing properties [{}]", missing.join(", ")));
                }
                if !extra.is_empty() {
                    parts.push(format!("unexpected properties [{}]", extra.join(", ")));
                }
                write!(f, "{}", parts.join("; "))
            }
            Check::PropertyKeyFormat { key, .. } => write!(f, "invalid key format {:?}", key),
            Check::PropertyValue { key, .. } => write!(f, "invalid value for key {:?}", key),
            Check::StringPattern { pattern, actual } => {
                write!(f, "{:?} does not match pattern /{}/", actual, pattern)
            }
            Check::Trimmed { actual } => write!(f, "{:?} is not trimmed", actual),
            Check::UnicodeNormalization { form } => {
                write!(f, "string is not in normalization form {}", form)
            }
            Check::UnionMatch { .. } => write!(f, "no union variant matched"),
            Check::UnionTagPresent { tag } => write!(f, "missing union tag property {:?}", tag),
            Check::UnionTagValue {
                tag,
                allowed,
                actual,
            } => write!(
                f,
                "union tag {:?} has value {}, expected one of [{}]",
                tag,
                actual,
                join(allowed)
            ),
            Check::UnixTimestamp { actual } => {
                write!(f, "timestamp {} is not a safe integer", actual)
            }
            Check::Aggregate { children } => write!(f, "{} nested error(s)", children.len()),
            Check::Custom { message } => write!(f, "{}", message),
        }
    }
}
