//! String types.
//!
//! Two flavors differ in how length is measured:
//!
//! - [`Ucs2StringType`] counts UTF-16 code units, the length a browser or a
//!   JVM would report
//! - [`UsvStringType`] counts Unicode scalar values and can additionally
//!   enforce a normalization form, trimming and lower case
//!
//! All constraint violations of a value are reported together.

use std::fmt;

use regex::Regex;
use unicode_normalization::{is_nfc, is_nfd, is_nfkc, is_nfkd};

use crate::check::{Check, NormalizationForm};
use crate::context::{CheckId, CheckResult, Context};
use crate::error::ConfigError;
use crate::io::{Reader, Writer};
use crate::types::{base_type, IoType, LeafVisitor, Ordered, Type, VersionedType};
use crate::value::{Value, ValueKind};

#[derive(Clone)]
struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    fn new(source: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            regex: Regex::new(source)?,
            source: source.to_string(),
        })
    }

    fn check(&self, cx: &mut dyn Context, s: &str) -> Option<CheckId> {
        if self.regex.is_match(s) {
            None
        } else {
            Some(cx.write(Check::StringPattern {
                pattern: self.source.clone(),
                actual: s.to_string(),
            }))
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

/// Length bounds and pattern shared by both string flavors.
#[derive(Debug, Clone)]
struct Bounds {
    min_length: usize,
    max_length: usize,
    pattern: Option<Pattern>,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_length: 0,
            max_length: usize::MAX,
            pattern: None,
        }
    }
}

impl Bounds {
    fn check(&self, cx: &mut dyn Context, s: &str, length: usize, failures: &mut Vec<CheckId>) {
        if length < self.min_length || length > self.max_length {
            failures.push(cx.write(Check::Size {
                min: self.min_length,
                max: self.max_length,
                actual: length,
            }));
        }
        if let Some(pattern) = &self.pattern {
            failures.extend(pattern.check(cx, s));
        }
    }
}

fn as_str<'v>(cx: &mut dyn Context, value: &'v Value) -> CheckResult<&'v str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(base_type(cx, ValueKind::String, other)),
    }
}

/// A string measured in UTF-16 code units.
///
/// # Example
///
/// ```rust
/// use kryo::types::{Type, Ucs2StringType};
/// use kryo::Value;
///
/// let ty = Ucs2StringType::new().max_len(2);
/// assert!(ty.is_valid(&Value::from("ab")));
/// // One scalar value, two UTF-16 code units.
/// assert!(ty.is_valid(&Value::from("\u{1F600}")));
/// assert!(!ty.is_valid(&Value::from("a\u{1F600}")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Ucs2StringType {
    bounds: Bounds,
}

impl Ucs2StringType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.bounds.min_length = min;
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.bounds.max_length = max;
        self
    }

    /// Requires values to match `pattern`.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.bounds.pattern = Some(Pattern::new(pattern)?);
        Ok(self)
    }
}

impl Type for Ucs2StringType {
    fn name(&self) -> &'static str {
        "Ucs2String"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let s = as_str(cx, value)?;
        let mut failures = Vec::new();
        self.bounds
            .check(cx, s, s.encode_utf16().count(), &mut failures);
        cx.combine(failures)
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        left.as_str() == right.as_str()
    }
}

impl VersionedType for Ucs2StringType {}

impl IoType for Ucs2StringType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_string(cx, &LeafVisitor::new(self, ValueKind::String, reader))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        if let Value::String(s) = value {
            writer.write_string(s);
        }
    }
}

impl Ordered for Ucs2StringType {
    /// Code-unit order.
    fn lte(&self, left: &Value, right: &Value) -> bool {
        match (left.as_str(), right.as_str()) {
            (Some(l), Some(r)) => l.encode_utf16().cmp(r.encode_utf16()).is_le(),
            _ => false,
        }
    }
}

/// A string measured in Unicode scalar values.
///
/// Values must be in NFC unless another form (or none) is configured.
///
/// # Example
///
/// ```rust
/// use kryo::types::{Type, UsvStringType};
/// use kryo::Value;
///
/// let tag = UsvStringType::new()
///     .trimmed(true)
///     .lowercase(true)
///     .max_len(8);
/// assert!(tag.is_valid(&Value::from("rust")));
/// assert!(!tag.is_valid(&Value::from(" Rust ")));
/// // "e" followed by a combining accent is not NFC.
/// assert!(!tag.is_valid(&Value::from("e\u{301}")));
/// ```
#[derive(Debug, Clone)]
pub struct UsvStringType {
    bounds: Bounds,
    normalization: Option<NormalizationForm>,
    trimmed: bool,
    lowercase: bool,
}

impl Default for UsvStringType {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            normalization: Some(NormalizationForm::Nfc),
            trimmed: false,
            lowercase: false,
        }
    }
}

impl UsvStringType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.bounds.min_length = min;
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.bounds.max_length = max;
        self
    }

    /// Requires values to match `pattern`.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, ConfigError> {
        self.bounds.pattern = Some(Pattern::new(pattern)?);
        Ok(self)
    }

    /// Sets the required normalization form; `None` disables the check.
    pub fn normalization(mut self, form: Option<NormalizationForm>) -> Self {
        self.normalization = form;
        self
    }

    /// Rejects leading and trailing whitespace.
    pub fn trimmed(mut self, trimmed: bool) -> Self {
        self.trimmed = trimmed;
        self
    }

    /// Rejects characters that change under lower-casing.
    pub fn lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }
}

fn is_normalized(s: &str, form: NormalizationForm) -> bool {
    match form {
        NormalizationForm::Nfc => is_nfc(s),
        NormalizationForm::Nfd => is_nfd(s),
        NormalizationForm::Nfkc => is_nfkc(s),
        NormalizationForm::Nfkd => is_nfkd(s),
    }
}

impl Type for UsvStringType {
    fn name(&self) -> &'static str {
        "UsvString"
    }

    fn test(&self, cx: &mut dyn Context, value: &Value) -> CheckResult<()> {
        let s = as_str(cx, value)?;
        let mut failures = Vec::new();
        if let Some(form) = self.normalization {
            if !is_normalized(s, form) {
                failures.push(cx.write(Check::UnicodeNormalization { form }));
            }
        }
        if self.trimmed && s.trim() != s {
            failures.push(cx.write(Check::Trimmed {
                actual: s.to_string(),
            }));
        }
        if self.lowercase && s.to_lowercase() != s {
            failures.push(cx.write(Check::LowerCase {
                actual: s.to_string(),
            }));
        }
        self.bounds.check(cx, s, s.chars().count(), &mut failures);
        cx.combine(failures)
    }

    fn equals(&self, left: &Value, right: &Value) -> bool {
        left.as_str() == right.as_str()
    }
}

impl VersionedType for UsvStringType {}

impl IoType for UsvStringType {
    fn read(&self, cx: &mut dyn Context, reader: &dyn Reader) -> CheckResult<Value> {
        reader.read_string(cx, &LeafVisitor::new(self, ValueKind::String, reader))
    }

    fn write(&self, writer: &mut dyn Writer, value: &Value) {
        if let Value::String(s) = value {
            writer.write_string(s);
        }
    }
}

impl Ordered for UsvStringType {
    /// Scalar-value order.
    fn lte(&self, left: &Value, right: &Value) -> bool {
        match (left.as_str(), right.as_str()) {
            (Some(l), Some(r)) => l <= r,
            _ => false,
        }
    }
}
