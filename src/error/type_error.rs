//! Configuration and report error types.

/// A static misconfiguration of a type.
///
/// These are programmer errors rather than data errors. Constructors that
/// validate eagerly (`try_new`, `try_extend`, ...) return them; types whose
/// options are resolved lazily raise them through [`fatal`] on first use.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Two properties resolve to the same serialized key.
    #[error("serialized key '{key}' is used by both '{first}' and '{second}'")]
    DuplicateOutKey {
        key: String,
        first: String,
        second: String,
    },

    /// `extend` received a property that the base record already declares.
    #[error("property '{0}' is declared by both the base record and the extension")]
    ExtendCollision(String),

    /// `pick` or `omit` named a property the record does not declare.
    #[error("unknown property '{0}'")]
    UnknownProperty(String),

    /// A tagged-union variant does not declare the tag property.
    #[error("variant {variant} does not declare the tag property '{tag}'")]
    MissingTag { variant: usize, tag: String },

    /// A tagged-union variant's tag property is not a literal over a ts-enum.
    #[error("variant {variant}: tag property '{tag}' must be a literal of a ts-enum type")]
    TagNotLiteral { variant: usize, tag: String },

    /// Two tagged-union variants share the same tag value.
    #[error("tag value {0} is used by more than one variant")]
    DuplicateTagValue(String),

    /// Tagged-union variants disagree on the serialized name or type of the tag.
    #[error("variants disagree on the serialized name or type of tag '{0}'")]
    TagConflict(String),

    /// A string pattern failed to compile.
    #[error("invalid string pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A lazy options thunk failed earlier and cannot run again.
    #[error("lazy options of {0} were consumed by a failed initialization")]
    LazyOptionsConsumed(&'static str),

    /// A diff of the wrong shape was handed to a type.
    #[error("{0} cannot apply a diff of this kind")]
    DiffMismatch(&'static str),

    /// A union was asked to write a value none of its variants accepts.
    #[error("no variant of {0} accepts the value being written")]
    UnmatchedWrite(&'static str),

    /// A registry name was registered twice.
    #[error("type '{0}' already registered")]
    DuplicateName(String),

    /// A reference names a type missing from its registry.
    #[error("type '{0}' not found in registry")]
    TypeNotFound(String),

    /// A reference outlived the registry it points into.
    #[error("registry backing reference '{0}' was dropped")]
    RegistryDropped(String),
}

/// Raises a configuration error as an unrecoverable failure.
///
/// Used where a lazily-configured type discovers its misconfiguration on first
/// use and has no error channel other than its data results.
#[track_caller]
pub fn fatal(error: ConfigError) -> ! {
    panic!("kryo configuration error: {}", error)
}

/// A rejected input together with its rendered, path-qualified report.
///
/// # Example
///
/// ```rust
/// use kryo::{read_or_fail, io::json::JsonReader, types::Float64Type};
///
/// let error = read_or_fail(&Float64Type::new(), &JsonReader::parse("true").unwrap())
///     .unwrap_err();
/// assert!(error.report().contains("#0"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid input:\n{report}")]
pub struct ReportError {
    report: String,
}

impl ReportError {
    /// Text used when a failed check produced no report lines.
    pub const FALLBACK: &'static str = "invalid value";

    /// Wraps a rendered report, falling back to a generic message when empty.
    pub fn new(report: Option<String>) -> Self {
        let report = match report {
            Some(text) if !text.is_empty() => text,
            _ => Self::FALLBACK.to_string(),
        };
        Self { report }
    }

    /// Returns the multi-line report.
    pub fn report(&self) -> &str {
        &self.report
    }
}

// Both errors cross thread boundaries in callers' error chains.
const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ConfigError>();
    assert_sync::<ConfigError>();
    assert_send::<ReportError>();
    assert_sync::<ReportError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_error_fallback() {
        assert_eq!(ReportError::new(None).report(), ReportError::FALLBACK);
        assert_eq!(
            ReportError::new(Some(String::new())).report(),
            ReportError::FALLBACK
        );
    }

    #[test]
    fn test_report_error_display() {
        let error = ReportError::new(Some("a.b#1: bad".to_string()));
        assert_eq!(error.to_string(), "invalid input:\na.b#1: bad");
    }

    #[test]
    fn test_config_error_messages() {
        let error = ConfigError::DuplicateOutKey {
            key: "x".to_string(),
            first: "a".to_string(),
            second: "b".to_string(),
        };
        assert!(error.to_string().contains("'a'"));
        assert_eq!(
            ConfigError::UnmatchedWrite("TryUnion").to_string(),
            "no variant of TryUnion accepts the value being written"
        );
    }

    #[test]
    #[should_panic(expected = "kryo configuration error")]
    fn test_fatal_panics() {
        fatal(ConfigError::TagConflict("type".to_string()));
    }
}
