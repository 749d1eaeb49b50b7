//! Error types for misconfigured types and rejected inputs.
//!
//! Data errors never use these types: they travel as [`CheckId`](crate::CheckId)s
//! through `CheckResult`. [`ConfigError`] describes a static misuse of the API,
//! [`ReportError`] is the rendered diagnostic report returned by
//! [`read_or_fail`](crate::read_or_fail).

mod type_error;

pub use type_error::{fatal, ConfigError, ReportError};
