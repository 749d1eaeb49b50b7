//! # Kryo
//!
//! Runtime type descriptors that validate values and read or write them in
//! several serialization formats, reporting every problem found rather than
//! stopping at the first one.
//!
//! ## Overview
//!
//! A type (a [`RecordType`](types::RecordType), an
//! [`ArrayType`](types::ArrayType), a [`Ucs2StringType`](types::Ucs2StringType),
//! ...) never sees the wire format. It drives a [`Reader`](io::Reader) through a
//! visitor and pushes values into a [`Writer`](io::Writer); the adapters in
//! [`io`] translate those calls for JSON, BSON, query strings and URL search
//! parameters. Validation failures are written as [`Check`]s into a
//! [`Context`] and travel as [`CheckId`]s, so one failing input produces a
//! single, path-qualified report.
//!
//! ## Core Types
//!
//! - [`Value`]: the dynamic value domain every type tests and produces
//! - [`Check`]: one diagnostic fact; aggregates and union failures point to their causes
//! - [`ReportContext`]: keeps checks and renders reports like `outer.inner#3: expected Boolean`
//! - [`Types`]: entry point for the built-in leaf types and integer aliases
//! - [`TypeRegistry`]: named types and recursive references
//!
//! ## Example
//!
//! ```rust
//! use kryo::io::json::{JsonReader, JsonWriter};
//! use kryo::types::{ArrayType, ArrayTypeOptions, IoType, Types};
//! use kryo::{read_or_fail, Value};
//!
//! let scores = ArrayType::new(ArrayTypeOptions::new(Types::uint8(), 3));
//!
//! let value = read_or_fail(&scores, &JsonReader::parse("[1, 2, 3]").unwrap()).unwrap();
//! assert_eq!(value, Value::List(vec![Value::from(1), Value::from(2), Value::from(3)]));
//!
//! let mut writer = JsonWriter::new();
//! scores.write(&mut writer, &value);
//! assert_eq!(writer.into_string(), "[1,2,3]");
//!
//! let error = read_or_fail(&scores, &JsonReader::parse("[1, 256]").unwrap()).unwrap_err();
//! assert!(error.report().contains("[1]#0"));
//! ```

pub mod case_style;
pub mod check;
pub mod context;
pub mod error;
pub mod io;
pub mod lazy;
pub mod path;
pub mod registry;
pub mod types;
pub mod value;

pub use case_style::CaseStyle;
pub use check::{Check, NormalizationForm};
pub use context::{CheckId, CheckResult, Context, NoopContext, ReportContext};
pub use error::{fatal, ConfigError, ReportError};
pub use lazy::Lazy;
pub use path::{CheckPath, PathSegment};
pub use registry::{RefType, TypeRegistry};
pub use types::{read_or_fail, Types};
pub use value::{Date, Value, ValueKind};
