//! Schema-validated contracts for AI-backed transit capabilities.
//!
//! A [`Schema`] declares the shape a capability accepts or returns: named
//! fields with semantic types, human-readable descriptions, defaults, and
//! range or enumeration constraints. Validation is a pure function from an
//! untyped [`serde_json::Value`] to a normalized value with defaults
//! applied, or a [`SchemaError`] listing every offending field.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod field;
mod schema;

/// Error type, result alias, and field-level violation record.
pub use error::{SchemaError, SchemaResult, Violation};
/// Field descriptors and their semantic types.
pub use field::{FieldSpec, FieldType};
/// Schema definition and validation entry point.
pub use schema::{Schema, SchemaBuilder};
