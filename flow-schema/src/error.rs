//! Shared error definitions for the contract layer.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the contract layer.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// A single field-level rule broken during validation.
///
/// Paths are dotted for nested records and indexed for sequence elements,
/// e.g. `plannedRoute[2].latitude`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Violation {
    path: String,
    reason: String,
}

impl Violation {
    /// Creates a violation for the supplied field path.
    #[must_use]
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns the path of the offending field.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the human-readable reason for rejection.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.path, self.reason)
    }
}

/// Errors produced while validating a value against a [`crate::Schema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The value does not match the declared shape.
    #[error("schema validation failed: {}", format_violations(violations))]
    Validation {
        /// Every field-level rule that was broken, in declaration order.
        violations: Vec<Violation>,
    },
}

impl SchemaError {
    /// Convenience constructor for validation failures.
    #[must_use]
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation { violations }
    }

    /// Returns the collected violations.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation { violations } => violations,
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
