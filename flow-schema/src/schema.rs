//! Schema definition and validation.

use chrono::DateTime;
use serde_json::Value;

use crate::error::{SchemaError, SchemaResult, Violation};
use crate::field::{FieldSpec, FieldType};

/// Declared shape of a capability input or output.
///
/// Fields keep their declaration order; validation reports violations in
/// that order so error messages are stable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Returns a builder for assembling a schema.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder { fields: Vec::new() }
    }

    /// Returns the declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name() == name)
    }

    /// Validates an untyped value against this schema.
    ///
    /// Returns a normalized copy with declared defaults inserted for absent
    /// optional fields. Undeclared fields pass through untouched. All
    /// violations are collected before failing, so a single error lists
    /// every offending field.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Validation`] when the value is not an object,
    /// a required field is missing, or any field breaks its declared type,
    /// enumeration, or range constraint.
    pub fn validate(&self, raw: &Value) -> SchemaResult<Value> {
        let mut violations = Vec::new();
        let normalized = self.validate_object("", raw, &mut violations);

        if violations.is_empty() {
            Ok(normalized.unwrap_or(Value::Null))
        } else {
            Err(SchemaError::validation(violations))
        }
    }

    fn validate_object(
        &self,
        path: &str,
        raw: &Value,
        violations: &mut Vec<Violation>,
    ) -> Option<Value> {
        let Some(map) = raw.as_object() else {
            let at = if path.is_empty() { "$" } else { path };
            violations.push(Violation::new(at, "expected an object"));
            return None;
        };

        let mut normalized = map.clone();
        for spec in &self.fields {
            let field_path = join(path, spec.name());
            match map.get(spec.name()) {
                Some(value) => {
                    if let Some(checked) = validate_value(&field_path, value, spec, violations) {
                        normalized.insert(spec.name().to_owned(), checked);
                    }
                }
                None => {
                    if let Some(default) = spec.default_value() {
                        normalized.insert(spec.name().to_owned(), default.clone());
                    } else if spec.is_required() {
                        violations.push(Violation::new(field_path, "required field is missing"));
                    }
                }
            }
        }

        Some(Value::Object(normalized))
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    /// Adds a field declaration.
    #[must_use]
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Finalises the schema.
    #[must_use]
    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{prefix}.{name}")
    }
}

fn validate_value(
    path: &str,
    value: &Value,
    spec: &FieldSpec,
    violations: &mut Vec<Violation>,
) -> Option<Value> {
    check_type(path, value, spec.field_type(), spec, violations)
}

fn check_type(
    path: &str,
    value: &Value,
    field_type: &FieldType,
    spec: &FieldSpec,
    violations: &mut Vec<Violation>,
) -> Option<Value> {
    match field_type {
        FieldType::Text => {
            if value.is_string() {
                Some(value.clone())
            } else {
                reject(path, field_type, violations)
            }
        }
        FieldType::Number => {
            let Some(number) = value.as_f64() else {
                return reject(path, field_type, violations);
            };
            if let Some(range) = spec.range() {
                if !range.contains(&number) {
                    violations.push(Violation::new(
                        path,
                        format!("must be between {} and {}", range.start(), range.end()),
                    ));
                    return None;
                }
            }
            Some(value.clone())
        }
        FieldType::Boolean => {
            if value.is_boolean() {
                Some(value.clone())
            } else {
                reject(path, field_type, violations)
            }
        }
        FieldType::Timestamp => {
            let parses = value
                .as_str()
                .is_some_and(|text| DateTime::parse_from_rfc3339(text).is_ok());
            if parses {
                Some(value.clone())
            } else {
                reject(path, field_type, violations)
            }
        }
        FieldType::Enumeration(allowed) => {
            let matches = value
                .as_str()
                .is_some_and(|text| allowed.iter().any(|candidate| candidate == text));
            if matches {
                Some(value.clone())
            } else {
                violations.push(Violation::new(
                    path,
                    format!("must be one of {}", allowed.join(", ")),
                ));
                None
            }
        }
        FieldType::Record(schema) => schema.validate_object(path, value, violations),
        FieldType::List(element) => {
            let Some(items) = value.as_array() else {
                return reject(path, field_type, violations);
            };
            let mut normalized = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{path}[{index}]");
                let checked = check_type(&item_path, item, element, spec, violations);
                normalized.push(checked.unwrap_or_else(|| item.clone()));
            }
            Some(Value::Array(normalized))
        }
    }
}

fn reject(path: &str, field_type: &FieldType, violations: &mut Vec<Violation>) -> Option<Value> {
    violations.push(Violation::new(
        path,
        format!("expected {}", field_type.expectation()),
    ));
    None
}
