//! Field descriptors shared by capability input and output schemas.

use std::ops::RangeInclusive;

use serde_json::Value;

use crate::schema::Schema;

/// Semantic type of a schema field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    /// Free-form text.
    Text,
    /// A JSON number. Range constraints live on the owning [`FieldSpec`].
    Number,
    /// A boolean flag.
    Boolean,
    /// An ISO-8601 timestamp carried as a string, validated as RFC 3339.
    Timestamp,
    /// A string restricted to a closed set of values.
    Enumeration(Vec<String>),
    /// A nested record validated against its own schema.
    Record(Schema),
    /// An ordered sequence whose elements all share one type.
    List(Box<FieldType>),
}

impl FieldType {
    /// Short noun used in violation messages.
    #[must_use]
    pub fn expectation(&self) -> &'static str {
        match self {
            Self::Text => "a string",
            Self::Number => "a number",
            Self::Boolean => "a boolean",
            Self::Timestamp => "an RFC 3339 timestamp string",
            Self::Enumeration(_) => "one of the declared values",
            Self::Record(_) => "an object",
            Self::List(_) => "a sequence",
        }
    }
}

/// Declares one named field of a capability contract.
///
/// The description doubles as guidance handed to the generation backend, so
/// it should read as documentation for the model, not just for humans.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    name: String,
    field_type: FieldType,
    description: Option<String>,
    required: bool,
    default: Option<Value>,
    range: Option<RangeInclusive<f64>>,
}

impl FieldSpec {
    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: None,
            required: true,
            default: None,
            range: None,
        }
    }

    /// Declares a text field.
    #[must_use]
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Declares a numeric field.
    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Declares a boolean field.
    #[must_use]
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Declares an ISO-8601 timestamp field.
    #[must_use]
    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    /// Declares a field restricted to the supplied values.
    #[must_use]
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FieldType::Enumeration(values.into_iter().map(Into::into).collect()),
        )
    }

    /// Declares a nested record field.
    #[must_use]
    pub fn record(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, FieldType::Record(schema))
    }

    /// Declares an ordered sequence field.
    #[must_use]
    pub fn list(name: impl Into<String>, element: FieldType) -> Self {
        Self::new(name, FieldType::List(Box::new(element)))
    }

    /// Attaches a human-readable description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks the field optional; absent values are skipped, not rejected.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Supplies a default inserted whenever the field is absent.
    ///
    /// A defaulted field is implicitly optional.
    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    /// Constrains a numeric field to an inclusive range.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some(min..=max);
        self
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the semantic type.
    #[must_use]
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Returns the description if one was attached.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether an absent value is a violation.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the declared default value if any.
    #[must_use]
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Returns the inclusive numeric range if one was declared.
    #[must_use]
    pub fn range(&self) -> Option<&RangeInclusive<f64>> {
        self.range.as_ref()
    }
}
