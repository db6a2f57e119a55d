//! Template parsing and rendering with variable substitution.

use std::fmt;

use serde_json::Value;

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while parsing or rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template text itself is malformed.
    #[error("template syntax error: {reason}")]
    Syntax {
        /// Description of the malformed construct.
        reason: String,
    },

    /// A placeholder references a field the input does not carry.
    #[error("template placeholder `{path}` is not bound to an input field")]
    UnboundField {
        /// The unresolvable placeholder path.
        path: String,
    },

    /// A placeholder resolved to a value of the wrong shape.
    #[error("template placeholder `{path}` expects {expected}")]
    WrongShape {
        /// The offending placeholder path.
        path: String,
        /// What the placeholder needed to render.
        expected: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
    Repeat { path: String, body: Vec<Segment> },
}

/// An immutable prompt template parsed into renderable segments.
///
/// # Examples
///
/// ```
/// use flow_prompts::PromptTemplate;
/// use serde_json::json;
///
/// let template = PromptTemplate::parse(
///     "Route: {{routeId}}\n{{#each stops}}- {{name}}\n{{/each}}",
/// )
/// .unwrap();
///
/// let rendered = template
///     .render(&json!({
///         "routeId": "route-1",
///         "stops": [{"name": "Plaza Principal"}, {"name": "Museo del Oro"}],
///     }))
///     .unwrap();
/// assert!(rendered.contains("- Plaza Principal"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parses template text into an immutable template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] for unterminated placeholders,
    /// unterminated or unmatched `{{#each}}` blocks, and empty tags.
    pub fn parse(source: impl Into<String>) -> TemplateResult<Self> {
        let source = source.into();
        let mut cursor = 0;
        let segments = parse_segments(&source, &mut cursor, false)?;
        Ok(Self { source, segments })
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Renders the template against a validated input value.
    ///
    /// Scalars substitute verbatim; numbers keep the caller's digits
    /// (serde_json's arbitrary-precision representation retains the source
    /// literal). Repeated blocks expand one sub-block per sequence element
    /// in the order given, resolving nested placeholders against the
    /// current element. An empty sequence renders zero sub-blocks.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnboundField`] if a placeholder path is
    /// absent from the input, and [`TemplateError::WrongShape`] if a scalar
    /// placeholder hits a record or sequence, or an `{{#each}}` block hits
    /// a non-sequence. Missing fields are never silently blanked.
    pub fn render(&self, input: &Value) -> TemplateResult<String> {
        let mut output = String::new();
        render_segments(&self.segments, input, &mut output)?;
        Ok(output)
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segments(
    source: &str,
    cursor: &mut usize,
    inside_block: bool,
) -> TemplateResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut literal = String::new();

    loop {
        let Some(offset) = source[*cursor..].find("{{") else {
            if inside_block {
                return Err(TemplateError::Syntax {
                    reason: "unterminated {{#each}} block".to_owned(),
                });
            }
            literal.push_str(&source[*cursor..]);
            *cursor = source.len();
            flush_literal(&mut literal, &mut segments);
            return Ok(segments);
        };

        literal.push_str(&source[*cursor..*cursor + offset]);
        *cursor += offset + 2;

        let Some(end) = source[*cursor..].find("}}") else {
            return Err(TemplateError::Syntax {
                reason: "unterminated placeholder".to_owned(),
            });
        };
        let tag = source[*cursor..*cursor + end].trim().to_owned();
        *cursor += end + 2;

        if let Some(raw_path) = tag.strip_prefix("#each") {
            let path = raw_path.trim();
            if path.is_empty() {
                return Err(TemplateError::Syntax {
                    reason: "{{#each}} requires a field path".to_owned(),
                });
            }
            flush_literal(&mut literal, &mut segments);
            let body = parse_segments(source, cursor, true)?;
            segments.push(Segment::Repeat {
                path: path.to_owned(),
                body,
            });
        } else if tag == "/each" {
            if !inside_block {
                return Err(TemplateError::Syntax {
                    reason: "{{/each}} without matching {{#each}}".to_owned(),
                });
            }
            flush_literal(&mut literal, &mut segments);
            return Ok(segments);
        } else {
            if tag.is_empty() {
                return Err(TemplateError::Syntax {
                    reason: "empty placeholder".to_owned(),
                });
            }
            flush_literal(&mut literal, &mut segments);
            segments.push(Segment::Placeholder(tag));
        }
    }
}

fn flush_literal(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn render_segments(segments: &[Segment], scope: &Value, output: &mut String) -> TemplateResult<()> {
    for segment in segments {
        match segment {
            Segment::Literal(text) => output.push_str(text),
            Segment::Placeholder(path) => {
                let value = resolve(path, scope)?;
                output.push_str(&format_scalar(path, value)?);
            }
            Segment::Repeat { path, body } => {
                let value = resolve(path, scope)?;
                let Some(items) = value.as_array() else {
                    return Err(TemplateError::WrongShape {
                        path: path.clone(),
                        expected: "a sequence",
                    });
                };
                for item in items {
                    render_segments(body, item, output)?;
                }
            }
        }
    }
    Ok(())
}

fn resolve<'a>(path: &str, scope: &'a Value) -> TemplateResult<&'a Value> {
    let mut current = scope;
    for part in path.split('.') {
        current = current
            .as_object()
            .and_then(|map| map.get(part))
            .ok_or_else(|| TemplateError::UnboundField {
                path: path.to_owned(),
            })?;
    }
    Ok(current)
}

fn format_scalar(path: &str, value: &Value) -> TemplateResult<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(TemplateError::WrongShape {
            path: path.to_owned(),
            expected: "a scalar value",
        }),
    }
}
