//! Deterministic prompt rendering for AI transit capabilities.
//!
//! A [`PromptTemplate`] binds a validated input value into natural-language
//! text: `{{path}}` placeholders substitute scalars (dotted paths reach into
//! nested records) and `{{#each field}}...{{/each}}` blocks expand once per
//! element of a sequence field, in caller order. Rendering is a pure
//! function of the template and its input.

#![warn(missing_docs, clippy::pedantic)]

mod template;

pub use template::{PromptTemplate, TemplateError, TemplateResult};
