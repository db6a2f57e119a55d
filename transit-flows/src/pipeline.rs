//! Shared capability pipeline: validate, render, generate, validate.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use flow_prompts::PromptTemplate;
use flow_schema::{Schema, SchemaError, Violation};

use crate::config::FlowConfig;
use crate::error::FlowResult;

/// One capability's contract: paired schemas and the prompt template that
/// joins them. Schema and template are independent artifacts; they meet
/// only here.
pub(crate) struct CapabilitySpec {
    pub name: &'static str,
    pub input: Schema,
    pub output: Schema,
    pub template: PromptTemplate,
}

/// Runs a capability call end to end.
///
/// A single linear pipeline with no retries, no partial results, and no
/// cross-call state. Failures from any stage propagate unchanged.
pub(crate) async fn run(
    config: &FlowConfig,
    spec: &CapabilitySpec,
    raw: Value,
) -> FlowResult<Value> {
    let input = spec.input.validate(&raw)?;
    let prompt = spec.template.render(&input)?;

    debug!(
        capability = spec.name,
        prompt_chars = prompt.len(),
        "dispatching rendered prompt"
    );

    let reply = config.backend().generate(&prompt, &spec.output).await?;
    let output = spec.output.validate(&reply)?;

    debug!(capability = spec.name, "generation reply validated");
    Ok(output)
}

/// Decodes a schema-validated output value into its typed result.
pub(crate) fn decode<T: DeserializeOwned>(capability: &str, output: Value) -> FlowResult<T> {
    serde_json::from_value(output).map_err(|err| {
        SchemaError::validation(vec![Violation::new(
            "$",
            format!("{capability} output failed to decode: {err}"),
        )])
        .into()
    })
}

/// Serializes a typed query into the raw shape the contract validates.
pub(crate) fn to_raw<T: serde::Serialize>(capability: &str, query: &T) -> FlowResult<Value> {
    serde_json::to_value(query).map_err(|err| {
        SchemaError::validation(vec![Violation::new(
            "$",
            format!("{capability} query failed to serialize: {err}"),
        )])
        .into()
    })
}
