//! Incident summarization across reported route disruptions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use flow_prompts::PromptTemplate;
use flow_schema::{FieldSpec, FieldType, Schema};

use crate::config::FlowConfig;
use crate::error::FlowResult;
use crate::pipeline::{self, CapabilitySpec};

pub(crate) const CAPABILITY: &str = "summarize-incidents";

const SEVERITY_LEVELS: [&str; 3] = ["low", "medium", "high"];

const PROMPT: &str = "\
You are an AI assistant helping an admin summarize incidents reported on bus routes.

Given the following incident reports, generate a concise summary highlighting the key issues and their severity.

Incidents:
{{#each incidents}}
- Route ID: {{routeId}}
  Description: {{description}}
  Severity: {{severity}}
  Timestamp: {{timestamp}}
{{/each}}

Summary:";

/// Severity of a reported incident.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Minor disruption, service mostly unaffected.
    Low,
    /// Noticeable disruption, delays likely.
    Medium,
    /// Major disruption, service interrupted.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

/// One reported incident on a route.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentReport {
    /// The ID of the bus route.
    pub route_id: String,
    /// A description of the incident.
    pub description: String,
    /// The severity of the incident.
    pub severity: Severity,
    /// The timestamp of the incident, as an ISO-8601 string.
    pub timestamp: String,
}

/// Caller-side input for an incident summary.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct IncidentQuery {
    /// Incident reports to summarize, in caller order.
    pub incidents: Vec<IncidentReport>,
}

/// Typed result of an incident summary.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct IncidentSummary {
    /// A concise summary of the reported incidents.
    pub summary: String,
}

fn input_schema() -> Schema {
    let incident = Schema::builder()
        .field(FieldSpec::text("routeId").describe("The ID of the bus route."))
        .field(FieldSpec::text("description").describe("A description of the incident."))
        .field(
            FieldSpec::enumeration("severity", SEVERITY_LEVELS)
                .describe("The severity of the incident."),
        )
        .field(FieldSpec::timestamp("timestamp").describe("The timestamp of the incident."))
        .build();

    Schema::builder()
        .field(
            FieldSpec::list("incidents", FieldType::Record(incident))
                .describe("An array of incident reports to summarize."),
        )
        .build()
}

fn output_schema() -> Schema {
    Schema::builder()
        .field(FieldSpec::text("summary").describe("A concise summary of the reported incidents."))
        .build()
}

pub(crate) fn capability() -> FlowResult<CapabilitySpec> {
    Ok(CapabilitySpec {
        name: CAPABILITY,
        input: input_schema(),
        output: output_schema(),
        template: PromptTemplate::parse(PROMPT)?,
    })
}

/// Condenses reported incidents into a short operator-facing summary.
///
/// Accepts the untyped input shape `{incidents: [...]}` (see
/// [`IncidentQuery`]); the rendered prompt lists incidents in caller order,
/// never reordered or deduplicated.
///
/// # Errors
///
/// Propagates contract, binding, and backend failures unchanged, as
/// [`predict_arrival_time`](crate::eta::predict_arrival_time) does.
pub async fn summarize_incidents(config: &FlowConfig, input: Value) -> FlowResult<IncidentSummary> {
    let spec = capability()?;
    let output = pipeline::run(config, &spec, input).await?;
    pipeline::decode(CAPABILITY, output)
}

/// Convenience wrapper over [`summarize_incidents`] for typed callers.
///
/// # Errors
///
/// Same as [`summarize_incidents`].
pub async fn summarize_incidents_for(
    config: &FlowConfig,
    query: &IncidentQuery,
) -> FlowResult<IncidentSummary> {
    summarize_incidents(config, pipeline::to_raw(CAPABILITY, query)?).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_incidents() -> Value {
        json!({"incidents": [
            {
                "routeId": "route-1",
                "description": "Heavy traffic reported near Parque Nacional.",
                "severity": "medium",
                "timestamp": "2024-05-04T10:20:00Z",
            },
            {
                "routeId": "route-2",
                "description": "Minor accident involving a bicycle on Av. El Dorado.",
                "severity": "low",
                "timestamp": "2024-05-04T10:00:00Z",
            },
            {
                "routeId": "route-1",
                "description": "Protests blocking the road at Calle 72.",
                "severity": "high",
                "timestamp": "2024-05-04T09:30:00Z",
            },
        ]})
    }

    #[test]
    fn renders_one_block_per_incident_in_order() {
        let input = input_schema()
            .validate(&sample_incidents())
            .expect("valid input");
        let template = PromptTemplate::parse(PROMPT).expect("static template parses");
        let prompt = template.render(&input).expect("renders");

        let first = prompt.find("Heavy traffic").expect("first incident");
        let second = prompt.find("Minor accident").expect("second incident");
        let third = prompt.find("Protests blocking").expect("third incident");
        assert!(first < second && second < third);
    }

    #[test]
    fn rejects_unknown_severity() {
        let err = input_schema()
            .validate(&json!({"incidents": [{
                "routeId": "route-1",
                "description": "Road closed.",
                "severity": "catastrophic",
                "timestamp": "2024-05-04T09:30:00Z",
            }]}))
            .expect_err("severity outside the declared set");

        assert_eq!(err.violations()[0].path(), "incidents[0].severity");
    }

    #[test]
    fn output_requires_summary() {
        let err = output_schema()
            .validate(&json!({}))
            .expect_err("summary is required");
        assert_eq!(err.violations()[0].path(), "summary");
    }

    #[test]
    fn severity_round_trips_through_serde() {
        let severity: Severity = serde_json::from_value(json!("high")).expect("parses");
        assert_eq!(severity, Severity::High);
        assert_eq!(severity.to_string(), "high");
    }
}
