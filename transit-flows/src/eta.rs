//! Arrival-time prediction from historical trip durations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use flow_prompts::PromptTemplate;
use flow_schema::{FieldSpec, FieldType, Schema};

use crate::config::FlowConfig;
use crate::error::FlowResult;
use crate::pipeline::{self, CapabilitySpec};

pub(crate) const CAPABILITY: &str = "predict-arrival-time";

const PROMPT: &str = "\
You are an expert in predicting bus ETAs based on historical data.

Given the following information, predict the ETA for the bus to arrive at the destination.

Route ID: {{routeId}}
Origin: {{origin}}
Destination: {{destination}}
Current Time: {{currentTime}}

Historical Data:
{{#each historicalData}}
- Timestamp: {{timestamp}}, Duration: {{duration}} seconds
{{/each}}

Consider the historical data and the current time to make an accurate prediction. Provide a confidence level (0-1) for your prediction.

Format the predicted ETA as an ISO string.
";

/// One historical trip observation for a route.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataPoint {
    /// When the trip was observed, as an ISO-8601 string.
    pub timestamp: String,
    /// Trip duration in seconds.
    pub duration: f64,
}

/// Caller-side input for an arrival-time prediction.
///
/// Serializes to the raw shape [`predict_arrival_time`] accepts, for
/// callers that prefer compile-time field names over hand-built JSON.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalQuery {
    /// The ID of the bus route.
    pub route_id: String,
    /// The origin stop of the journey.
    pub origin: String,
    /// The destination stop of the journey.
    pub destination: String,
    /// The current time as an ISO string.
    pub current_time: String,
    /// Historical trip data for the route, in caller order.
    pub historical_data: Vec<HistoricalDataPoint>,
}

/// Typed result of an arrival-time prediction.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ArrivalPrediction {
    /// The predicted ETA as an ISO string.
    #[serde(rename = "predictedETA")]
    pub predicted_eta: String,
    /// Confidence level of the prediction, in [0, 1].
    pub confidence: f64,
}

fn input_schema() -> Schema {
    let data_point = Schema::builder()
        .field(
            FieldSpec::timestamp("timestamp")
                .describe("Timestamp of the historical data point as an ISO string."),
        )
        .field(FieldSpec::number("duration").describe("The duration of the trip in seconds."))
        .build();

    Schema::builder()
        .field(FieldSpec::text("routeId").describe("The ID of the bus route."))
        .field(FieldSpec::text("origin").describe("The origin stop of the journey."))
        .field(FieldSpec::text("destination").describe("The destination stop of the journey."))
        .field(FieldSpec::timestamp("currentTime").describe("The current time as an ISO string."))
        .field(
            FieldSpec::list("historicalData", FieldType::Record(data_point))
                .describe("Historical trip data for the route."),
        )
        .build()
}

fn output_schema() -> Schema {
    Schema::builder()
        .field(FieldSpec::timestamp("predictedETA").describe("The predicted ETA as an ISO string."))
        .field(
            FieldSpec::number("confidence")
                .with_range(0.0, 1.0)
                .describe("The confidence level of the prediction (0-1)."),
        )
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

/// Predicts when a bus will arrive, from historical trip durations.
///
/// Accepts the untyped input shape `{routeId, origin, destination,
/// currentTime, historicalData}` (see [`ArrivalQuery`]), validates it,
/// renders the prediction prompt, and validates the backend's reply before
/// returning it.
///
/// # Errors
///
/// Propagates [`flow_schema::SchemaError`] for contract violations on
/// either side, [`flow_prompts::TemplateError`] for binding failures, and
/// [`flow_backend::traits::BackendError`] for transport failures —
/// unchanged, with no local recovery.
pub async fn predict_arrival_time(
    config: &FlowConfig,
    input: Value,
) -> FlowResult<ArrivalPrediction> {
    let spec = capability()?;
    let output = pipeline::run(config, &spec, input).await?;
    pipeline::decode(CAPABILITY, output)
}

/// Convenience wrapper over [`predict_arrival_time`] for typed callers.
///
/// # Errors
///
/// Same as [`predict_arrival_time`].
pub async fn predict_arrival_time_for(
    config: &FlowConfig,
    query: &ArrivalQuery,
) -> FlowResult<ArrivalPrediction> {
    predict_arrival_time(config, pipeline::to_raw(CAPABILITY, query)?).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn input_schema_requires_route() {
        let err = input_schema()
            .validate(&json!({
                "origin": "Plaza Principal",
                "destination": "Calle 72",
                "currentTime": "2024-05-04T10:30:00Z",
                "historicalData": [],
            }))
            .expect_err("routeId is required");

        assert_eq!(err.violations()[0].path(), "routeId");
    }

    #[test]
    fn output_schema_rejects_confidence_out_of_range() {
        let err = output_schema()
            .validate(&json!({
                "predictedETA": "2024-05-04T11:05:00Z",
                "confidence": 1.4,
            }))
            .expect_err("confidence must stay in [0, 1]");

        assert_eq!(err.violations()[0].path(), "confidence");
    }

    #[test]
    fn template_lists_one_line_per_data_point() {
        let template = PromptTemplate::parse(PROMPT).expect("static template parses");
        let input = input_schema()
            .validate(&json!({
                "routeId": "route-1",
                "origin": "Plaza Principal",
                "destination": "Calle 72",
                "currentTime": "2024-05-04T10:30:00Z",
                "historicalData": [
                    {"timestamp": "2024-05-03T10:30:00Z", "duration": 1800},
                    {"timestamp": "2024-05-02T10:30:00Z", "duration": 2100},
                ],
            }))
            .expect("valid input");

        let prompt = template.render(&input).expect("renders");
        assert!(prompt.contains("Route ID: route-1"));
        assert!(prompt.contains("Duration: 1800 seconds"));
        assert!(prompt.contains("Duration: 2100 seconds"));
    }

    #[test]
    fn typed_query_serializes_to_accepted_shape() {
        let query = ArrivalQuery {
            route_id: "route-1".to_owned(),
            origin: "Plaza Principal".to_owned(),
            destination: "Calle 72".to_owned(),
            current_time: "2024-05-04T10:30:00Z".to_owned(),
            historical_data: vec![HistoricalDataPoint {
                timestamp: "2024-05-03T10:30:00Z".to_owned(),
                duration: 1800.0,
            }],
        };

        assert!(input_schema().validate(&json!(query)).is_ok());
    }
}
