//! Route-deviation detection from a position and a planned route.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use flow_prompts::PromptTemplate;
use flow_schema::{FieldSpec, FieldType, Schema};

use crate::config::FlowConfig;
use crate::error::FlowResult;
use crate::pipeline::{self, CapabilitySpec};

pub(crate) const CAPABILITY: &str = "detect-route-deviation";

/// Degrees beyond which a deviation counts as significant, applied whenever
/// the caller supplies no threshold of their own.
pub const DEFAULT_DEVIATION_THRESHOLD: f64 = 0.001;

const PROMPT: &str = "\
You are an expert in detecting route deviations for buses.

You are given the current location of the bus, the planned route, and a deviation threshold.

Determine whether the bus is deviating from the planned route based on the following information:

Current Location: Latitude: {{currentLocation.latitude}}, Longitude: {{currentLocation.longitude}}
Planned Route: {{#each plannedRoute}}Latitude: {{latitude}}, Longitude: {{longitude}}
{{/each}}
Deviation Threshold: {{deviationThreshold}} degrees

Consider a deviation to have occurred if the bus is further than the deviation threshold from the planned route.

Output whether the bus is deviating and, optionally, the distance between the bus and its planned route.
";

/// A latitude/longitude pair in decimal degrees.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// Caller-side input for a deviation check.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationQuery {
    /// The current location of the bus.
    pub current_location: GeoPoint,
    /// The planned route of the bus, in travel order.
    pub planned_route: Vec<GeoPoint>,
    /// Optional threshold in degrees; [`DEFAULT_DEVIATION_THRESHOLD`] when
    /// absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_threshold: Option<f64>,
}

/// Typed result of a deviation check.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviationAssessment {
    /// Whether the bus is deviating from the planned route.
    pub is_deviating: bool,
    /// Distance in degrees between the bus and the closest point on the
    /// planned route, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviation_distance: Option<f64>,
}

fn point_schema() -> Schema {
    Schema::builder()
        .field(FieldSpec::number("latitude").describe("The latitude of the route point."))
        .field(FieldSpec::number("longitude").describe("The longitude of the route point."))
        .build()
}

fn input_schema() -> Schema {
    Schema::builder()
        .field(
            FieldSpec::record("currentLocation", point_schema())
                .describe("The current location of the bus."),
        )
        .field(
            FieldSpec::list("plannedRoute", FieldType::Record(point_schema())).describe(
                "The planned route of the bus as an array of latitude/longitude points.",
            ),
        )
        .field(
            FieldSpec::number("deviationThreshold")
                .with_default(json!(DEFAULT_DEVIATION_THRESHOLD))
                .describe(
                    "The threshold (in degrees) above which a deviation is considered \
                     significant. Defaults to 0.001 degrees.",
                ),
        )
        .build()
}

fn output_schema() -> Schema {
    Schema::builder()
        .field(
            FieldSpec::boolean("isDeviating")
                .describe("Whether the bus is deviating from the planned route."),
        )
        .field(
            FieldSpec::number("deviationDistance")
                .optional()
                .describe(
                    "The distance (in degrees) between the current location and the closest \
                     point on the planned route.",
                ),
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

/// Checks whether a bus has left its planned route.
///
/// Accepts the untyped input shape `{currentLocation, plannedRoute,
/// deviationThreshold?}` (see [`DeviationQuery`]); an absent threshold is
/// filled with [`DEFAULT_DEVIATION_THRESHOLD`] before the prompt renders.
///
/// # Errors
///
/// Propagates contract, binding, and backend failures unchanged, as
/// [`predict_arrival_time`](crate::eta::predict_arrival_time) does.
pub async fn detect_route_deviation(
    config: &FlowConfig,
    input: Value,
) -> FlowResult<DeviationAssessment> {
    let spec = capability()?;
    let output = pipeline::run(config, &spec, input).await?;
    pipeline::decode(CAPABILITY, output)
}

/// Convenience wrapper over [`detect_route_deviation`] for typed callers.
///
/// # Errors
///
/// Same as [`detect_route_deviation`].
pub async fn detect_route_deviation_for(
    config: &FlowConfig,
    query: &DeviationQuery,
) -> FlowResult<DeviationAssessment> {
    detect_route_deviation(config, pipeline::to_raw(CAPABILITY, query)?).await
}
