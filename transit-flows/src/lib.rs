//! AI-backed transit capabilities behind schema-validated contracts.
//!
//! Three operations — arrival-time prediction, route-deviation detection,
//! and incident summarization — each run the same linear pipeline: validate
//! the untyped input against its declared schema, render a prompt from the
//! validated value, invoke the configured generation backend with the
//! output shape as a structural constraint, and validate the untrusted
//! reply before returning a typed result. Calls are independent and
//! reentrant; a shared [`FlowConfig`] carries the backend and nothing else.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flow_backend::gemini::{GeminiBackend, GeminiConfig};
//! use serde_json::json;
//! use transit_flows::{FlowConfig, detect_route_deviation};
//!
//! # async fn demo() -> transit_flows::FlowResult<()> {
//! let backend = GeminiBackend::new(GeminiConfig::from_env("gemini-2.0-flash"))?;
//! let config = FlowConfig::new(Arc::new(backend));
//!
//! let assessment = detect_route_deviation(
//!     &config,
//!     json!({
//!         "currentLocation": {"latitude": 4.6395, "longitude": -74.0615},
//!         "plannedRoute": [{"latitude": 4.6395, "longitude": -74.0615}],
//!     }),
//! )
//! .await?;
//! println!("deviating: {}", assessment.is_deviating);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

mod config;
mod error;
mod pipeline;

pub mod deviation;
pub mod eta;
pub mod incidents;

/// Shared, immutable per-process configuration.
pub use config::FlowConfig;
/// Capability inputs and results for deviation detection.
pub use deviation::{
    DEFAULT_DEVIATION_THRESHOLD, DeviationAssessment, DeviationQuery, GeoPoint,
    detect_route_deviation, detect_route_deviation_for,
};
/// Unified error type and result alias.
pub use error::{FlowError, FlowResult};
/// Capability inputs and results for arrival prediction.
pub use eta::{
    ArrivalPrediction, ArrivalQuery, HistoricalDataPoint, predict_arrival_time,
    predict_arrival_time_for,
};
/// Capability inputs and results for incident summarization.
pub use incidents::{
    IncidentQuery, IncidentReport, IncidentSummary, Severity, summarize_incidents,
    summarize_incidents_for,
};
