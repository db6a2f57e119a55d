//! Runs the three transit capabilities against Gemini with sample data.
//!
//! Requires `GEMINI_API_KEY` in the environment.

use std::sync::Arc;

use anyhow::Result;
use flow_backend::gemini::{GeminiBackend, GeminiConfig};
use serde_json::json;
use tracing::info;
use transit_flows::{
    FlowConfig, detect_route_deviation, predict_arrival_time, summarize_incidents,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let backend = GeminiBackend::new(GeminiConfig::from_env("gemini-2.0-flash"))?;
    let config = FlowConfig::new(Arc::new(backend));

    info!("=== RutaViva: route-watch demo ===");

    arrival_example(&config).await?;
    deviation_example(&config).await?;
    summary_example(&config).await?;

    Ok(())
}

/// Predicts the ETA for bus-001 on Ruta 101, Plaza Principal to Calle 72.
async fn arrival_example(config: &FlowConfig) -> Result<()> {
    info!("--- Arrival prediction ---");

    let prediction = predict_arrival_time(
        config,
        json!({
            "routeId": "route-1",
            "origin": "Plaza Principal",
            "destination": "Calle 72",
            "currentTime": "2024-05-04T10:30:00Z",
            "historicalData": [
                {"timestamp": "2024-05-03T10:30:00Z", "duration": 1800},
                {"timestamp": "2024-05-02T10:30:00Z", "duration": 2100},
                {"timestamp": "2024-05-01T10:30:00Z", "duration": 1950},
            ],
        }),
    )
    .await?;

    info!(
        "Predicted ETA: {} (confidence {:.2})",
        prediction.predicted_eta, prediction.confidence
    );
    Ok(())
}

/// Checks bus-001's position against the Ruta 101 stops.
async fn deviation_example(config: &FlowConfig) -> Result<()> {
    info!("--- Deviation detection ---");

    let assessment = detect_route_deviation(
        config,
        json!({
            "currentLocation": {"latitude": 4.6395, "longitude": -74.0615},
            "plannedRoute": [
                {"latitude": 4.60971, "longitude": -74.08175},
                {"latitude": 4.6018, "longitude": -74.0721},
                {"latitude": 4.621, "longitude": -74.067},
                {"latitude": 4.658, "longitude": -74.056},
                {"latitude": 4.667, "longitude": -74.054},
            ],
        }),
    )
    .await?;

    info!(
        "Deviating: {} (distance: {:?})",
        assessment.is_deviating, assessment.deviation_distance
    );
    Ok(())
}

/// Summarizes the currently reported incidents.
async fn summary_example(config: &FlowConfig) -> Result<()> {
    info!("--- Incident summary ---");

    let summary = summarize_incidents(
        config,
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
        ]}),
    )
    .await?;

    info!("Summary: {}", summary.summary);
    Ok(())
}
