use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flow_backend::traits::{BackendError, BackendMetadata, BackendResult, GenerationBackend};
use flow_schema::Schema;
use serde_json::{Value, json};
use transit_flows::{
    FlowConfig, FlowError, detect_route_deviation, predict_arrival_time, summarize_incidents,
};

/// Backend that records every prompt and replies with a fixed value.
struct ScriptedBackend {
    metadata: BackendMetadata,
    reply: Value,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(reply: Value) -> Arc<Self> {
        Arc::new(Self {
            metadata: BackendMetadata::new("test", "scripted"),
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    async fn generate(&self, prompt: &str, _output_shape: &Schema) -> BackendResult<Value> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        Ok(self.reply.clone())
    }
}

struct FailingBackend {
    metadata: BackendMetadata,
}

impl FailingBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            metadata: BackendMetadata::new("test", "failing"),
        })
    }
}

#[async_trait]
impl GenerationBackend for FailingBackend {
    fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    async fn generate(&self, _prompt: &str, _output_shape: &Schema) -> BackendResult<Value> {
        Err(BackendError::unavailable("connection refused"))
    }
}

#[tokio::test]
async fn deviation_renders_location_and_default_threshold() {
    let backend = ScriptedBackend::new(json!({"isDeviating": false}));
    let config = FlowConfig::new(Arc::clone(&backend) as Arc<dyn GenerationBackend>);

    // Parsed from text so the caller's numeric literals survive verbatim.
    let input: Value = serde_json::from_str(
        r#"{
            "currentLocation": {"latitude": 4.60, "longitude": -74.08},
            "plannedRoute": [{"latitude": 4.60, "longitude": -74.08}]
        }"#,
    )
    .unwrap();

    let assessment = detect_route_deviation(&config, input)
        .await
        .expect("scenario succeeds");

    assert!(!assessment.is_deviating);
    assert!(assessment.deviation_distance.is_none());

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("4.60"));
    assert!(prompts[0].contains("-74.08"));
    assert!(prompts[0].contains("0.001 degrees"));
}

#[tokio::test]
async fn incident_blocks_keep_caller_order_and_partial_replies_fail() {
    let backend = ScriptedBackend::new(json!({}));
    let config = FlowConfig::new(Arc::clone(&backend) as Arc<dyn GenerationBackend>);

    let input = json!({"incidents": [
        {
            "routeId": "route-2",
            "description": "Minor accident involving a bicycle on Av. El Dorado.",
            "severity": "low",
            "timestamp": "2024-05-04T10:00:00Z",
        },
        {
            "routeId": "route-1",
            "description": "Heavy traffic reported near Parque Nacional.",
            "severity": "medium",
            "timestamp": "2024-05-04T10:20:00Z",
        },
        {
            "routeId": "route-1",
            "description": "Protests blocking the road at Calle 72.",
            "severity": "high",
            "timestamp": "2024-05-04T09:30:00Z",
        },
    ]});

    let err = summarize_incidents(&config, input)
        .await
        .expect_err("reply without a summary must not yield a partial result");
    assert!(matches!(err, FlowError::Schema(_)));

    let prompts = backend.prompts();
    assert_eq!(prompts.len(), 1);
    let first = prompts[0].find("Minor accident").expect("low incident");
    let second = prompts[0].find("Heavy traffic").expect("medium incident");
    let third = prompts[0].find("Protests blocking").expect("high incident");
    assert!(first < second && second < third);
}

#[tokio::test]
async fn missing_required_field_never_reaches_the_backend() {
    let backend = ScriptedBackend::new(json!({
        "predictedETA": "2024-05-04T11:05:00Z",
        "confidence": 0.85,
    }));
    let config = FlowConfig::new(Arc::clone(&backend) as Arc<dyn GenerationBackend>);

    let err = predict_arrival_time(
        &config,
        json!({
            "origin": "Plaza Principal",
            "destination": "Calle 72",
            "currentTime": "2024-05-04T10:30:00Z",
            "historicalData": [],
        }),
    )
    .await
    .expect_err("routeId is required");

    assert!(matches!(err, FlowError::Schema(_)));
    assert!(backend.prompts().is_empty());
}

#[tokio::test]
async fn arrival_prediction_decodes_validated_reply() {
    let backend = ScriptedBackend::new(json!({
        "predictedETA": "2024-05-04T11:05:00Z",
        "confidence": 0.85,
    }));
    let config = FlowConfig::new(Arc::clone(&backend) as Arc<dyn GenerationBackend>);

    let prediction = predict_arrival_time(
        &config,
        json!({
            "routeId": "route-1",
            "origin": "Plaza Principal",
            "destination": "Calle 72",
            "currentTime": "2024-05-04T10:30:00Z",
            "historicalData": [
                {"timestamp": "2024-05-03T10:30:00Z", "duration": 1800},
                {"timestamp": "2024-05-02T10:30:00Z", "duration": 2100},
            ],
        }),
    )
    .await
    .expect("prediction succeeds");

    assert_eq!(prediction.predicted_eta, "2024-05-04T11:05:00Z");
    assert!((prediction.confidence - 0.85).abs() < f64::EPSILON);
}

#[tokio::test]
async fn out_of_range_confidence_is_rejected() {
    let backend = ScriptedBackend::new(json!({
        "predictedETA": "2024-05-04T11:05:00Z",
        "confidence": 1.2,
    }));
    let config = FlowConfig::new(Arc::clone(&backend) as Arc<dyn GenerationBackend>);

    let err = predict_arrival_time(
        &config,
        json!({
            "routeId": "route-1",
            "origin": "Plaza Principal",
            "destination": "Calle 72",
            "currentTime": "2024-05-04T10:30:00Z",
            "historicalData": [],
        }),
    )
    .await
    .expect_err("confidence outside [0, 1]");

    assert!(matches!(err, FlowError::Schema(_)));
}

#[tokio::test]
async fn backend_failures_propagate_unchanged() {
    let config = FlowConfig::new(FailingBackend::new());

    let err = summarize_incidents(&config, json!({"incidents": []}))
        .await
        .expect_err("backend is down");

    assert!(matches!(
        err,
        FlowError::Backend(BackendError::Unavailable { .. })
    ));
}

#[tokio::test]
async fn identical_input_renders_identical_prompts() {
    let backend = ScriptedBackend::new(json!({"isDeviating": true, "deviationDistance": 0.004}));
    let config = FlowConfig::new(Arc::clone(&backend) as Arc<dyn GenerationBackend>);

    let input = json!({
        "currentLocation": {"latitude": 4.656, "longitude": -74.0865},
        "plannedRoute": [
            {"latitude": 4.544, "longitude": -74.148},
            {"latitude": 4.647, "longitude": -74.075},
        ],
        "deviationThreshold": 0.002,
    });

    let first = detect_route_deviation(&config, input.clone())
        .await
        .expect("first call");
    let second = detect_route_deviation(&config, input)
        .await
        .expect("second call");

    assert_eq!(first, second);
    let prompts = backend.prompts();
    assert_eq!(prompts[0], prompts[1]);
}

#[tokio::test]
async fn concurrent_capability_calls_are_independent() {
    let deviation_backend = ScriptedBackend::new(json!({"isDeviating": false}));
    let summary_backend = ScriptedBackend::new(json!({"summary": "All routes nominal."}));
    let deviation_config =
        FlowConfig::new(Arc::clone(&deviation_backend) as Arc<dyn GenerationBackend>);
    let summary_config = FlowConfig::new(Arc::clone(&summary_backend) as Arc<dyn GenerationBackend>);

    let deviation = detect_route_deviation(
        &deviation_config,
        json!({
            "currentLocation": {"latitude": 4.6395, "longitude": -74.0615},
            "plannedRoute": [{"latitude": 4.6395, "longitude": -74.0615}],
        }),
    );
    let summary = summarize_incidents(&summary_config, json!({"incidents": []}));

    let (deviation, summary) = tokio::join!(deviation, summary);
    assert!(!deviation.expect("deviation succeeds").is_deviating);
    assert_eq!(summary.expect("summary succeeds").summary, "All routes nominal.");
}
