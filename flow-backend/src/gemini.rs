//! Google Gemini generation backend.

use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use flow_schema::{FieldSpec, FieldType, Schema};

use crate::http_client::{HyperClient, build_https_client};
use crate::traits::{BackendError, BackendMetadata, BackendResult, GenerationBackend};

/// Environment variable used when loading configuration automatically.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the Gemini backend.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    temperature: Option<f32>,
}

impl GeminiConfig {
    /// Creates a configuration using the supplied model identifier.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: "https://generativelanguage.googleapis.com/".to_owned(),
            timeout: DEFAULT_TIMEOUT,
            temperature: None,
        }
    }

    /// Loads the API key from the `GEMINI_API_KEY` environment variable.
    #[must_use]
    pub fn from_env(model: impl Into<String>) -> Self {
        let mut cfg = Self::new(model);
        cfg.api_key = env::var(GEMINI_API_KEY_ENV).ok();
        cfg
    }

    /// Supplies an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Configuration`] if the supplied URL is
    /// invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> BackendResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Sets the round-trip deadline. One deadline per invocation, no retry.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the sampling temperature passed with every request.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Gemini backend that calls the official `generateContent` API over HTTPS.
///
/// Every request carries `responseMimeType: application/json` plus a
/// `responseSchema` derived from the declared output shape, so the model is
/// instructed to reply in exactly that shape.
pub struct GeminiBackend {
    client: HyperClient,
    endpoint: String,
    metadata: BackendMetadata,
    api_key: String,
    timeout: Duration,
    temperature: Option<f32>,
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Constructs a new backend with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Configuration`] if the API key is missing.
    pub fn new(config: GeminiConfig) -> BackendResult<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| BackendError::configuration("Gemini backend requires an API key"))?;

        let metadata = BackendMetadata::new("gemini", config.model.clone());
        let endpoint = format!(
            "{}v1beta/models/{}:generateContent",
            config.base_url, config.model
        );

        Ok(Self {
            client: build_https_client(),
            endpoint,
            metadata,
            api_key,
            timeout: config.timeout,
            temperature: config.temperature,
        })
    }

    fn build_request(&self, prompt: &str, output_shape: &Schema) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_owned(),
                parts: vec![Part {
                    text: prompt.to_owned(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
                response_schema: response_schema(output_shape),
            },
        }
    }

    fn build_uri(&self) -> BackendResult<Uri> {
        format!("{}?key={}", self.endpoint, self.api_key)
            .parse::<Uri>()
            .map_err(|err| BackendError::configuration(format!("invalid Gemini endpoint: {err}")))
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    fn metadata(&self) -> &BackendMetadata {
        &self.metadata
    }

    async fn generate(&self, prompt: &str, output_shape: &Schema) -> BackendResult<Value> {
        let payload = self.build_request(prompt, output_shape);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            BackendError::configuration(format!("failed to encode Gemini request: {err}"))
        })?;

        let request = Request::post(self.build_uri()?)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|err| {
                BackendError::unavailable(format!("failed to build Gemini request: {err}"))
            })?;

        debug!(
            model = self.metadata.model(),
            prompt_chars = prompt.len(),
            "sending generateContent request"
        );

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| BackendError::Timeout {
                elapsed: self.timeout,
            })?
            .map_err(|err| BackendError::unavailable(format!("Gemini request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            BackendError::unavailable(format!("failed to read Gemini response: {err}"))
        })?;

        if !status.is_success() {
            let reason = String::from_utf8_lossy(&bytes).to_string();
            return Err(BackendError::unavailable(format!(
                "Gemini returned {status}: {reason}"
            )));
        }

        let reply: GenerateContentResponse = serde_json::from_slice(&bytes).map_err(|err| {
            BackendError::malformed(format!("failed to decode Gemini response: {err}"))
        })?;

        let text = reply
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .map(|part| part.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(BackendError::malformed("Gemini reply carried no text"));
        }

        let json = strip_code_fence(text.trim());
        serde_json::from_str(json)
            .map_err(|err| BackendError::malformed(format!("Gemini reply is not JSON: {err}")))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Converts a declared output schema into Gemini's `responseSchema` form
/// (an OpenAPI-style subset with uppercase type names).
fn response_schema(schema: &Schema) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required = Vec::new();

    for spec in schema.fields() {
        properties.insert(spec.name().to_owned(), field_schema(spec));
        if spec.is_required() {
            required.push(Value::String(spec.name().to_owned()));
        }
    }

    let mut object = serde_json::Map::new();
    object.insert("type".to_owned(), Value::String("OBJECT".to_owned()));
    object.insert("properties".to_owned(), Value::Object(properties));
    if !required.is_empty() {
        object.insert("required".to_owned(), Value::Array(required));
    }
    Value::Object(object)
}

fn field_schema(spec: &FieldSpec) -> Value {
    let mut node = type_schema(spec.field_type());
    if let (Some(map), Some(description)) = (node.as_object_mut(), spec.description()) {
        map.insert(
            "description".to_owned(),
            Value::String(description.to_owned()),
        );
    }
    node
}

fn type_schema(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::Text => serde_json::json!({"type": "STRING"}),
        FieldType::Number => serde_json::json!({"type": "NUMBER"}),
        FieldType::Boolean => serde_json::json!({"type": "BOOLEAN"}),
        FieldType::Timestamp => serde_json::json!({"type": "STRING", "format": "date-time"}),
        FieldType::Enumeration(values) => serde_json::json!({"type": "STRING", "enum": values}),
        FieldType::Record(schema) => response_schema(schema),
        FieldType::List(element) => serde_json::json!({
            "type": "ARRAY",
            "items": type_schema(element),
        }),
    }
}

/// Drops a surrounding Markdown code fence when a model wraps its JSON.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

fn sanitize_base_url(input: &str) -> BackendResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(BackendError::configuration(
            "Gemini base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| BackendError::configuration(format!("invalid Gemini base URL: {err}")))?;
    Ok(base)
}
