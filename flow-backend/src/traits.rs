//! Shared backend trait and data structures.

use std::time::Duration;

use async_trait::async_trait;
use flow_schema::Schema;
use serde_json::Value;

use thiserror::Error;

/// Result alias used by generation backends.
pub type BackendResult<T> = Result<T, BackendError>;

/// Error type shared by backend implementations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend is misconfigured or missing credentials.
    #[error("backend not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// The service could not be reached or refused the request.
    #[error("generation backend unavailable: {reason}")]
    Unavailable {
        /// Additional context about the failure.
        reason: String,
    },

    /// The round-trip exceeded the configured deadline.
    #[error("generation request timed out after {elapsed:?}")]
    Timeout {
        /// How long the backend waited before giving up.
        elapsed: Duration,
    },

    /// The reply was not machine-parseable at all.
    ///
    /// Distinct from a schema-shape mismatch, which the contract layer
    /// reports after parsing succeeds.
    #[error("malformed backend response: {reason}")]
    Malformed {
        /// Additional context about the unparseable reply.
        reason: String,
    },
}

impl BackendError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for unreachable or failing services.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for unparseable replies.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Minimal metadata describing a backend instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendMetadata {
    provider: &'static str,
    model: String,
}

impl BackendMetadata {
    /// Creates metadata for the supplied provider and model identifier.
    #[must_use]
    pub fn new(provider: &'static str, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Returns the provider identifier (e.g., "gemini").
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Returns the configured model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Trait implemented by all generation backends.
///
/// One outbound call per invocation; implementations perform no caching and
/// no retries. Retry and backoff policy, if any, belongs to the caller.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Returns basic metadata describing the backend instance.
    fn metadata(&self) -> &BackendMetadata;

    /// Sends the rendered prompt and returns the reply parsed as JSON.
    ///
    /// `output_shape` instructs the service to answer in the declared
    /// shape. The instruction is advisory; callers validate the reply
    /// against the same schema before trusting it.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unavailable`] for network or service
    /// failures, [`BackendError::Timeout`] when the deadline elapses, and
    /// [`BackendError::Malformed`] when the reply does not parse as JSON.
    async fn generate(&self, prompt: &str, output_shape: &Schema) -> BackendResult<Value>;
}
