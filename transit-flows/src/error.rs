//! Unified error surface for capability calls.

use flow_backend::traits::BackendError;
use flow_prompts::TemplateError;
use flow_schema::SchemaError;
use thiserror::Error;

/// Result alias for capability operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// Any failure a capability call can surface.
///
/// Each layer's error passes through unchanged; this crate performs no
/// local recovery, silent defaulting, or retry.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Input or output did not match its declared contract.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The prompt template could not be parsed or bound to the input.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The generation backend failed or replied unparseably.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
