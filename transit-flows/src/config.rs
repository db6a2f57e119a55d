//! Process-wide flow configuration.

use std::fmt;
use std::sync::Arc;

use flow_backend::traits::GenerationBackend;

/// Configuration shared by every capability call.
///
/// Construct one at process start and pass it by reference into each
/// capability operation. There is no hidden global registry; swapping the
/// backend means constructing a different `FlowConfig`. The config holds no
/// mutable state, so concurrent capability calls may share it freely.
#[derive(Clone)]
pub struct FlowConfig {
    backend: Arc<dyn GenerationBackend>,
}

impl FlowConfig {
    /// Creates a configuration around the supplied backend.
    #[must_use]
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Returns the configured generation backend.
    #[must_use]
    pub fn backend(&self) -> &dyn GenerationBackend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for FlowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowConfig")
            .field("provider", &self.backend.metadata().provider())
            .field("model", &self.backend.metadata().model())
            .finish()
    }
}
