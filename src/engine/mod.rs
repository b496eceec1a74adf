//! Upload engine: fans one upload request out to the platform adapters

use serde::{Deserialize, Serialize};

pub mod orchestrator;
pub mod progress;
pub mod registry;

pub use orchestrator::{RunHandle, UploadOrchestrator};
pub use progress::{EventSink, ProgressCounter, UploadEvent};
pub use registry::AdapterRegistry;

/// Default number of platforms uploading at the same time
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Ceiling of concurrently running platform units; extra units queue FIFO
    pub max_concurrent: usize,
}

impl OrchestratorConfig {
    pub fn with_max_concurrent(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }
}
