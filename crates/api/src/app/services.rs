use tokio_util::sync::CancellationToken;

use stockmaster_infra::config::ReconciliationConfig;
use stockmaster_infra::{InMemoryEntityStore, ReconciliationEngine};

pub type Engine = ReconciliationEngine<InMemoryEntityStore>;

/// Shared state behind every handler.
pub struct AppServices {
    engine: Engine,
    max_retries: u32,
    shutdown: CancellationToken,
}

impl AppServices {
    pub fn in_memory(settings: &ReconciliationConfig, shutdown: CancellationToken) -> Self {
        tracing::info!(
            capacity_policy = ?settings.capacity_policy,
            max_retries = settings.max_retries,
            "in-memory entity store ready"
        );
        Self {
            engine: ReconciliationEngine::new(InMemoryEntityStore::new(), settings.capacity_policy),
            max_retries: settings.max_retries,
            shutdown,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Token for one request, cancelled together with the process.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
