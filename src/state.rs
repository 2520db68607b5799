use std::sync::Arc;

use crate::config::RelayConfig;
use crate::llm::LlmProvider;
use crate::session::SessionStore;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub provider: Arc<dyn LlmProvider>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn new(
        config: RelayConfig,
        provider: Arc<dyn LlmProvider>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            sessions,
        }
    }
}
