//! Provider trait for the upstream model

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

use super::{
    error::LlmError,
    types::{GenerateRequest, StreamEvent},
};
use crate::config::RelayConfig;
use crate::llm::claude::ClaudeClient;

/// Boxed stream of provider events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Interface the relay streams from
///
/// The relay only ever holds an `Arc<dyn LlmProvider>`, so tests can swap in a
/// scripted provider.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Open a streaming generation call
    ///
    /// # Returns
    /// A pinned boxed stream of `StreamEvent` results, or an error if the call
    /// could not be opened (bad status, connection failure).
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;
}

/// Create the configured provider
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or no API key is configured.
pub fn create_provider(config: &RelayConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let client = ClaudeClient::new(
        config.api_key.clone(),
        config.base_url.clone(),
        config.model.clone(),
    )?;
    Ok(Arc::new(client))
}
