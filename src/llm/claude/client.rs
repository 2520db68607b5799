//! Claude client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;

use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::{GenerateRequest, StreamEvent, UsageMetadata},
};

use super::mapper::{from_claude_event, to_claude_request};
use super::sse::parse_sse_stream;
use super::types::ClaudeErrorResponse;

/// Public Anthropic endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Value of the `anthropic-version` header
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API
pub struct ClaudeClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Sent as `x-api-key`
    api_key: String,
    /// API root, without the `/v1/messages` suffix (a proxy such as LiteLLM works too)
    base_url: String,
    /// Model identifier
    model: String,
}

impl ClaudeClient {
    /// Create a new Claude client
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is empty or the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::AuthenticationError(
                "no Claude API key configured".to_string(),
            ));
        }

        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            api_key,
            base_url,
            model,
        })
    }

    /// Model this client sends requests for
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the endpoint URL for streaming
    fn build_endpoint_url(&self) -> String {
        messages_url(&self.base_url)
    }

    /// Make a streaming request to Claude
    async fn make_streaming_request(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let claude_request = to_claude_request(&self.model, request);

        let url = self.build_endpoint_url();
        tracing::debug!(url = %url, model = %self.model, "opening Claude stream");

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&claude_request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response(status.as_u16(), body));
        }

        let byte_stream = response.bytes_stream();
        let sse_stream = parse_sse_stream(Box::pin(byte_stream));

        let mut accumulated_usage = UsageMetadata::new(0, 0);

        let event_stream = sse_stream.flat_map(move |result| match result {
            Ok(claude_event) => {
                let events = from_claude_event(claude_event, &mut accumulated_usage);
                futures::stream::iter(
                    events
                        .into_iter()
                        .map(Ok)
                        .collect::<Vec<Result<StreamEvent, LlmError>>>(),
                )
            }
            Err(e) => futures::stream::iter(vec![Err(e)]),
        });

        Ok(Box::pin(event_stream))
    }
}

#[async_trait]
impl LlmProvider for ClaudeClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.make_streaming_request(request).await
    }
}

/// `{base_url}/v1/messages`, tolerating a trailing slash
fn messages_url(base_url: &str) -> String {
    format!("{}/v1/messages", base_url.trim_end_matches('/'))
}

/// Map a non-2xx response to an error, preferring the API's own error body
fn error_from_response(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationError(body),
        _ => match serde_json::from_str::<ClaudeErrorResponse>(&body) {
            Ok(parsed) => LlmError::ProviderError {
                code: parsed.error.error_type,
                message: parsed.error.message,
            },
            Err(_) => LlmError::HttpError { status, body },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        assert_eq!(
            messages_url("https://api.anthropic.com"),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(
            messages_url("https://proxy.example.com/"),
            "https://proxy.example.com/v1/messages"
        );
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let result = ClaudeClient::new(
            "  ".to_string(),
            DEFAULT_BASE_URL.to_string(),
            "claude-3-7-sonnet-latest".to_string(),
        );
        assert!(matches!(result, Err(LlmError::AuthenticationError(_))));
    }

    #[test]
    fn test_new_keeps_model() {
        let client = ClaudeClient::new(
            "sk-ant-test".to_string(),
            DEFAULT_BASE_URL.to_string(),
            "claude-3-7-sonnet-latest".to_string(),
        )
        .unwrap();
        assert_eq!(client.model(), "claude-3-7-sonnet-latest");
        assert_eq!(
            client.build_endpoint_url(),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_error_from_response_parses_api_error() {
        let body = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        match error_from_response(529, body.to_string()) {
            LlmError::ProviderError { code, message } => {
                assert_eq!(code, "overloaded_error");
                assert_eq!(message, "Overloaded");
            }
            other => panic!("Expected ProviderError, got {:?}", other),
        }
    }

    #[test]
    fn test_error_from_response_auth() {
        let err = error_from_response(401, "invalid x-api-key".to_string());
        assert!(matches!(err, LlmError::AuthenticationError(_)));
    }

    #[test]
    fn test_error_from_response_plain_body() {
        let err = error_from_response(502, "Bad Gateway".to_string());
        assert!(matches!(err, LlmError::HttpError { status: 502, .. }));
    }
}
