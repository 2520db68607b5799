//! Upstream model client
//!
//! A streaming client for the Anthropic Messages API plus the provider-neutral
//! types the relay consumes.

pub mod claude;
pub mod core;

// Re-export commonly used types
pub use core::{
    config::{GenerationConfig, ThinkingConfig, MIN_THINKING_BUDGET},
    error::LlmError,
    provider::{create_provider, EventStream, LlmProvider},
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
        MessageRole, StreamEvent, UsageMetadata,
    },
};

pub use claude::ClaudeClient;
