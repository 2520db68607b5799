//! Claude-specific request and response types
//!
//! These types map directly to the Anthropic Messages API schema.

use serde::{Deserialize, Serialize};

/// Streaming request body for `POST /v1/messages`
#[derive(Debug, Clone, Serialize)]
pub struct MessagesRequest {
    /// Model identifier, e.g. `claude-3-7-sonnet-latest`
    pub model: String,
    /// Maximum number of tokens to generate (required)
    pub max_tokens: u32,
    /// Array of messages in the conversation
    pub messages: Vec<ClaudeMessage>,
    /// System prompt (top-level field)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Extended thinking switch
    pub thinking: ClaudeThinking,
    /// Always true for streaming
    pub stream: bool,
}

/// `thinking` request parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeThinking {
    Enabled { budget_tokens: u32 },
    Disabled,
}

/// A single message in the Claude conversation
#[derive(Debug, Clone, Serialize)]
pub struct ClaudeMessage {
    /// Role: "user" or "assistant"
    pub role: String,
    /// Content (can be string or array of content blocks)
    pub content: ClaudeContent,
}

/// Content can be either a simple string or an array of content blocks
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ClaudeContent {
    /// Simple text content
    Text(String),
    /// Array of content blocks
    Blocks(Vec<ClaudeContentBlock>),
}

/// A content block within a Claude message
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentBlock {
    Text { text: String },
    Image { source: ClaudeImageSource },
}

/// Inline image payload
#[derive(Debug, Clone, Serialize)]
pub struct ClaudeImageSource {
    /// Always "base64"
    #[serde(rename = "type")]
    pub source_type: String,
    pub media_type: String,
    pub data: String,
}

/// SSE event types from the streaming API
///
/// Event kinds added to the API later land in `Unknown` and are skipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeStreamEvent {
    /// Message streaming started
    MessageStart { message: ClaudeMessageData },
    /// Content block started
    ContentBlockStart {
        index: usize,
        content_block: ClaudeContentBlockStart,
    },
    /// Content block delta (incremental update)
    ContentBlockDelta {
        index: usize,
        delta: ClaudeContentDelta,
    },
    /// Content block stopped
    ContentBlockStop { index: usize },
    /// Message delta (metadata update)
    MessageDelta {
        delta: ClaudeMessageDeltaData,
        usage: Option<ClaudeUsage>,
    },
    /// Message streaming stopped
    MessageStop,
    /// Ping event (keep-alive)
    Ping,
    /// Error event
    Error { error: ClaudeErrorData },
    #[serde(other)]
    Unknown,
}

/// Message data from message_start event
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeMessageData {
    /// Message ID
    pub id: String,
    /// Message role (always "assistant" for responses)
    pub role: String,
    /// Model identifier
    pub model: String,
    /// Initial usage metadata
    pub usage: ClaudeUsage,
}

/// Content block start data
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentBlockStart {
    Text {
        #[serde(default)]
        text: String,
    },
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    /// redacted_thinking, tool_use and anything newer
    #[serde(other)]
    Other,
}

/// Content delta (incremental update)
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeContentDelta {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    /// Integrity signature closing a thinking block
    SignatureDelta { signature: String },
    /// Input JSON delta (tool use arguments)
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Unknown,
}

/// Message delta data
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeMessageDeltaData {
    /// Stop reason (set when message completes)
    pub stop_reason: Option<String>,
}

/// Usage metadata
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeUsage {
    /// Input tokens consumed (not present in message_delta updates)
    #[serde(default)]
    pub input_tokens: u32,
    /// Output tokens generated
    #[serde(default)]
    pub output_tokens: u32,
}

/// Error data
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeErrorData {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

/// Non-2xx response body, e.g. `{"type":"error","error":{...}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ClaudeErrorResponse {
    pub error: ClaudeErrorData,
}
