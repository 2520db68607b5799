//! Mapping between abstraction types and Claude-specific types

use crate::llm::core::config::ThinkingConfig;
use crate::llm::core::types::{
    ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
    MessageMetadata, MessageRole, StreamEvent, UsageMetadata,
};

use super::types::{
    ClaudeContent, ClaudeContentBlock, ClaudeContentBlockStart, ClaudeContentDelta,
    ClaudeImageSource, ClaudeMessage, ClaudeStreamEvent, ClaudeThinking, MessagesRequest,
};

/// Convert our abstraction request to Claude's request format
pub fn to_claude_request(model: &str, request: GenerateRequest) -> MessagesRequest {
    MessagesRequest {
        model: model.to_string(),
        max_tokens: request.config.max_tokens,
        messages: request
            .messages
            .into_iter()
            .map(to_claude_message)
            .collect(),
        system: request.system,
        thinking: match request.config.thinking {
            ThinkingConfig::Enabled { budget_tokens } => ClaudeThinking::Enabled { budget_tokens },
            ThinkingConfig::Disabled => ClaudeThinking::Disabled,
        },
        stream: true,
    }
}

/// Convert our Message to Claude's ClaudeMessage
fn to_claude_message(message: Message) -> ClaudeMessage {
    let role = match message.role {
        MessageRole::User => "user".to_string(),
        MessageRole::Assistant => "assistant".to_string(),
    };

    // A lone text block goes out as plain string content
    if message.content.len() == 1 {
        if let ContentBlock::Text { text } = &message.content[0] {
            return ClaudeMessage {
                role,
                content: ClaudeContent::Text(text.clone()),
            };
        }
    }

    let blocks = message
        .content
        .into_iter()
        .map(to_claude_content_block)
        .collect();

    ClaudeMessage {
        role,
        content: ClaudeContent::Blocks(blocks),
    }
}

/// Convert our ContentBlock to Claude's ClaudeContentBlock
fn to_claude_content_block(block: ContentBlock) -> ClaudeContentBlock {
    match block {
        ContentBlock::Text { text } => ClaudeContentBlock::Text { text },
        ContentBlock::Image { media_type, data } => ClaudeContentBlock::Image {
            source: ClaudeImageSource {
                source_type: "base64".to_string(),
                media_type,
                data,
            },
        },
    }
}

/// Convert Claude's stream event to our abstraction's StreamEvent
/// Returns a vector because some Claude events map to nothing
pub fn from_claude_event(
    event: ClaudeStreamEvent,
    accumulated_usage: &mut UsageMetadata,
) -> Vec<StreamEvent> {
    match event {
        ClaudeStreamEvent::MessageStart { message } => {
            accumulated_usage.input_tokens = message.usage.input_tokens;
            accumulated_usage.output_tokens = message.usage.output_tokens;
            accumulated_usage.total_tokens =
                accumulated_usage.input_tokens + accumulated_usage.output_tokens;

            vec![StreamEvent::MessageStart {
                message: MessageMetadata {
                    id: message.id,
                    role: MessageRole::Assistant,
                    usage: Some(*accumulated_usage),
                },
            }]
        }
        ClaudeStreamEvent::ContentBlockStart {
            index,
            content_block,
        } => {
            let block = match content_block {
                ClaudeContentBlockStart::Text { text } => ContentBlockStart::Text { text },
                ClaudeContentBlockStart::Thinking { thinking } => {
                    ContentBlockStart::Thinking { thinking }
                }
                ClaudeContentBlockStart::Other => ContentBlockStart::Other,
            };

            vec![StreamEvent::ContentBlockStart { index, block }]
        }
        ClaudeStreamEvent::ContentBlockDelta { index, delta } => {
            let content_delta = match delta {
                ClaudeContentDelta::TextDelta { text } => ContentDelta::TextDelta { text },
                ClaudeContentDelta::ThinkingDelta { thinking } => {
                    ContentDelta::ThinkingDelta { thinking }
                }
                // Signatures, tool input and unknown deltas are never forwarded
                ClaudeContentDelta::SignatureDelta { .. }
                | ClaudeContentDelta::InputJsonDelta { .. }
                | ClaudeContentDelta::Unknown => return vec![],
            };

            vec![StreamEvent::ContentDelta {
                index,
                delta: content_delta,
            }]
        }
        ClaudeStreamEvent::ContentBlockStop { index } => {
            vec![StreamEvent::ContentBlockEnd { index }]
        }
        ClaudeStreamEvent::MessageDelta { delta, usage } => {
            if let Some(usage) = usage {
                accumulated_usage.output_tokens = usage.output_tokens;
                accumulated_usage.total_tokens =
                    accumulated_usage.input_tokens + accumulated_usage.output_tokens;
            }

            if let Some(stop_reason) = delta.stop_reason {
                let finish_reason = match stop_reason.as_str() {
                    "end_turn" => FinishReason::EndTurn,
                    "max_tokens" => FinishReason::MaxTokens,
                    "stop_sequence" => FinishReason::StopSequence,
                    "tool_use" => FinishReason::ToolUse,
                    other => FinishReason::Other(other.to_string()),
                };

                vec![StreamEvent::MessageEnd {
                    finish_reason,
                    usage: *accumulated_usage,
                }]
            } else {
                vec![StreamEvent::MessageDelta {
                    usage: Some(*accumulated_usage),
                }]
            }
        }
        ClaudeStreamEvent::MessageStop | ClaudeStreamEvent::Ping | ClaudeStreamEvent::Unknown => {
            vec![]
        }
        ClaudeStreamEvent::Error { error } => {
            vec![StreamEvent::Error {
                error: format!("{}: {}", error.error_type, error.message),
            }]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::core::config::GenerationConfig;

    #[test]
    fn test_to_claude_request_basic() {
        let request = GenerateRequest {
            messages: vec![Message::user("2+2?")],
            config: GenerationConfig::new(34000),
            system: Some("Be brief".to_string()),
        };

        let claude_request = to_claude_request("claude-3-7-sonnet-latest", request);

        assert_eq!(claude_request.model, "claude-3-7-sonnet-latest");
        assert_eq!(claude_request.max_tokens, 34000);
        assert_eq!(claude_request.system, Some("Be brief".to_string()));
        assert_eq!(claude_request.thinking, ClaudeThinking::Disabled);
        assert!(claude_request.stream);
        assert_eq!(claude_request.messages.len(), 1);
    }

    #[test]
    fn test_to_claude_request_with_thinking() {
        let request = GenerateRequest {
            messages: vec![Message::user("Prove it")],
            config: GenerationConfig::new(34000).with_thinking(4096),
            system: None,
        };

        let claude_request = to_claude_request("claude-3-7-sonnet-latest", request);
        assert_eq!(
            claude_request.thinking,
            ClaudeThinking::Enabled {
                budget_tokens: 4096
            }
        );
    }

    #[test]
    fn test_to_claude_message_simple_text() {
        let claude_message = to_claude_message(Message::user("Hello"));

        assert_eq!(claude_message.role, "user");
        match claude_message.content {
            ClaudeContent::Text(text) => assert_eq!(text, "Hello"),
            _ => panic!("Expected simple text content"),
        }
    }

    #[test]
    fn test_to_claude_message_with_image() {
        let message = Message::user_blocks(vec![
            ContentBlock::Image {
                media_type: "image/jpeg".to_string(),
                data: "/9j/4AAQ".to_string(),
            },
            ContentBlock::Text {
                text: "Describe this".to_string(),
            },
        ]);

        match to_claude_message(message).content {
            ClaudeContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2);
                match &blocks[0] {
                    ClaudeContentBlock::Image { source } => {
                        assert_eq!(source.source_type, "base64");
                        assert_eq!(source.media_type, "image/jpeg");
                        assert_eq!(source.data, "/9j/4AAQ");
                    }
                    _ => panic!("Expected image block"),
                }
                match &blocks[1] {
                    ClaudeContentBlock::Text { text } => assert_eq!(text, "Describe this"),
                    _ => panic!("Expected text block"),
                }
            }
            _ => panic!("Expected blocks content"),
        }
    }

    #[test]
    fn test_from_claude_event_thinking_delta() {
        let event = ClaudeStreamEvent::ContentBlockDelta {
            index: 0,
            delta: ClaudeContentDelta::ThinkingDelta {
                thinking: "First, ".to_string(),
            },
        };

        let mut usage = UsageMetadata::new(0, 0);
        let events = from_claude_event(event, &mut usage);

        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::ContentDelta { index, delta } => {
                assert_eq!(*index, 0);
                assert_eq!(
                    *delta,
                    ContentDelta::ThinkingDelta {
                        thinking: "First, ".to_string()
                    }
                );
            }
            _ => panic!("Expected ContentDelta event"),
        }
    }

    #[test]
    fn test_from_claude_event_text_delta() {
        let event = ClaudeStreamEvent::ContentBlockDelta {
            index: 1,
            delta: ClaudeContentDelta::TextDelta {
                text: "4".to_string(),
            },
        };

        let mut usage = UsageMetadata::new(0, 0);
        let events = from_claude_event(event, &mut usage);

        match &events[0] {
            StreamEvent::ContentDelta {
                delta: ContentDelta::TextDelta { text },
                ..
            } => assert_eq!(text, "4"),
            _ => panic!("Expected text delta"),
        }
    }

    #[test]
    fn test_signature_delta_is_dropped() {
        let event = ClaudeStreamEvent::ContentBlockDelta {
            index: 0,
            delta: ClaudeContentDelta::SignatureDelta {
                signature: "EqQBCgIYAhIM".to_string(),
            },
        };

        let mut usage = UsageMetadata::new(0, 0);
        assert!(from_claude_event(event, &mut usage).is_empty());
    }

    #[test]
    fn test_ping_and_unknown_are_dropped() {
        let mut usage = UsageMetadata::new(0, 0);
        assert!(from_claude_event(ClaudeStreamEvent::Ping, &mut usage).is_empty());
        assert!(from_claude_event(ClaudeStreamEvent::Unknown, &mut usage).is_empty());
        assert!(from_claude_event(ClaudeStreamEvent::MessageStop, &mut usage).is_empty());
    }

    #[test]
    fn test_from_claude_event_message_delta_with_stop_reason() {
        use super::super::types::{ClaudeMessageDeltaData, ClaudeUsage};

        let event = ClaudeStreamEvent::MessageDelta {
            delta: ClaudeMessageDeltaData {
                stop_reason: Some("max_tokens".to_string()),
            },
            usage: Some(ClaudeUsage {
                input_tokens: 0,
                output_tokens: 25,
            }),
        };

        let mut accumulated_usage = UsageMetadata::new(10, 0);
        let events = from_claude_event(event, &mut accumulated_usage);

        match &events[0] {
            StreamEvent::MessageEnd {
                finish_reason,
                usage,
            } => {
                assert_eq!(*finish_reason, FinishReason::MaxTokens);
                assert_eq!(usage.output_tokens, 25);
                assert_eq!(usage.total_tokens, 35);
            }
            _ => panic!("Expected MessageEnd event"),
        }
    }

    #[test]
    fn test_from_claude_event_error() {
        use super::super::types::ClaudeErrorData;

        let event = ClaudeStreamEvent::Error {
            error: ClaudeErrorData {
                error_type: "overloaded_error".to_string(),
                message: "Overloaded".to_string(),
            },
        };

        let mut usage = UsageMetadata::new(0, 0);
        match &from_claude_event(event, &mut usage)[0] {
            StreamEvent::Error { error } => assert_eq!(error, "overloaded_error: Overloaded"),
            _ => panic!("Expected Error event"),
        }
    }
}
