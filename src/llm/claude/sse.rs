//! Server-Sent Events (SSE) parser for Claude responses

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

use super::types::ClaudeStreamEvent;

/// Parse a stream of bytes as Claude SSE events
///
/// The Messages API frames each event as:
/// ```text
/// event: content_block_delta
/// data: {"type":"content_block_delta",...}
///
/// ```
///
/// Bytes are buffered until a blank line closes the event, so a frame (or a
/// multibyte character) split across network chunks is reassembled before it
/// is decoded. `\r\n` line endings are accepted.
pub fn parse_sse_stream(
    byte_stream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
) -> Pin<Box<dyn Stream<Item = Result<ClaudeStreamEvent, LlmError>> + Send>> {
    let mut buffer: Vec<u8> = Vec::new();

    let event_stream = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(LlmError::StreamError(e.to_string()))]);
            }
        };

        buffer.extend_from_slice(&chunk);

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = find_event_boundary(&buffer) {
            let raw: Vec<u8> = buffer.drain(..end + delimiter_len).take(end).collect();

            let event_text = match String::from_utf8(raw) {
                Ok(text) => text,
                Err(e) => {
                    events.push(Err(LlmError::StreamError(format!(
                        "Invalid UTF-8 in stream: {}",
                        e
                    ))));
                    continue;
                }
            };

            if let Some(parsed_event) = parse_event(&event_text) {
                events.push(parsed_event);
            }
        }

        futures::stream::iter(events)
    });

    Box::pin(event_stream)
}

/// Locate the first blank line, returning (event length, delimiter length)
fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|i| (i, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Parse a single SSE event from its text representation
fn parse_event(event_text: &str) -> Option<Result<ClaudeStreamEvent, LlmError>> {
    let mut event_type: Option<&str> = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in event_text.lines() {
        let line = line.trim_end_matches('\r');

        // Comment lines start with ':'
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        if let Some(type_val) = line.strip_prefix("event:") {
            event_type = Some(type_val.trim());
        } else if let Some(data_val) = line.strip_prefix("data:") {
            data_lines.push(data_val.trim_start());
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    let data = data_lines.join("\n");
    if data.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<ClaudeStreamEvent>(&data) {
        Ok(event) => Some(Ok(event)),
        Err(e) => Some(Err(LlmError::SerializationError(format!(
            "Failed to parse Claude SSE event (type: {:?}): {}. Data: {}",
            event_type, e, data
        )))),
    }
}
