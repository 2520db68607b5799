//! Streaming relay
//!
//! Opens one upstream call and turns its events into client frames:
//! - text deltas become `text` frames
//! - thinking deltas become `thinking` frames stamped with elapsed seconds
//! - everything else is dropped
//!
//! If the call cannot be opened, or fails part way, a single `error` frame is
//! emitted and the stream ends. Dropping the returned stream (the client went
//! away) drops the upstream response and closes that connection too.
//!
//! `spawn_relay` drives the relay on its own task and hands frames over a
//! channel; once the receiving side is gone the task stops and the upstream
//! response is dropped.

use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use pin_utils::pin_mut;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::llm::{ContentDelta, GenerateRequest, LlmProvider, StreamEvent};
use crate::sse::RelayFrame;

/// Frames buffered between the relay task and the response body
const FRAME_BUFFER: usize = 64;

/// Relay lifecycle, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    StreamOpen,
    EmittingText,
    EmittingThinking,
    Closed,
}

/// Logs how a relay ended, including when it was dropped mid-stream
struct RelayGuard {
    state: RelayState,
    frames: usize,
    started: Instant,
}

impl RelayGuard {
    fn new() -> Self {
        Self {
            state: RelayState::Idle,
            frames: 0,
            started: Instant::now(),
        }
    }

    fn transition(&mut self, next: RelayState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "relay state");
            self.state = next;
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

impl Drop for RelayGuard {
    fn drop(&mut self) {
        if self.state == RelayState::Closed {
            tracing::info!(
                frames = self.frames,
                elapsed = self.elapsed_secs(),
                "relay finished"
            );
        } else {
            tracing::info!(
                state = ?self.state,
                frames = self.frames,
                "client disconnected, upstream call dropped"
            );
        }
    }
}

/// Stream client frames for one generation request
pub fn relay_frames(
    provider: Arc<dyn LlmProvider>,
    request: GenerateRequest,
) -> impl Stream<Item = RelayFrame> + Send + 'static {
    stream! {
        let mut guard = RelayGuard::new();

        let upstream = match provider.stream_generate(request).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to open upstream stream");
                guard.transition(RelayState::Closed);
                guard.frames += 1;
                yield RelayFrame::Error { message: e.to_string() };
                return;
            }
        };
        guard.transition(RelayState::StreamOpen);

        pin_mut!(upstream);

        while let Some(event_result) = upstream.next().await {
            let event = match event_result {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "upstream stream interrupted");
                    guard.transition(RelayState::Closed);
                    guard.frames += 1;
                    yield RelayFrame::Error { message: e.to_string() };
                    return;
                }
            };

            match event {
                StreamEvent::ContentDelta { delta: ContentDelta::TextDelta { text }, .. } => {
                    guard.transition(RelayState::EmittingText);
                    guard.frames += 1;
                    yield RelayFrame::Text { text };
                }
                StreamEvent::ContentDelta { delta: ContentDelta::ThinkingDelta { thinking }, .. } => {
                    guard.transition(RelayState::EmittingThinking);
                    let elapsed = guard.elapsed_secs();
                    tracing::debug!(elapsed, "thinking chunk");
                    guard.frames += 1;
                    yield RelayFrame::thinking(thinking, elapsed);
                }
                StreamEvent::Error { error } => {
                    tracing::error!(error = %error, "upstream reported an error");
                    guard.transition(RelayState::Closed);
                    guard.frames += 1;
                    yield RelayFrame::Error { message: error };
                    return;
                }
                StreamEvent::MessageEnd { finish_reason, usage } => {
                    tracing::debug!(?finish_reason, total_tokens = usage.total_tokens, "upstream message complete");
                }
                _ => {}
            }
        }

        guard.transition(RelayState::Closed);
    }
}

/// Run `relay_frames` on a spawned task and receive its frames
pub fn spawn_relay(
    provider: Arc<dyn LlmProvider>,
    request: GenerateRequest,
) -> ReceiverStream<RelayFrame> {
    let (tx, rx) = mpsc::channel(FRAME_BUFFER);

    tokio::spawn(async move {
        let frames = relay_frames(provider, request);
        pin_mut!(frames);

        loop {
            let next = tokio::select! {
                next = frames.next() => next,
                _ = tx.closed() => {
                    tracing::debug!("response stream closed, stopping relay");
                    break;
                }
            };
            let Some(frame) = next else { break };
            if tx.send(frame).await.is_err() {
                tracing::debug!("response stream closed, stopping relay");
                break;
            }
        }
    });

    ReceiverStream::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_transitions() {
        let mut guard = RelayGuard::new();
        assert_eq!(guard.state, RelayState::Idle);
        guard.transition(RelayState::StreamOpen);
        guard.transition(RelayState::EmittingThinking);
        guard.transition(RelayState::EmittingText);
        guard.transition(RelayState::Closed);
        assert_eq!(guard.state, RelayState::Closed);
    }
}
