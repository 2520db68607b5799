#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use claude_stream_relay::config::RelayConfig;
use claude_stream_relay::llm::{
    ContentDelta, EventStream, FinishReason, GenerateRequest, LlmError, LlmProvider, StreamEvent,
    UsageMetadata,
};
use claude_stream_relay::session::{DiskSessionStore, SessionStore};
use claude_stream_relay::state::AppState;

/// What a scripted provider does when asked to stream
pub enum Script {
    /// Yield these items, then end
    Events(Vec<Result<StreamEvent, LlmError>>),
    /// Fail before any event is produced
    OpenError(fn() -> LlmError),
    /// Yield these items, then stay open; `dropped` fires once the stream is dropped
    Hang(Vec<Result<StreamEvent, LlmError>>, oneshot::Sender<()>),
}

struct DropNotify(Option<oneshot::Sender<()>>);

impl Drop for DropNotify {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

/// Provider that replays a script and records every request it receives
pub struct ScriptedProvider {
    script: Mutex<Option<Script>>,
    pub requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Some(script)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.requests.lock().unwrap().push(request);
        let script = self
            .script
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Script::Events(Vec::new()));

        match script {
            Script::OpenError(make) => Err(make()),
            Script::Events(events) => Ok(Box::pin(futures::stream::iter(events))),
            Script::Hang(events, dropped) => {
                let notify = DropNotify(Some(dropped));
                let stream = futures::stream::iter(events)
                    .chain(futures::stream::pending())
                    .map(move |event| {
                        let _alive = &notify;
                        event
                    });
                Ok(Box::pin(stream))
            }
        }
    }
}

pub fn text(text: &str) -> Result<StreamEvent, LlmError> {
    Ok(StreamEvent::ContentDelta {
        index: 0,
        delta: ContentDelta::TextDelta {
            text: text.to_string(),
        },
    })
}

pub fn thinking(thinking: &str) -> Result<StreamEvent, LlmError> {
    Ok(StreamEvent::ContentDelta {
        index: 0,
        delta: ContentDelta::ThinkingDelta {
            thinking: thinking.to_string(),
        },
    })
}

pub fn message_end() -> Result<StreamEvent, LlmError> {
    Ok(StreamEvent::MessageEnd {
        finish_reason: FinishReason::EndTurn,
        usage: UsageMetadata::new(10, 5),
    })
}

/// Relay config pointing uploads at `upload_dir`
pub fn test_config(upload_dir: &Path) -> RelayConfig {
    let upload_dir = upload_dir.display().to_string();
    RelayConfig::from_lookup(|key| match key {
        "CLAUDE_API_KEY" => Some("test-key".to_string()),
        "CLAUDE_MAX_TOKENS" => Some("8192".to_string()),
        "RELAY_UPLOAD_DIR" => Some(upload_dir.clone()),
        _ => None,
    })
    .unwrap()
}

/// App state wired to a scripted provider and an on-disk session store
pub fn test_state(upload_dir: &Path, provider: Arc<ScriptedProvider>) -> AppState {
    test_state_with(test_config(upload_dir), provider)
}

pub fn test_state_with(config: RelayConfig, provider: Arc<ScriptedProvider>) -> AppState {
    let sessions: Arc<dyn SessionStore> = Arc::new(DiskSessionStore::new(
        config.upload_dir.clone(),
        config.session_ttl,
    ));
    AppState::new(config, provider, sessions)
}
