//! From raw `/stream` fields to the upstream request

mod common;

use bytes::Bytes;
use std::collections::HashMap;
use tokio_test::assert_ok;

use common::{test_state, Script, ScriptedProvider};

use claude_stream_relay::error::RelayError;
use claude_stream_relay::handlers::stream::prepare_stream;
use claude_stream_relay::llm::{ContentBlock, MessageRole, ThinkingConfig};
use claude_stream_relay::models::UploadedFile;
use claude_stream_relay::normalizer::StreamFields;

fn fields(question: &str, thinking: Option<&str>, tokens: Option<&str>) -> StreamFields {
    StreamFields {
        question: Some(question.to_string()),
        thinking: thinking.map(str::to_string),
        tokens: tokens.map(str::to_string),
    }
}

fn note(name: &str, contents: &'static str) -> UploadedFile {
    UploadedFile {
        file_name: name.to_string(),
        mime_type: "text/plain".to_string(),
        bytes: Bytes::from_static(contents.as_bytes()),
    }
}

#[tokio::test]
async fn test_plain_question_without_thinking() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), ScriptedProvider::new(Script::Events(vec![])));

    let request = assert_ok!(prepare_stream(&state, "s1", fields("2+2?", None, None), vec![]).await);

    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, MessageRole::User);
    assert_eq!(
        request.messages[0].content,
        vec![ContentBlock::Text {
            text: "2+2?".to_string()
        }]
    );
    assert_eq!(request.config.max_tokens, 8192);
    assert_eq!(request.config.thinking, ThinkingConfig::Disabled);
    assert!(request.system.is_none());
}

#[tokio::test]
async fn test_thinking_budget_is_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), ScriptedProvider::new(Script::Events(vec![])));

    let request = assert_ok!(
        prepare_stream(&state, "s1", fields("why?", Some("true"), Some("2048")), vec![]).await
    );

    assert_eq!(
        request.config.thinking,
        ThinkingConfig::Enabled {
            budget_tokens: 2048
        }
    );
}

#[tokio::test]
async fn test_budget_out_of_range_rejected_before_staging() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), ScriptedProvider::new(Script::Events(vec![])));

    state
        .sessions
        .put("s1", vec![note("keep.txt", "kept")])
        .await
        .unwrap();

    let too_small = prepare_stream(
        &state,
        "s1",
        fields("q", Some("true"), Some("100")),
        vec![note("replacement.txt", "new")],
    )
    .await;
    assert!(matches!(too_small, Err(RelayError::InvalidRequest(_))));

    let too_large = prepare_stream(&state, "s1", fields("q", Some("true"), Some("8192")), vec![]).await;
    assert!(matches!(too_large, Err(RelayError::InvalidRequest(_))));

    let files = state.sessions.get("s1").await;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].display_name, "keep.txt");
}

#[tokio::test]
async fn test_small_budget_ignored_when_thinking_off() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), ScriptedProvider::new(Script::Events(vec![])));

    let request = assert_ok!(
        prepare_stream(&state, "s1", fields("q", Some("false"), Some("10")), vec![]).await
    );
    assert_eq!(request.config.thinking, ThinkingConfig::Disabled);
}

#[tokio::test]
async fn test_uploaded_files_precede_question() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), ScriptedProvider::new(Script::Events(vec![])));

    let request = assert_ok!(
        prepare_stream(
            &state,
            "s1",
            fields("Summarize", None, None),
            vec![note("a.txt", "alpha"), note("b.txt", "beta")],
        )
        .await
    );

    assert_eq!(
        request.messages[0].content,
        vec![
            ContentBlock::Text {
                text: "[File: a.txt]\nalpha".to_string()
            },
            ContentBlock::Text {
                text: "[File: b.txt]\nbeta".to_string()
            },
            ContentBlock::Text {
                text: "Summarize".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_follow_up_reuses_session_files() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), ScriptedProvider::new(Script::Events(vec![])));

    assert_ok!(
        prepare_stream(&state, "s1", fields("first", None, None), vec![note("a.txt", "alpha")]).await
    );
    let follow_up = assert_ok!(prepare_stream(&state, "s1", fields("again", None, None), vec![]).await);
    assert_eq!(follow_up.messages[0].content.len(), 2);

    let other = assert_ok!(prepare_stream(&state, "s2", fields("other", None, None), vec![]).await);
    assert_eq!(other.messages[0].content.len(), 1);

    state.sessions.clear("s1").await.unwrap();
    let cleared = assert_ok!(prepare_stream(&state, "s1", fields("after", None, None), vec![]).await);
    assert_eq!(cleared.messages[0].content.len(), 1);
}

#[tokio::test]
async fn test_query_and_json_inputs_build_the_same_request() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), ScriptedProvider::new(Script::Events(vec![])));

    let params: HashMap<String, String> = [("question", "2+2?"), ("thinking", "true"), ("tokens", "2048")]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let from_query = assert_ok!(
        prepare_stream(&state, "s1", StreamFields::from_query(&params), vec![]).await
    );

    let json = StreamFields::from_json(br#"{"question":"2+2?","thinking":true,"tokens":2048}"#).unwrap();
    let from_json = assert_ok!(prepare_stream(&state, "s1", json, vec![]).await);

    assert_eq!(from_query.messages, from_json.messages);
    assert_eq!(from_query.config, from_json.config);
}

#[tokio::test]
async fn test_missing_question_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(dir.path(), ScriptedProvider::new(Script::Events(vec![])));

    let result = prepare_stream(&state, "s1", StreamFields::default(), vec![]).await;
    assert!(matches!(result, Err(RelayError::InvalidRequest(_))));
}
