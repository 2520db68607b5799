// GET|POST /stream handlers

use bytes::Bytes;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use warp::multipart::FormData;

use crate::error::RelayError;
use crate::llm::{GenerateRequest, GenerationConfig, Message};
use crate::models::UploadedFile;
use crate::normalizer::{read_multipart, StreamFields};
use crate::payload::build_content;
use crate::relay::spawn_relay;
use crate::session::{is_valid_session_id, new_session_id};
use crate::sse::frame_event;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_id";

/// GET /stream?question=...&thinking=...&tokens=...
pub async fn stream_query_handler(
    params: HashMap<String, String>,
    cookie: Option<String>,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    start_stream(StreamFields::from_query(&params), Vec::new(), cookie, state).await
}

/// POST /stream with a JSON object body
pub async fn stream_json_handler(
    body: Bytes,
    cookie: Option<String>,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let fields = StreamFields::from_json(&body).map_err(warp::reject::custom)?;
    start_stream(fields, Vec::new(), cookie, state).await
}

/// POST /stream with a multipart form carrying fields and files
pub async fn stream_multipart_handler(
    form: FormData,
    cookie: Option<String>,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let (fields, uploads) = read_multipart(form).await.map_err(warp::reject::custom)?;
    start_stream(fields, uploads, cookie, state).await
}

async fn start_stream(
    fields: StreamFields,
    uploads: Vec<UploadedFile>,
    cookie: Option<String>,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    let session_id = resolve_session_id(cookie);
    let request = prepare_stream(&state, &session_id, fields, uploads)
        .await
        .map_err(warp::reject::custom)?;

    let events = spawn_relay(state.provider.clone(), request).map(|frame| frame_event(&frame));

    Ok(warp::reply::with_header(
        warp::sse::reply(warp::sse::keep_alive().stream(events)),
        "set-cookie",
        session_cookie(&session_id, state.config.session_ttl),
    ))
}

/// Validate the fields, stage or look up the session's files and build the
/// upstream request
///
/// Fields are validated before anything touches disk, so a rejected request
/// never replaces the session's files.
pub async fn prepare_stream(
    state: &AppState,
    session_id: &str,
    fields: StreamFields,
    uploads: Vec<UploadedFile>,
) -> Result<GenerateRequest, RelayError> {
    let mut request = fields.into_request(Vec::new())?;
    request.check_thinking_budget(state.config.max_output_tokens)?;

    request.files = if uploads.is_empty() {
        state.sessions.get(session_id).await
    } else {
        state.sessions.put(session_id, uploads).await?
    };

    tracing::info!(
        session = %session_id,
        thinking = request.extended_thinking,
        tokens = request.thinking_token_budget,
        files = request.files.len(),
        "stream request"
    );
    tracing::debug!(question = %request.question, "question");

    let content = build_content(&request).await;

    let mut config = GenerationConfig::new(state.config.max_output_tokens);
    if request.extended_thinking {
        config = config.with_thinking(request.thinking_token_budget);
    }

    Ok(GenerateRequest {
        messages: vec![Message::user_blocks(content)],
        config,
        system: state.config.system_prompt.clone(),
    })
}

/// Keep a well-formed cookie value, otherwise mint a new session
pub fn resolve_session_id(cookie: Option<String>) -> String {
    match cookie {
        Some(id) if is_valid_session_id(&id) => id,
        Some(id) => {
            tracing::debug!(cookie = %id, "ignoring malformed session cookie");
            new_session_id()
        }
        None => new_session_id(),
    }
}

/// `Set-Cookie` value for the session token
pub fn session_cookie(session_id: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        session_id,
        ttl.as_secs()
    )
}
