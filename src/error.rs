// Relay error taxonomy and rejection handling

use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::llm::LlmError;

/// Errors surfaced by the relay itself
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing question, malformed body, or non-numeric token budget
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Startup configuration problems
    #[error("Configuration error: {0}")]
    Config(String),

    /// Staging or removing session files failed
    #[error("Session storage error: {0}")]
    Session(#[from] std::io::Error),

    /// Upstream call could not be made
    #[error(transparent)]
    Upstream(#[from] LlmError),
}

impl warp::reject::Reject for RelayError {}

impl RelayError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            RelayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            RelayError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            RelayError::Session(_) => (StatusCode::INTERNAL_SERVER_ERROR, "session_error"),
            RelayError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
        }
    }
}

/// JSON body of every error reply
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Turn rejections into JSON error replies
pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, kind, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not_found", "Not found".to_string())
    } else if let Some(relay_error) = err.find::<RelayError>() {
        let (status, kind) = relay_error.status_and_kind();
        if status.is_server_error() {
            tracing::error!(error = %relay_error, "request failed");
        } else {
            tracing::warn!(error = %relay_error, "request rejected");
        }
        (status, kind, relay_error.to_string())
    } else if let Some(e) = err.find::<warp::reject::PayloadTooLarge>() {
        (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", e.to_string())
    } else if let Some(e) = err.find::<warp::reject::LengthRequired>() {
        (StatusCode::LENGTH_REQUIRED, "length_required", e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, "invalid_request", e.to_string())
    } else if let Some(e) = err.find::<warp::reject::InvalidHeader>() {
        (StatusCode::BAD_REQUEST, "invalid_request", e.to_string())
    } else if let Some(e) = err.find::<warp::reject::UnsupportedMediaType>() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported_media_type",
            e.to_string(),
        )
    } else if let Some(e) = err.find::<warp::reject::MethodNotAllowed>() {
        (StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed", e.to_string())
    } else {
        tracing::error!(rejection = ?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody {
            error: kind,
            message,
        }),
        status,
    ))
}
