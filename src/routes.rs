// Route definitions

use std::collections::HashMap;
use std::convert::Infallible;
use warp::Filter;

use crate::error::handle_rejection;
use crate::handlers;
use crate::handlers::stream::SESSION_COOKIE;
use crate::state::AppState;

pub fn configure_routes(
    state: AppState,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let max_upload_bytes = state.config.max_upload_bytes;

    // GET /
    let home = warp::path::end()
        .and(warp::get())
        .and_then(handlers::home_handler);

    // GET /stream?question=...
    let stream_get = warp::path!("stream")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(session_cookie())
        .and(with_state(state.clone()))
        .and_then(handlers::stream_query_handler);

    // POST /stream (multipart form)
    let stream_multipart = warp::path!("stream")
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(session_cookie())
        .and(with_state(state.clone()))
        .and_then(handlers::stream_multipart_handler);

    // POST /stream (JSON body)
    let stream_json = warp::path!("stream")
        .and(warp::post())
        .and(warp::body::content_length_limit(max_upload_bytes))
        .and(warp::body::bytes())
        .and(session_cookie())
        .and(with_state(state.clone()))
        .and_then(handlers::stream_json_handler);

    // POST /clear_files
    let clear_files = warp::path!("clear_files")
        .and(warp::post())
        .and(session_cookie())
        .and(with_state(state))
        .and_then(handlers::clear_files_handler);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    home.or(stream_get)
        .or(stream_multipart)
        .or(stream_json)
        .or(clear_files)
        .recover(handle_rejection)
        .with(cors)
}

fn with_state(
    state: AppState,
) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn session_cookie() -> impl Filter<Extract = (Option<String>,), Error = Infallible> + Copy {
    warp::cookie::optional(SESSION_COOKIE)
}
