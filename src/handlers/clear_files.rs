// POST /clear_files handler

use crate::models::ClearFilesResponse;
use crate::session::is_valid_session_id;
use crate::state::AppState;

pub async fn clear_files_handler(
    cookie: Option<String>,
    state: AppState,
) -> Result<impl warp::Reply, warp::Rejection> {
    match cookie {
        Some(session_id) if is_valid_session_id(&session_id) => {
            state
                .sessions
                .clear(&session_id)
                .await
                .map_err(warp::reject::custom)?;
        }
        _ => tracing::debug!("clear_files without a session cookie"),
    }

    Ok(warp::reply::json(&ClearFilesResponse::success()))
}
