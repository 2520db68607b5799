// GET / handler

pub const LIVENESS_TEXT: &str = "Claude streaming relay is running";

pub async fn home_handler() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(LIVENESS_TEXT)
}
