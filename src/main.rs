use std::sync::Arc;

use futures_util::stream::StreamExt;
use tokio::time::interval;
use tokio_stream::wrappers::IntervalStream;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use claude_stream_relay::config::RelayConfig;
use claude_stream_relay::llm::create_provider;
use claude_stream_relay::routes::configure_routes;
use claude_stream_relay::session::{DiskSessionStore, SessionStore};
use claude_stream_relay::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("claude_stream_relay=info,warp=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "relay failed to start");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::from_env()?;
    let provider = create_provider(&config)?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let sessions: Arc<dyn SessionStore> =
        Arc::new(DiskSessionStore::new(config.upload_dir.clone(), config.session_ttl));

    spawn_sweeper(sessions.clone(), config.sweep_interval);

    tracing::info!(
        model = %config.model,
        upload_dir = %config.upload_dir.display(),
        "Starting server on http://{}",
        config.bind_addr
    );

    let bind_addr = config.bind_addr;
    let routes = configure_routes(AppState::new(config, provider, sessions));
    warp::serve(routes).run(bind_addr).await;
    Ok(())
}

/// Periodically delete expired sessions and their files
fn spawn_sweeper(sessions: Arc<dyn SessionStore>, every: std::time::Duration) {
    tokio::spawn(async move {
        // The first tick fires immediately; skip it
        let mut ticks = IntervalStream::new(interval(every)).skip(1);
        while ticks.next().await.is_some() {
            let removed = sessions.purge_expired().await;
            if removed > 0 {
                tracing::info!(removed, "purged expired sessions");
            }
        }
    });
}
