pub mod handlers;
pub mod routes;

use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{RelayError, Result};
use routes::AppState;

pub async fn serve(config: Config, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
    let bind = config.bind.clone();
    let state = AppState::new(config)?;

    if state.api_key.is_none() {
        warn!("XAI_API_KEY is not set; /api/chat will answer 500 until it is configured");
    }

    let app = routes::build(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| RelayError::Config(format!("failed to bind {bind}: {e}")))?;

    info!(bind = %bind, "relay listening (HTTP)");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
        .map_err(|e| RelayError::Config(format!("server error: {e}")))?;

    Ok(())
}
