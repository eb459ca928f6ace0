use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::error::Result;
use crate::llm::{ChatCompletions, XaiClient};

use super::handlers;

/// State shared across all routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: Arc<dyn ChatCompletions>,
    /// Server-held credential for `/api/chat`.  `None` turns every relay
    /// request into a configuration error.
    pub api_key: Option<String>,
}

impl AppState {
    /// State backed by the real x.ai client.
    pub fn new(config: Config) -> Result<Self> {
        let upstream = Arc::new(XaiClient::new(&config.upstream)?);
        Ok(Self::with_upstream(config, upstream))
    }

    pub fn with_upstream(config: Config, upstream: Arc<dyn ChatCompletions>) -> Self {
        let api_key = config.api_key();
        Self {
            config: Arc::new(config),
            upstream,
            api_key,
        }
    }
}

pub fn build(state: AppState) -> Router {
    let router = Router::new()
        // API — Chat relays
        .route("/api/chat", post(handlers::chat))
        .route("/api/grok-chat", post(handlers::grok_chat))
        // API — Catalog
        .route("/api/skill-packs", get(handlers::list_skill_packs))
        .route("/healthz", get(handlers::healthz));

    let router = if state.config.server.cors_permissive {
        tracing::info!("permissive CORS enabled");
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}
