mod chat;
mod config;
mod error;
mod llm;
mod server;
mod skills;

use std::path::PathBuf;

use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::Config;

#[tokio::main]
async fn main() {
    // Load .env file (if present) before anything reads env vars
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    if args.iter().any(|a| a == "--default-config") {
        print!("{}", Config::default_config_contents());
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);

    let config = match Config::load(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    if args.iter().any(|a| a == "--check") {
        if !run_checks(&config) {
            std::process::exit(1);
        }
        return;
    }

    info!(
        bind = %config.bind,
        model = %config.upstream.model,
        base_url = %config.upstream.base_url,
        skill_packs = skills::registry::len(),
        "skillpack-relay starting"
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let server_handle = {
        let shutdown_rx = shutdown_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = server::serve(config, shutdown_rx).await {
                error!("server error: {e}");
                std::process::exit(1);
            }
        })
    };

    info!("skillpack-relay is running — press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl+c: {e}");
    }

    info!("shutdown signal received, stopping...");
    let _ = shutdown_tx.send(());
    let _ = server_handle.await;
    info!("skillpack-relay stopped");
}

/// Validate configuration without starting the server.  Returns `false` when
/// the relay could not serve `/api/chat`.
fn run_checks(config: &Config) -> bool {
    info!("running pre-flight checks...");
    info!("config: OK");
    info!("  bind: {}", config.bind);
    info!("  upstream: {}", config.upstream.base_url);
    info!("  model: {}", config.upstream.model);
    info!("  temperature: {}", config.upstream.temperature);
    info!("  max_tokens: {}", config.upstream.max_tokens);
    if config.upstream.timeout_secs > 0 {
        info!("  timeout: {}s", config.upstream.timeout_secs);
    } else {
        info!("  timeout: none");
    }

    let mut ok = true;

    match config.bind.parse::<std::net::SocketAddr>() {
        Ok(_) => info!("bind address: OK"),
        Err(e) => {
            error!("bind address: INVALID ({}): {e}", config.bind);
            ok = false;
        }
    }

    match llm::XaiClient::new(&config.upstream) {
        Ok(client) => info!("upstream client: OK ({})", client.endpoint()),
        Err(e) => {
            error!("upstream client: {e}");
            ok = false;
        }
    }

    match config.api_key() {
        Some(_) => info!("XAI_API_KEY: set"),
        None => {
            error!("XAI_API_KEY: NOT SET (/api/chat will answer 500)");
            ok = false;
        }
    }

    let ids: Vec<&str> = skills::registry::all().iter().map(|p| p.id).collect();
    info!("skill packs: {}", ids.join(", "));

    ok
}

fn print_usage() {
    println!(
        "skillpack-relay — skill-pack prompt composer and chat completion relay

USAGE:
    skillpack-relay [OPTIONS]

OPTIONS:
    --config <PATH>     Path to config file (default: ~/.config/skillpack-relay/config.toml)
    --default-config    Print default config to stdout and exit
    --check             Validate config and credentials, then exit
    -h, --help          Print this help message

ROUTES:
    POST /api/chat          Compose skill packs and relay to the upstream model
    POST /api/grok-chat     Pass-through relay using a caller-supplied key
    GET  /api/skill-packs   List available skill packs
    GET  /healthz           Health check

ENVIRONMENT:
    XAI_API_KEY         Required for /api/chat. Upstream bearer credential.
    XAI_BASE_URL        Optional. Upstream API base URL (default: https://api.x.ai/v1).
    XAI_MODEL           Optional. Model name (default: grok-2-1212).
    RELAY_BIND          Optional. Listen address (default: 127.0.0.1:3000).
    RUST_LOG            Optional. Tracing filter (default: info).
"
    );
}
