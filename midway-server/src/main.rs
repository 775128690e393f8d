use std::net::SocketAddr;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use midway_server::amap::{AmapClient, AmapConfig, DEFAULT_CITY};
use midway_server::cache::{CacheConfig, CachedMapProvider};
use midway_server::planner::PipelineConfig;
use midway_server::web::{AppState, create_router};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(message) = run().await {
        error!("{message}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    // Get credentials from environment
    let api_key = std::env::var("AMAP_KEY").unwrap_or_else(|_| {
        warn!("AMAP_KEY not set. API calls will fail.");
        String::new()
    });
    let city = std::env::var("AMAP_CITY").unwrap_or_else(|_| DEFAULT_CITY.to_string());

    let pipeline_config =
        PipelineConfig::from_env().map_err(|e| format!("invalid configuration: {e}"))?;

    // Create AMap client, with geocode results cached
    let amap = AmapClient::new(AmapConfig::new(api_key).with_city(&city))
        .map_err(|e| format!("failed to create AMap client: {e}"))?;
    let provider = CachedMapProvider::new(amap, &CacheConfig::default());

    let app = create_router(AppState::new(provider, pipeline_config));

    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .map_err(|e| format!("invalid BIND_ADDR: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    info!(%addr, %city, "meeting-point planner listening");
    info!("  GET /health");
    info!("  GET /api/middle-stations?start=..&end=..[&balance_weight=..]");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server error: {e}"))
}
