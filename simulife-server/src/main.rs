//! SimuLife companion backend binary.
//!
//! Serves the progress endpoints and legacy counters over the built-in
//! story. Configuration comes from `SIMULIFE_ADDR` and `SIMULIFE_POST_ID`;
//! log filtering from `RUST_LOG`.

use simulife_core::story;
use simulife_server::{router, AppState, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let graph = story::simulife();
    tracing::info!(
        scenes = graph.scene_count(),
        version = graph.version(),
        instance = %config.story_instance,
        "story graph loaded"
    );

    let state = Arc::new(AppState::from_config(&config, graph));
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "SimuLife server listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
