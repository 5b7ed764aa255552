//! remote-ws demo server entry point.
//!
//! Serves the chat room over WebSocket plus a health endpoint.

use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use remote_ws::api;
use remote_ws::app_state::AppState;
use remote_ws::chat::ChatRoom;
use remote_ws::config::{LogFormat, ServerConfig};
use remote_ws::dispatch::Dispatcher;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
    tracing::info!(addr = %config.listen_addr, ws_path = %config.ws_path, "starting remote-ws");

    // Build dispatch layer
    let room = Arc::new(ChatRoom::new());
    let dispatcher = Dispatcher::from_shared(room)?;

    // Build application state
    let app_state = AppState::new(dispatcher.into_handler());

    // Build router
    let app = api::build_router(&config.ws_path)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
