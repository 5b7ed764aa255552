//! HTTP surface: health endpoint and the WebSocket route.

pub mod system;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the router with the WebSocket endpoint mounted at `ws_path`.
pub fn build_router(ws_path: &str) -> Router<AppState> {
    Router::new()
        .route(ws_path, get(ws_handler))
        .merge(system::routes())
}
