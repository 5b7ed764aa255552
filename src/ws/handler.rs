//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::OriginatingRequest;

/// `GET {ws_path}`: upgrades the HTTP connection to WebSocket.
///
/// The upgrade request's method, target and headers are kept as the
/// connection's [`OriginatingRequest`].
pub async fn ws_handler(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let request = OriginatingRequest::new(method, uri, headers);
    let handler = Arc::clone(&state.handler);

    ws.on_upgrade(move |socket| run_connection(socket, request, handler))
}
