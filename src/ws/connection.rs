//! WebSocket connection loop.
//!
//! Drives one socket through the [`ConnectionHandler`] lifecycle and
//! writes whatever the dispatch layer queues on the connection.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};

use crate::dispatch::ConnectionHandler;
use crate::domain::OriginatingRequest;
use crate::transport::{ChannelConnection, ConnectionHandle, Outbound};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Calls `on_open` once, then `on_message` for every text frame.
/// - Forwards frames queued on the connection to the socket, in order.
/// - Calls `on_close` once when either side ends the connection.
///
/// Dispatch errors are logged and do not close the connection.
pub async fn run_connection(
    socket: WebSocket,
    request: OriginatingRequest,
    handler: Arc<dyn ConnectionHandler>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (connection, mut outbound) = ChannelConnection::new(request);
    let connection = ConnectionHandle::new(connection);
    let id = connection.id();

    if let Err(err) = handler.on_open(connection.clone()) {
        tracing::warn!(connection = %id, error = %err, "open handler failed");
    }

    loop {
        tokio::select! {
            // Incoming frame from the peer
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(err) = handler.on_message(&connection, text.as_str()) {
                            tracing::warn!(
                                connection = %id,
                                kind = ?err.kind(),
                                error = %err,
                                "inbound call failed"
                            );
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(connection = %id, error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Frame queued by the dispatch layer
            frame = outbound.recv() => {
                match frame {
                    Some(Outbound::Text(text)) => {
                        if ws_tx.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Outbound::Close) => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    if let Err(err) = handler.on_close(&connection) {
        tracing::warn!(connection = %id, error = %err, "close handler failed");
    }
    let duration_ms =
        (Utc::now() - connection.http_request().received_at()).num_milliseconds();
    tracing::debug!(connection = %id, duration_ms, "ws connection finished");
}
