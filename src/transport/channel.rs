//! Channel-backed connection used by the WebSocket loop.
//!
//! Frames are pushed into an unbounded tokio mpsc channel; the task that
//! owns the socket drains the receiver and writes to the wire.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::Connection;
use crate::domain::{ConnectionId, OriginatingRequest};
use crate::error::{RemoteError, Result};

/// Frame queued for the socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Text frame to deliver.
    Text(String),
    /// Close the socket after everything queued before it.
    Close,
}

/// [`Connection`] that forwards frames to an mpsc channel.
#[derive(Debug)]
pub struct ChannelConnection {
    id: ConnectionId,
    request: Arc<OriginatingRequest>,
    sender: mpsc::UnboundedSender<Outbound>,
}

impl ChannelConnection {
    /// Creates a connection with a fresh id, returning the receiving end of
    /// its frame channel.
    #[must_use]
    pub fn new(request: OriginatingRequest) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let connection = Self {
            id: ConnectionId::new(),
            request: Arc::new(request),
            sender,
        };
        (connection, receiver)
    }

    fn push(&self, frame: Outbound) -> Result<()> {
        self.sender
            .send(frame)
            .map_err(|_| RemoteError::ConnectionClosed(self.id))
    }
}

impl Connection for ChannelConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, text: String) -> Result<()> {
        self.push(Outbound::Text(text))
    }

    fn close(&self) -> Result<()> {
        self.push(Outbound::Close)
    }

    fn http_request(&self) -> &Arc<OriginatingRequest> {
        &self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_arrive_in_order() {
        let (conn, mut rx) = ChannelConnection::new(OriginatingRequest::default());
        assert!(conn.send("one".to_string()).is_ok());
        assert!(conn.close().is_ok());

        assert_eq!(rx.try_recv().ok(), Some(Outbound::Text("one".to_string())));
        assert_eq!(rx.try_recv().ok(), Some(Outbound::Close));
    }

    #[test]
    fn send_after_receiver_dropped_fails() {
        let (conn, rx) = ChannelConnection::new(OriginatingRequest::default());
        drop(rx);
        let err = conn.send("late".to_string());
        assert!(matches!(err, Err(RemoteError::ConnectionClosed(id)) if id == conn.id()));
    }
}
