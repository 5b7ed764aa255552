//! Transport abstraction: what the dispatch layer needs from a connection.
//!
//! The transport owns connection identity and frame delivery. The rest of
//! the crate only sees a [`ConnectionHandle`], a cheap clone of a shared
//! [`Connection`] implementation.

pub mod channel;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{ConnectionId, OriginatingRequest};
use crate::error::Result;
use crate::protocol::{CallMessage, ExportsAnnouncement};

pub use channel::{ChannelConnection, Outbound};

/// One open duplex connection.
///
/// Implementations must preserve message boundaries and the order of
/// `send` calls.
pub trait Connection: Send + Sync + fmt::Debug {
    /// Identity of this connection.
    fn id(&self) -> ConnectionId;

    /// Sends one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemoteError::ConnectionClosed`] if the connection can
    /// no longer deliver frames.
    fn send(&self, text: String) -> Result<()>;

    /// Asks the transport to close the connection after frames already sent.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemoteError::ConnectionClosed`] if the connection is
    /// already gone.
    fn close(&self) -> Result<()>;

    /// The HTTP request this connection was upgraded from.
    fn http_request(&self) -> &Arc<OriginatingRequest>;
}

/// Shared handle to a [`Connection`].
///
/// Equality and hashing follow [`ConnectionId`], so two handles compare
/// equal when they refer to the same connection.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<dyn Connection>,
}

impl ConnectionHandle {
    /// Wraps a connection implementation.
    #[must_use]
    pub fn new<T: Connection + 'static>(connection: T) -> Self {
        Self {
            inner: Arc::new(connection),
        }
    }

    /// Identity of the underlying connection.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.inner.id()
    }

    /// Sends one raw text frame.
    ///
    /// # Errors
    ///
    /// Propagates the transport's send failure.
    pub fn send(&self, text: impl Into<String>) -> Result<()> {
        self.inner.send(text.into())
    }

    /// Encodes `message` as JSON and sends it as one frame.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RemoteError::Serialization`] if encoding fails, or the
    /// transport's send failure.
    pub fn send_json<T: Serialize>(&self, message: &T) -> Result<()> {
        let text = serde_json::to_string(message)?;
        self.inner.send(text)
    }

    /// Sends a one-way call to the peer.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send_json`].
    pub fn call(&self, action: &str, args: Vec<Value>) -> Result<()> {
        tracing::debug!(connection = %self.id(), action, "outbound call");
        let text = CallMessage::new(action, args).encode()?;
        self.inner.send(text)
    }

    /// Sends the exports announcement.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send_json`].
    pub fn announce_exports(&self, announcement: &ExportsAnnouncement) -> Result<()> {
        self.send_json(announcement)
    }

    /// Closes the underlying connection.
    ///
    /// # Errors
    ///
    /// Propagates the transport's close failure.
    pub fn close(&self) -> Result<()> {
        self.inner.close()
    }

    /// The HTTP request this connection was upgraded from.
    #[must_use]
    pub fn http_request(&self) -> &Arc<OriginatingRequest> {
        self.inner.http_request()
    }

    /// Returns `true` if both handles share the same connection object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection {}", self.id())
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ConnectionHandle {}

impl Hash for ConnectionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
