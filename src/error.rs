//! Error types for the remote call layer.
//!
//! [`RemoteError`] is the single error type returned by every fallible
//! operation in the crate. [`RemoteError::kind`] groups the variants into
//! the coarse categories the hosting runtime cares about.

use crate::domain::ConnectionId;

/// Coarse classification of a [`RemoteError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The dispatch layer was assembled incorrectly. Fatal at construction.
    Configuration,
    /// An inbound frame could not be decoded or resolved.
    Protocol,
    /// An outbound argument could not be encoded.
    Serialization,
    /// The target server method failed.
    Invocation,
    /// The connection was not in a state that allows the operation.
    Transport,
}

/// Errors raised while building, dispatching or sending remote calls.
///
/// No variant is ever sent to the peer: calls are one-way, so errors only
/// surface on the side that observed them.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// Capability or method table is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Inbound text is not a valid call message.
    #[error("malformed call message: {0}")]
    MalformedMessage(#[source] serde_json::Error),

    /// Outbound value could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No remote method is registered under the requested action.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The call supplied fewer data arguments than the method consumes.
    #[error("action {action}: missing data argument at position {index}")]
    MissingArgument {
        /// Action being resolved.
        action: String,
        /// Zero-based position among the supplied data arguments.
        index: usize,
    },

    /// A resolved argument did not have the kind or shape the handler asked for.
    #[error("action {action}: invalid argument at slot {index}: {reason}")]
    InvalidArgument {
        /// Action being invoked.
        action: String,
        /// Zero-based parameter slot.
        index: usize,
        /// What went wrong.
        reason: String,
    },

    /// The server method returned an error.
    #[error("action {action} failed: {source}")]
    Invocation {
        /// Action that was invoked.
        action: String,
        /// Error returned by the handler.
        #[source]
        source: anyhow::Error,
    },

    /// A lifecycle callback of the server object failed.
    #[error("{callback} callback failed for connection {connection}: {source}")]
    Lifecycle {
        /// `on_open` or `on_close`.
        callback: &'static str,
        /// Connection the callback ran for.
        connection: ConnectionId,
        /// Error returned by the server object.
        #[source]
        source: anyhow::Error,
    },

    /// `on_open` was delivered twice for the same connection.
    #[error("connection {0} is already open")]
    AlreadyOpen(ConnectionId),

    /// An event arrived for a connection with no open session.
    #[error("connection {0} is not open")]
    NotOpen(ConnectionId),

    /// The transport side of the connection has gone away.
    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),
}

impl RemoteError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::MalformedMessage(_)
            | Self::UnknownAction(_)
            | Self::MissingArgument { .. }
            | Self::InvalidArgument { .. } => ErrorKind::Protocol,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Invocation { .. } | Self::Lifecycle { .. } => ErrorKind::Invocation,
            Self::AlreadyOpen(_) | Self::NotOpen(_) | Self::ConnectionClosed(_) => {
                ErrorKind::Transport
            }
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RemoteError>;
