//! Parameter slots and resolved arguments.
//!
//! A remote method describes its parameter list as an ordered sequence of
//! [`Slot`]s. Resolution walks the slots once, filling injected slots from
//! the connection's session and positional slots from the call's `args`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::OriginatingRequest;
use crate::error::{RemoteError, Result};
use crate::proxy::ClientProxy;
use crate::transport::ConnectionHandle;

/// Context the dispatcher supplies instead of reading it from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Injected {
    /// The session's client proxy.
    Client,
    /// The raw connection the call arrived on.
    Connection,
    /// The HTTP request the connection was upgraded from.
    Request,
}

/// One parameter of a remote method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Filled by the dispatcher.
    Injected(Injected),
    /// Filled from the next unread element of the call's `args`.
    Positional,
}

impl Slot {
    /// Shorthand for `Slot::Injected(Injected::Client)`.
    pub const CLIENT: Self = Self::Injected(Injected::Client);
    /// Shorthand for `Slot::Injected(Injected::Connection)`.
    pub const CONNECTION: Self = Self::Injected(Injected::Connection);
    /// Shorthand for `Slot::Injected(Injected::Request)`.
    pub const REQUEST: Self = Self::Injected(Injected::Request);
}

/// A resolved value for one slot.
#[derive(Debug, Clone)]
pub enum Argument<C> {
    /// Client proxy of the calling connection.
    Client(C),
    /// The calling connection.
    Connection(ConnectionHandle),
    /// Upgrade request of the calling connection.
    Request(Arc<OriginatingRequest>),
    /// A data argument taken from the wire.
    Value(Value),
}

impl<C> Argument<C> {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Client(_) => "client",
            Self::Connection(_) => "connection",
            Self::Request(_) => "request",
            Self::Value(_) => "value",
        }
    }
}

/// Fully resolved argument list handed to a method handler.
///
/// Indices are parameter slot positions, injected and positional alike.
/// Handlers should read every argument they need before acting, so that a
/// bad argument fails the call without side effects.
#[derive(Debug, Clone)]
pub struct Arguments<C> {
    action: String,
    values: Vec<Argument<C>>,
}

impl<C: ClientProxy> Arguments<C> {
    pub(crate) fn new(action: String, values: Vec<Argument<C>>) -> Self {
        Self { action, values }
    }

    /// Action these arguments were resolved for.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the method takes no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the client proxy at slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidArgument`] if the slot is out of range or
    /// holds something else.
    pub fn client(&self, index: usize) -> Result<&C> {
        match self.slot(index)? {
            Argument::Client(client) => Ok(client),
            other => Err(self.mismatch(index, "client", other)),
        }
    }

    /// Returns the connection at slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidArgument`] if the slot is out of range or
    /// holds something else.
    pub fn connection(&self, index: usize) -> Result<&ConnectionHandle> {
        match self.slot(index)? {
            Argument::Connection(connection) => Ok(connection),
            other => Err(self.mismatch(index, "connection", other)),
        }
    }

    /// Returns the originating request at slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidArgument`] if the slot is out of range or
    /// holds something else.
    pub fn request(&self, index: usize) -> Result<&OriginatingRequest> {
        match self.slot(index)? {
            Argument::Request(request) => Ok(request.as_ref()),
            other => Err(self.mismatch(index, "request", other)),
        }
    }

    /// Returns the raw JSON data argument at slot `index`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidArgument`] if the slot is out of range or
    /// is an injected slot.
    pub fn raw(&self, index: usize) -> Result<&Value> {
        match self.slot(index)? {
            Argument::Value(value) => Ok(value),
            other => Err(self.mismatch(index, "value", other)),
        }
    }

    /// Decodes the data argument at slot `index` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidArgument`] if the slot is not a data
    /// argument or its JSON does not decode into `T`.
    pub fn value<T: DeserializeOwned>(&self, index: usize) -> Result<T> {
        let raw = self.raw(index)?;
        T::deserialize(raw).map_err(|e| RemoteError::InvalidArgument {
            action: self.action.clone(),
            index,
            reason: e.to_string(),
        })
    }

    fn slot(&self, index: usize) -> Result<&Argument<C>> {
        self.values
            .get(index)
            .ok_or_else(|| RemoteError::InvalidArgument {
                action: self.action.clone(),
                index,
                reason: format!("method has {} parameter slots", self.values.len()),
            })
    }

    fn mismatch(&self, index: usize, wanted: &str, found: &Argument<C>) -> RemoteError {
        RemoteError::InvalidArgument {
            action: self.action.clone(),
            index,
            reason: format!("expected {wanted}, found {}", found.kind()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::transport::{ChannelConnection, Outbound};
    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    crate::remote_client! {
        /// Minimal capability.
        pub struct Echo {
            /// Echo back.
            fn echo(&self, text: &str);
        }
    }

    fn sample() -> Arguments<Echo> {
        sample_with_frames().0
    }

    fn sample_with_frames() -> (Arguments<Echo>, UnboundedReceiver<Outbound>) {
        let (conn, rx) = ChannelConnection::new(OriginatingRequest::default());
        let handle = ConnectionHandle::new(conn);
        let client = Echo::bind(handle.clone());
        let args = Arguments::new(
            "greet".to_string(),
            vec![
                Argument::Client(client),
                Argument::Value(json!("hello")),
                Argument::Connection(handle),
                Argument::Value(json!({"n": 3})),
            ],
        );
        (args, rx)
    }

    #[test]
    fn typed_accessors_match_slots() {
        let (args, mut rx) = sample_with_frames();
        assert_eq!(args.len(), 4);
        assert_eq!(args.action(), "greet");
        assert_eq!(args.value::<String>(1).ok(), Some("hello".to_string()));
        assert!(args.connection(2).is_ok());
        assert_eq!(args.raw(3).ok(), Some(&json!({"n": 3})));

        let Ok(client) = args.client(0) else {
            panic!("client slot");
        };
        assert!(client.echo("hello").is_ok());
        assert_eq!(
            rx.try_recv().ok(),
            Some(Outbound::Text(r#"{"action":"echo","args":["hello"]}"#.to_string()))
        );
    }

    #[test]
    fn wrong_kind_is_invalid_argument() {
        let args = sample();
        let err = args.connection(0);
        let Err(RemoteError::InvalidArgument { index, reason, .. }) = err else {
            panic!("expected invalid argument");
        };
        assert_eq!(index, 0);
        assert_eq!(reason, "expected connection, found client");

        assert!(args.value::<String>(0).is_err());
        assert!(args.request(1).is_err());
    }

    #[test]
    fn undecodable_value_is_invalid_argument() {
        let args = sample();
        let err = args.value::<u32>(1);
        assert!(matches!(err, Err(RemoteError::InvalidArgument { index: 1, .. })));
    }

    #[test]
    fn out_of_range_is_invalid_argument() {
        let args = sample();
        assert!(matches!(
            args.raw(9),
            Err(RemoteError::InvalidArgument { index: 9, .. })
        ));
    }
}
