//! Dispatch handler bound to the transport's connection lifecycle.
//!
//! One [`Dispatcher`] serves every connection. It owns the shared
//! [`MethodRegistry`] and a [`SessionStore`] with one session per open
//! connection:
//!
//! ```text
//! on_open    → exports announcement → session + proxy → server.on_open(proxy)
//! on_message → decode → registry lookup → slot resolution → handler
//! on_close   → drop session → server.on_close(proxy)
//! ```
//!
//! Calls are one-way. Nothing is sent back for an inbound call, whether it
//! succeeds or fails; failures are returned to the transport instead.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{RemoteError, Result};
use crate::protocol::{CallMessage, ExportsAnnouncement};
use crate::proxy::{ClientProxy, validate_capability};
use crate::registry::{MethodRegistry, RegistryBuilder};
use crate::session::{Session, SessionStore};
use crate::transport::ConnectionHandle;

/// Server-side object whose methods the peer may call.
///
/// The method table replaces runtime discovery: everything `methods`
/// registers on `table` is remotely callable, nothing else is.
///
/// The peer's capability must be a [`ClientProxy`]. A concrete type that is
/// not one is rejected when the impl is compiled:
///
/// ```compile_fail
/// use remote_ws::{RegistryBuilder, RemoteServer};
///
/// struct Plain;
///
/// impl RemoteServer for Plain {
///     type Client = String;
///
///     fn methods(table: RegistryBuilder<Self>) -> RegistryBuilder<Self> {
///         table
///     }
/// }
/// ```
pub trait RemoteServer: Send + Sync + Sized + 'static {
    /// Capability interface of the peer.
    type Client: ClientProxy;

    /// Registers the remotely callable methods on `table`.
    fn methods(table: RegistryBuilder<Self>) -> RegistryBuilder<Self>;

    /// Builds and validates the method table.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] if a name is empty or
    /// registered twice.
    fn build_registry() -> Result<MethodRegistry<Self>> {
        Self::methods(RegistryBuilder::new()).build()
    }

    /// Called once a connection is open and its proxy is ready.
    ///
    /// # Errors
    ///
    /// Any error is reported to the transport as [`RemoteError::Lifecycle`].
    fn on_open(&self, client: &Self::Client) -> anyhow::Result<()> {
        let _ = client;
        Ok(())
    }

    /// Called once after a connection has closed.
    ///
    /// # Errors
    ///
    /// Any error is reported to the transport as [`RemoteError::Lifecycle`].
    fn on_close(&self, client: &Self::Client) -> anyhow::Result<()> {
        let _ = client;
        Ok(())
    }
}

/// Lifecycle callbacks a transport drives for each connection.
///
/// For a single connection the transport delivers `on_open`, then messages
/// in receipt order, then `on_close`. Different connections may be served
/// concurrently.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// A connection was accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be bound.
    fn on_open(&self, connection: ConnectionHandle) -> Result<()>;

    /// A text frame arrived.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be dispatched.
    fn on_message(&self, connection: &ConnectionHandle, text: &str) -> Result<()>;

    /// The connection closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection was not open.
    fn on_close(&self, connection: &ConnectionHandle) -> Result<()>;

    /// Number of connections currently open.
    fn open_connections(&self) -> usize;
}

/// Name-based call dispatcher for a [`RemoteServer`].
pub struct Dispatcher<S: RemoteServer> {
    server: Arc<S>,
    registry: Arc<MethodRegistry<S>>,
    sessions: SessionStore<S::Client>,
}

impl<S: RemoteServer> Dispatcher<S> {
    /// Validates the capability, builds the method table and wraps `server`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Configuration`] if the capability declares an
    /// invalid method list or the server's table is invalid.
    pub fn new(server: S) -> Result<Self> {
        Self::from_shared(Arc::new(server))
    }

    /// Same as [`Self::new`] for a server that is already shared.
    ///
    /// # Errors
    ///
    /// See [`Self::new`].
    pub fn from_shared(server: Arc<S>) -> Result<Self> {
        validate_capability::<S::Client>()?;
        let registry = S::build_registry()?;
        tracing::info!(
            server = std::any::type_name::<S>(),
            methods = registry.len(),
            "remote method table built"
        );
        Ok(Self {
            server,
            registry: Arc::new(registry),
            sessions: SessionStore::new(),
        })
    }

    /// The wrapped server object.
    #[must_use]
    pub fn server(&self) -> &Arc<S> {
        &self.server
    }

    /// The shared method table.
    #[must_use]
    pub fn registry(&self) -> &MethodRegistry<S> {
        &self.registry
    }

    /// The per-connection sessions.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore<S::Client> {
        &self.sessions
    }

    /// Converts into a shareable transport handler.
    #[must_use]
    pub fn into_handler(self) -> Arc<dyn ConnectionHandler> {
        Arc::new(self)
    }
}

impl<S: RemoteServer> ConnectionHandler for Dispatcher<S> {
    fn on_open(&self, connection: ConnectionHandle) -> Result<()> {
        let id = connection.id();
        if self.sessions.contains(id) {
            return Err(RemoteError::AlreadyOpen(id));
        }

        connection.announce_exports(&ExportsAnnouncement::new(self.registry.exported_names()))?;

        let client = <S::Client as ClientProxy>::bind(connection);
        let session = self.sessions.open(Session::new(client))?;
        tracing::info!(connection = %id, "connection opened");

        self.server
            .on_open(session.client())
            .map_err(|source| RemoteError::Lifecycle {
                callback: "on_open",
                connection: id,
                source,
            })
    }

    fn on_message(&self, connection: &ConnectionHandle, text: &str) -> Result<()> {
        let id = connection.id();
        let session = self.sessions.get(id)?;
        let call = CallMessage::decode(text)?;

        let method = self
            .registry
            .lookup(&call.action)
            .ok_or_else(|| RemoteError::UnknownAction(call.action.clone()))?;

        let args = method.descriptor().resolve(call.args, session.client())?;
        tracing::debug!(connection = %id, action = %call.action, "inbound call");
        method.invoke(&self.server, args)
    }

    fn on_close(&self, connection: &ConnectionHandle) -> Result<()> {
        let id = connection.id();
        let session = self.sessions.close(id)?;
        let open_ms = (Utc::now() - session.opened_at()).num_milliseconds();
        tracing::info!(connection = %id, open_ms, "connection closed");

        self.server
            .on_close(session.client())
            .map_err(|source| RemoteError::Lifecycle {
                callback: "on_close",
                connection: id,
                source,
            })
    }

    fn open_connections(&self) -> usize {
        self.sessions.len()
    }
}

impl<S: RemoteServer> fmt::Debug for Dispatcher<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("server", &std::any::type_name::<S>())
            .field("registry", &self.registry)
            .field("open_sessions", &self.sessions.len())
            .finish()
    }
}
