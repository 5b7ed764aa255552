//! # remote-ws
//!
//! Symmetric one-way JSON RPC over a single WebSocket connection.
//!
//! A server object exposes a table of remotely callable methods; the peer
//! calls them by name with positional JSON arguments. The same connection
//! carries calls the other way: the server holds a generated client proxy
//! whose methods become outbound call frames.
//!
//! ## Architecture
//!
//! ```text
//! Peer (WebSocket)
//!     │
//!     ├── WS Handler (ws/)            upgrade, read/write loop
//!     │
//!     ├── Dispatcher (dispatch)       on_open / on_message / on_close
//!     │     ├── MethodRegistry        name → slots + handler
//!     │     └── SessionStore          connection → client proxy
//!     │
//!     ├── RemoteServer                your methods
//!     └── ClientProxy (remote_client!) calls back to the peer
//! ```
//!
//! ## Wire format
//!
//! - On open, this side sends `{"exports": ["<name>", ...]}`.
//! - Every call, in either direction, is `{"action": "<name>", "args": [...]}`.
//! - Nothing acknowledges a call.

pub mod api;
pub mod app_state;
pub mod chat;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod protocol;
pub mod proxy;
pub mod registry;
pub mod session;
pub mod transport;
pub mod ws;

pub use dispatch::{ConnectionHandler, Dispatcher, RemoteServer};
pub use domain::{ConnectionId, OriginatingRequest};
pub use error::{ErrorKind, RemoteError, Result};
pub use protocol::{CallMessage, ExportsAnnouncement};
pub use proxy::ClientProxy;
pub use registry::{Arguments, Injected, MethodRegistry, RegistryBuilder, Slot};
pub use transport::{Connection, ConnectionHandle};

/// Re-exports used by [`remote_client!`] expansions.
#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
