//! Domain layer: connection identity and upgrade request metadata.
//!
//! These types are owned by the transport and read by the dispatch layer
//! when it binds sessions and injects handler parameters.

pub mod connection_id;
pub mod request;

pub use connection_id::ConnectionId;
pub use request::OriginatingRequest;
