//! WebSocket transport: upgrade handler and per-connection loop.
//!
//! Each accepted socket becomes a [`crate::transport::ChannelConnection`]
//! whose lifecycle is driven through the application's
//! [`crate::ConnectionHandler`].

pub mod connection;
pub mod handler;
