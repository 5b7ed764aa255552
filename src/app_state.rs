//! Shared application state injected into all Axum handlers.

use std::fmt;
use std::sync::Arc;

use crate::dispatch::ConnectionHandler;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Lifecycle handler every WebSocket connection is bound to.
    pub handler: Arc<dyn ConnectionHandler>,
}

impl AppState {
    /// Creates the state around a connection handler.
    #[must_use]
    pub fn new(handler: Arc<dyn ConnectionHandler>) -> Self {
        Self { handler }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("open_connections", &self.handler.open_connections())
            .finish()
    }
}
