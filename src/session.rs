//! Per-connection sessions.
//!
//! A [`Session`] binds one connection to its client proxy for the
//! connection's lifetime. [`SessionStore`] is the only shared mutable state
//! of the dispatch layer: it is written once on open, read by message and
//! close events for the same connection, and emptied on close.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::domain::ConnectionId;
use crate::error::{RemoteError, Result};
use crate::proxy::ClientProxy;
use crate::transport::ConnectionHandle;

/// State bound to one open connection.
#[derive(Debug)]
pub struct Session<C> {
    client: C,
    opened_at: DateTime<Utc>,
}

impl<C: ClientProxy> Session<C> {
    /// Creates a session owning `client`.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            opened_at: Utc::now(),
        }
    }

    /// Key of this session.
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.client.connection().id()
    }

    /// The client proxy for this connection.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// The connection this session is bound to.
    #[must_use]
    pub fn connection(&self) -> &ConnectionHandle {
        self.client.connection()
    }

    /// When the connection was opened.
    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

/// Concurrent map from connection to session.
///
/// Entries are handed out as `Arc`s so no map guard is held while server
/// code runs.
#[derive(Debug)]
pub struct SessionStore<C> {
    sessions: DashMap<ConnectionId, Arc<Session<C>>>,
}

impl<C: ClientProxy> SessionStore<C> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Returns `true` if a session exists for `id`.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Stores a new session.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::AlreadyOpen`] if the connection already has one.
    pub fn open(&self, session: Session<C>) -> Result<Arc<Session<C>>> {
        let id = session.id();
        match self.sessions.entry(id) {
            Entry::Occupied(_) => Err(RemoteError::AlreadyOpen(id)),
            Entry::Vacant(slot) => {
                let session = Arc::new(session);
                slot.insert(Arc::clone(&session));
                Ok(session)
            }
        }
    }

    /// Returns the session for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotOpen`] if there is none.
    pub fn get(&self, id: ConnectionId) -> Result<Arc<Session<C>>> {
        self.sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(RemoteError::NotOpen(id))
    }

    /// Removes and returns the session for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::NotOpen`] if there is none.
    pub fn close(&self, id: ConnectionId) -> Result<Arc<Session<C>>> {
        self.sessions
            .remove(&id)
            .map(|(_, session)| session)
            .ok_or(RemoteError::NotOpen(id))
    }

    /// Number of open sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no session is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl<C: ClientProxy> Default for SessionStore<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::OriginatingRequest;
    use crate::transport::ChannelConnection;

    crate::remote_client! {
        /// Capability used by the session tests.
        pub struct Viewer {
            /// Refresh the view.
            fn refresh(&self);
        }
    }

    fn session() -> Session<Viewer> {
        let (conn, _rx) = ChannelConnection::new(OriginatingRequest::default());
        Session::new(Viewer::bind(ConnectionHandle::new(conn)))
    }

    #[test]
    fn open_get_close() {
        let store = SessionStore::new();
        let session = session();
        let id = session.id();

        assert!(store.open(session).is_ok());
        assert!(store.contains(id));
        assert_eq!(store.len(), 1);

        let Ok(found) = store.get(id) else {
            panic!("session stored");
        };
        assert_eq!(found.id(), id);
        assert!(found.opened_at() <= Utc::now());
        assert!(matches!(
            found.client().refresh(),
            Err(RemoteError::ConnectionClosed(closed)) if closed == id
        ));

        assert!(store.close(id).is_ok());
        assert!(store.is_empty());
        assert!(matches!(store.get(id), Err(RemoteError::NotOpen(_))));
    }

    #[test]
    fn second_open_is_rejected() {
        let store = SessionStore::new();
        let first = session();
        let id = first.id();
        let again = Session::new(first.client().clone());

        assert!(store.open(first).is_ok());
        assert!(matches!(store.open(again), Err(RemoteError::AlreadyOpen(dup)) if dup == id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn close_unknown_is_not_open() {
        let store: SessionStore<Viewer> = SessionStore::new();
        assert!(matches!(
            store.close(ConnectionId::new()),
            Err(RemoteError::NotOpen(_))
        ));
    }
}
