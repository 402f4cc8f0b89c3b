//! In-memory bookkeeping guarded by the hub lock

use std::collections::HashMap;
use std::sync::Arc;

use crate::matchmaking::Matchmaker;
use crate::session::Session;
use crate::types::{ConnectionId, SessionId};

/// Waiting list plus connection and session indices
#[derive(Debug)]
pub(crate) struct Registry {
    pub(crate) matchmaker: Matchmaker,
    sessions: HashMap<SessionId, Arc<Session>>,
    connections: HashMap<ConnectionId, SessionId>,
}

impl Registry {
    pub(crate) fn new(matchmaker: Matchmaker) -> Self {
        Self {
            matchmaker,
            sessions: HashMap::new(),
            connections: HashMap::new(),
        }
    }

    /// Register a session and bind every connection it holds
    pub(crate) fn insert_session(&mut self, session: Arc<Session>) {
        let id = session.id();
        for connection in session.connection_ids() {
            self.connections.insert(connection, id);
        }
        self.sessions.insert(id, session);
    }

    /// Remove a session and any connection still bound to it
    pub(crate) fn remove_session(&mut self, id: SessionId) -> Option<Arc<Session>> {
        self.connections.retain(|_, session_id| *session_id != id);
        self.sessions.remove(&id)
    }

    pub(crate) fn session(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get(&id).cloned()
    }

    pub(crate) fn contains_session(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub(crate) fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn bind(&mut self, connection: ConnectionId, id: SessionId) {
        self.connections.insert(connection, id);
    }

    pub(crate) fn unbind(&mut self, connection: ConnectionId) -> Option<SessionId> {
        self.connections.remove(&connection)
    }

    pub(crate) fn is_bound(&self, connection: ConnectionId) -> bool {
        self.connections.contains_key(&connection)
    }

    pub(crate) fn session_for(&self, connection: ConnectionId) -> Option<Arc<Session>> {
        self.connections
            .get(&connection)
            .and_then(|id| self.sessions.get(id))
            .cloned()
    }

    /// Session in which `username` holds a human seat
    pub(crate) fn session_for_identity(&self, username: &str) -> Option<Arc<Session>> {
        self.sessions
            .values()
            .find(|session| session.human_symbol(username).is_some())
            .cloned()
    }
}
