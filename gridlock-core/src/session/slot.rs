//! Player seats and connection handles

use tokio::sync::mpsc;

use crate::protocol::ServerMessage;
use crate::scheduler::ScheduledTask;
use crate::types::ConnectionId;

/// Outbound side of one live client connection
///
/// Sending never blocks: the transport drains the channel on its own task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { id, tx }
    }

    /// Create a handle with a fresh id together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(ConnectionId::new(), tx), rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a message. Returns false if the connection is gone.
    pub fn send(&self, message: ServerMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Fixed identity of a seat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub username: String,
    pub is_bot: bool,
}

/// A seat as handed to [`Session::new`](super::Session::new)
#[derive(Debug, Clone)]
pub struct Seat {
    pub(crate) player: Player,
    pub(crate) connection: Option<ConnectionHandle>,
}

impl Seat {
    pub fn human(username: impl Into<String>, connection: ConnectionHandle) -> Self {
        Self {
            player: Player {
                username: username.into(),
                is_bot: false,
            },
            connection: Some(connection),
        }
    }

    /// Bot seats never hold a connection
    pub fn bot(name: impl Into<String>) -> Self {
        Self {
            player: Player {
                username: name.into(),
                is_bot: true,
            },
            connection: None,
        }
    }
}

/// Mutable per-seat state, guarded by the session lock
#[derive(Debug, Default)]
pub(crate) struct SlotState {
    pub(crate) connection: Option<ConnectionHandle>,
    pub(crate) forfeit_timer: Option<ScheduledTask>,
    /// Bumped whenever a timer is armed or cancelled
    pub(crate) grace_generation: u64,
}

impl SlotState {
    pub(crate) fn send(&self, message: ServerMessage) {
        if let Some(connection) = &self.connection {
            if !connection.send(message) {
                tracing::debug!(connection_id = %connection.id(), "Dropped message for closed connection");
            }
        }
    }

    pub(crate) fn is_bound_to(&self, id: ConnectionId) -> bool {
        self.connection.as_ref().is_some_and(|c| c.id() == id)
    }

    /// Cancel the pending forfeit timer
    ///
    /// Also retires its generation, so a timer that already woke up is stale.
    pub(crate) fn cancel_timer(&mut self) -> bool {
        self.grace_generation += 1;
        match self.forfeit_timer.take() {
            Some(timer) => {
                timer.cancel();
                true
            }
            None => false,
        }
    }
}
