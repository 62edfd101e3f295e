//! Outbound side of a client connection.
//!
//! The room actor only ever pushes [`ServerEvent`]s into a connection's
//! unbounded queue. The `WebSocket` task on the other end serializes and
//! writes them, so a slow socket never blocks a room.

use ludo_types::{ConnectionId, ServerEvent};
use tokio::sync::mpsc;

/// Receiving half handed to the socket writer.
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

/// A client connection as seen by rooms.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    /// Stable id of the connection.
    pub id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl ConnectionHandle {
    /// Open a new connection queue.
    pub fn open() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: ConnectionId::new(),
                tx,
            },
            rx,
        )
    }

    /// Queue an event. Returns `false` once the socket side has gone away.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Whether the socket side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_fails_after_receiver_drops() {
        let (conn, rx) = ConnectionHandle::open();
        assert!(conn.send(ServerEvent::KillZoneToggled { active: true }));
        drop(rx);
        assert!(conn.is_closed());
        assert!(!conn.send(ServerEvent::KillZoneToggled { active: false }));
    }
}
