//! Broadcast dispatcher - fan-out of server messages to live connections

use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use crate::ws::protocol::{encode, ServerMsg};

use super::connections::{Connection, ConnectionId, ConnectionSet, Outbound};

/// Queue a payload on one connection without waiting.
///
/// A full queue means the client has stopped reading; the payload is dropped
/// for that client only, so the game loop never blocks on a slow socket.
fn deliver(conn_id: ConnectionId, conn: &Connection, payload: &Outbound) -> bool {
    match conn.outbound.try_send(payload.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            warn!(conn_id = %conn_id, "Client lagging, dropping message");
            false
        }
        Err(TrySendError::Closed(_)) => {
            debug!(conn_id = %conn_id, "Skipping closed connection");
            false
        }
    }
}

impl ConnectionSet {
    /// Send to every open connection except `exclude`.
    ///
    /// The message is serialized once. Returns the number of connections reached.
    pub fn broadcast(&self, msg: &ServerMsg, exclude: Option<ConnectionId>) -> usize {
        let payload = match encode(msg) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to serialize broadcast");
                return 0;
            }
        };

        let mut sent = 0;
        for (id, conn) in &self.connections {
            if Some(*id) == exclude {
                continue;
            }
            if deliver(*id, conn, &payload) {
                sent += 1;
            }
        }
        sent
    }

    /// Send to a single connection
    pub fn send_to(&self, conn_id: ConnectionId, msg: &ServerMsg) -> bool {
        let Some(conn) = self.connections.get(&conn_id) else {
            return false;
        };

        match encode(msg) {
            Ok(payload) => deliver(conn_id, conn, &payload),
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "Failed to serialize message");
                false
            }
        }
    }
}
