//! Game state, handlers and the authoritative loop

pub mod broadcast;
pub mod bullet;
pub mod connections;
pub mod handlers;
pub mod player;
pub mod round;
pub mod router;
pub mod server;
pub mod snapshot;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use connections::{ConnectionId, Outbound};
pub use server::{GameHandle, GameServer};

use tokio::sync::mpsc;

use crate::ws::protocol::ClientMsg;

/// Connection lifecycle and inbound traffic, in arrival order per connection
#[derive(Debug)]
pub enum ConnectionEvent {
    /// Upgrade completed; `outbound` feeds the connection's writer task
    Opened {
        conn_id: ConnectionId,
        outbound: mpsc::Sender<Outbound>,
    },
    /// Decoded client message
    Message { conn_id: ConnectionId, msg: ClientMsg },
    /// Socket closed or failed
    Closed { conn_id: ConnectionId },
}
