//! Live connection set owned by the game loop

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::PlayerId;

/// Transport connection identifier, assigned on upgrade
pub type ConnectionId = Uuid;

/// Serialized payload queued for a connection's writer task
pub type Outbound = Arc<str>;

/// Payloads a connection may have queued before further ones are dropped
pub const OUTBOUND_CAPACITY: usize = 256;

/// Game-side view of one WebSocket connection
#[derive(Debug)]
pub struct Connection {
    pub(super) outbound: mpsc::Sender<Outbound>,
    /// Set once the connection has sent `join`
    pub player_id: Option<PlayerId>,
}

/// All connections currently known to the game loop
#[derive(Debug, Default)]
pub struct ConnectionSet {
    pub(super) connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an anonymous connection
    pub fn open(&mut self, conn_id: ConnectionId, outbound: mpsc::Sender<Outbound>) {
        self.connections.insert(
            conn_id,
            Connection {
                outbound,
                player_id: None,
            },
        );
    }

    pub fn close(&mut self, conn_id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&conn_id)
    }

    /// Bind a connection to a player id, returning the previous binding
    pub fn bind(&mut self, conn_id: ConnectionId, player_id: PlayerId) -> Option<PlayerId> {
        self.connections
            .get_mut(&conn_id)
            .and_then(|conn| conn.player_id.replace(player_id))
    }

    pub fn player_id(&self, conn_id: ConnectionId) -> Option<&str> {
        self.connections
            .get(&conn_id)
            .and_then(|conn| conn.player_id.as_deref())
    }

    #[cfg(test)]
    pub fn contains(&self, conn_id: ConnectionId) -> bool {
        self.connections.contains_key(&conn_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
