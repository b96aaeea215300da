//! In-memory connections for exercising the game state without sockets

use std::collections::HashMap;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

use super::connections::{ConnectionId, ConnectionSet, Outbound, OUTBOUND_CAPACITY};
use super::state::GameState;

pub struct Harness {
    pub state: GameState,
    pub conns: ConnectionSet,
    receivers: HashMap<ConnectionId, mpsc::Receiver<Outbound>>,
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    pub fn new() -> Self {
        Self {
            state: GameState::new(0, 7),
            conns: ConnectionSet::new(),
            receivers: HashMap::new(),
        }
    }

    pub fn connect(&mut self) -> ConnectionId {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let conn_id = Uuid::new_v4();
        self.conns.open(conn_id, tx);
        self.receivers.insert(conn_id, rx);
        conn_id
    }

    pub fn send(&mut self, conn_id: ConnectionId, msg: ClientMsg, now: u64) {
        self.state.handle_message(&mut self.conns, conn_id, msg, now);
    }

    pub fn join(&mut self, conn_id: ConnectionId, id: &str, name: &str, now: u64) {
        self.send(
            conn_id,
            ClientMsg::Join {
                id: id.to_string(),
                name: Some(name.to_string()),
                position: None,
                rotation: None,
            },
            now,
        );
    }

    pub fn disconnect(&mut self, conn_id: ConnectionId) {
        self.state.handle_disconnect(&mut self.conns, conn_id);
        self.receivers.remove(&conn_id);
    }

    /// Everything queued for `conn_id` so far, decoded
    pub fn drain(&mut self, conn_id: ConnectionId) -> Vec<ServerMsg> {
        let rx = self
            .receivers
            .get_mut(&conn_id)
            .expect("connection not opened through the harness");
        drain_receiver(rx)
    }

    pub fn drain_all(&mut self) {
        for rx in self.receivers.values_mut() {
            drain_receiver(rx);
        }
    }
}

pub fn drain_receiver(rx: &mut mpsc::Receiver<Outbound>) -> Vec<ServerMsg> {
    let mut out = Vec::new();
    while let Ok(payload) = rx.try_recv() {
        out.push(serde_json::from_str(&payload).expect("server sent invalid JSON"));
    }
    out
}
