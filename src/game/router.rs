//! Message router - dispatches decoded client messages to handlers

use tracing::trace;

use crate::ws::protocol::ClientMsg;

use super::connections::{ConnectionId, ConnectionSet};
use super::state::GameState;

impl GameState {
    /// Apply one client message to completion
    pub fn handle_message(
        &mut self,
        conns: &mut ConnectionSet,
        conn_id: ConnectionId,
        msg: ClientMsg,
        now: u64,
    ) {
        self.bullets.expire(now);

        match msg {
            ClientMsg::Join {
                id,
                name,
                position,
                rotation,
            } => self.handle_join(conns, conn_id, id, name, position, rotation, now),
            ClientMsg::Move {
                position,
                rotation,
                velocity,
            } => self.handle_move(conns, conn_id, position, rotation, velocity),
            ClientMsg::Shoot {
                position,
                direction,
                is_rocket,
            } => self.handle_shoot(
                conns,
                conn_id,
                position,
                direction,
                is_rocket.unwrap_or(false),
                now,
            ),
            ClientMsg::Hit { target_id, damage } => {
                self.handle_hit(conns, conn_id, &target_id, damage)
            }
            ClientMsg::Explode { position, radius } => {
                self.handle_explode(conns, position, radius)
            }
            ClientMsg::Chat { message } => self.handle_chat(conns, conn_id, &message),
            ClientMsg::Unknown => {
                trace!(conn_id = %conn_id, "Ignoring unknown message type");
            }
        }
    }
}
