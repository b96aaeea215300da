//! Player and bullet message handlers
//!
//! Each handler runs to completion on the game loop. References to players
//! that are not in the registry short-circuit without mutation or broadcast.
//! Positions, damage reports and targets are trusted as sent by the client.

use tracing::{debug, info};

use crate::ws::protocol::{PlayerId, ServerMsg, Vec3};

use super::bullet::can_fire;
use super::connections::{ConnectionId, ConnectionSet};
use super::player::{PlayerState, MAX_HEALTH};
use super::snapshot::player_list;
use super::state::{respawn_point, GameState};

/// Damage applied when `hit` carries none
pub const DEFAULT_DAMAGE: i32 = 34;

/// Radius relayed when `explode` carries none
pub const DEFAULT_EXPLOSION_RADIUS: f64 = 5.0;

/// Chat messages are cut to this many characters
pub const MAX_CHAT_CHARS: usize = 200;

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Damage as applied: missing or zero means the default, fractions round
fn damage_amount(damage: Option<f64>) -> i32 {
    match damage {
        Some(d) if d != 0.0 && !d.is_nan() => d.round() as i32,
        _ => DEFAULT_DAMAGE,
    }
}

/// Relayed radius: missing or zero means the default
fn explosion_radius(radius: Option<f64>) -> f64 {
    match radius {
        Some(r) if r != 0.0 && !r.is_nan() => r,
        _ => DEFAULT_EXPLOSION_RADIUS,
    }
}

impl GameState {
    /// Player id bound to `conn_id`, if it is still registered
    fn registered_sender(&self, conns: &ConnectionSet, conn_id: ConnectionId) -> Option<PlayerId> {
        conns
            .player_id(conn_id)
            .filter(|id| self.players.contains(id))
            .map(str::to_string)
    }

    /// Bind the connection and register the player.
    ///
    /// A join under an id that is already registered replaces that entry and
    /// takes ownership of it. A connection re-joining under a new id releases
    /// the entry it owned before.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn handle_join(
        &mut self,
        conns: &mut ConnectionSet,
        conn_id: ConnectionId,
        id: PlayerId,
        name: Option<String>,
        position: Option<Vec3>,
        rotation: Option<Vec3>,
        now: u64,
    ) {
        if let Some(previous) = conns.bind(conn_id, id.clone()) {
            if previous != id && self.players.remove_owned(&previous, conn_id).is_some() {
                info!(conn_id = %conn_id, player_id = %previous, "Player rejoined under a new id");
                conns.broadcast(&ServerMsg::PlayerLeft { id: previous }, None);
            }
        }

        let player = PlayerState::new(id.clone(), conn_id, name, position, rotation);
        let joined = player.info();
        if let Some(replaced) = self.players.insert(player) {
            debug!(
                player_id = %id,
                previous_conn_id = %replaced.conn_id,
                "Join replaced an existing player"
            );
        }

        conns.send_to(
            conn_id,
            &ServerMsg::Init {
                players: player_list(&self.players, &id),
                round_time_left: self.round.time_left(now),
            },
        );
        conns.broadcast(&ServerMsg::PlayerJoined { player: joined.clone() }, Some(conn_id));

        info!(
            conn_id = %conn_id,
            player_id = %id,
            name = %joined.name,
            player_count = self.players.len(),
            "Player joined"
        );
    }

    /// Remove the player bound to a closed connection and tell the others
    pub fn handle_disconnect(&mut self, conns: &mut ConnectionSet, conn_id: ConnectionId) {
        let Some(conn) = conns.close(conn_id) else {
            return;
        };
        let Some(player_id) = conn.player_id else {
            debug!(conn_id = %conn_id, "Anonymous connection closed");
            return;
        };

        match self.players.remove_owned(&player_id, conn_id) {
            Some(player) => {
                info!(
                    conn_id = %conn_id,
                    player_id = %player_id,
                    name = %player.name,
                    player_count = self.players.len(),
                    "Player left"
                );
                conns.broadcast(&ServerMsg::PlayerLeft { id: player_id }, None);
            }
            None => {
                debug!(
                    conn_id = %conn_id,
                    player_id = %player_id,
                    "Closed connection no longer owns its player"
                );
            }
        }
    }

    pub(super) fn handle_move(
        &mut self,
        conns: &ConnectionSet,
        conn_id: ConnectionId,
        position: Vec3,
        rotation: Vec3,
        velocity: Vec3,
    ) {
        let Some(id) = conns.player_id(conn_id) else {
            return;
        };
        let Some(player) = self.players.get_mut(id) else {
            return;
        };

        player.position = position;
        player.rotation = rotation;
        player.velocity = velocity;

        conns.broadcast(
            &ServerMsg::PlayerMoved {
                id: player.id.clone(),
                position,
                rotation,
                velocity,
            },
            Some(conn_id),
        );
    }

    pub(super) fn handle_shoot(
        &mut self,
        conns: &ConnectionSet,
        conn_id: ConnectionId,
        position: Vec3,
        direction: Vec3,
        is_rocket: bool,
        now: u64,
    ) {
        let Some(id) = conns.player_id(conn_id) else {
            return;
        };
        let Some(player) = self.players.get_mut(id) else {
            return;
        };

        if !can_fire(player.last_shot_at, now) {
            debug!(player_id = %player.id, "Shot dropped by fire-rate limit");
            return;
        }
        player.last_shot_at = Some(now);

        let player_id = player.id.clone();
        let bullet_id = self
            .bullets
            .spawn(player_id.clone(), position, direction, is_rocket, now);

        conns.broadcast(
            &ServerMsg::Shot {
                bullet_id,
                player_id,
                position,
                direction,
                is_rocket,
            },
            None,
        );
    }

    pub(super) fn handle_hit(
        &mut self,
        conns: &ConnectionSet,
        conn_id: ConnectionId,
        target_id: &str,
        damage: Option<f64>,
    ) {
        let Some(shooter_id) = self.registered_sender(conns, conn_id) else {
            return;
        };
        let Some(target) = self.players.get_mut(target_id) else {
            return;
        };

        let health = target.health.saturating_sub(damage_amount(damage));
        if health > 0 {
            target.health = health.min(MAX_HEALTH);
            conns.broadcast(
                &ServerMsg::PlayerHit {
                    id: target.id.clone(),
                    health: target.health,
                },
                None,
            );
            return;
        }

        target.health = MAX_HEALTH;
        target.deaths += 1;
        target.position = respawn_point(&mut self.rng);

        let Some(shooter) = self.players.get_mut(&shooter_id) else {
            return;
        };
        shooter.kills += 1;

        debug!(player_id = %target_id, killer_id = %shooter_id, "Player killed");

        conns.broadcast(
            &ServerMsg::PlayerDied {
                id: target_id.to_string(),
                killer_id: shooter_id,
                killer_name: shooter.name.clone(),
            },
            None,
        );
    }

    pub(super) fn handle_explode(&self, conns: &ConnectionSet, position: Vec3, radius: Option<f64>) {
        conns.broadcast(
            &ServerMsg::Explosion {
                position,
                radius: explosion_radius(radius),
            },
            None,
        );
    }

    pub(super) fn handle_chat(&self, conns: &ConnectionSet, conn_id: ConnectionId, message: &str) {
        let Some(id) = conns.player_id(conn_id) else {
            return;
        };
        let Some(player) = self.players.get(id) else {
            return;
        };

        conns.broadcast(
            &ServerMsg::Chat {
                player_id: player.id.clone(),
                name: player.name.clone(),
                message: truncate_chars(message, MAX_CHAT_CHARS),
            },
            None,
        );
    }
}
