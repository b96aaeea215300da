//! Player registry - authoritative per-player state

use std::collections::HashMap;

use uuid::Uuid;

use crate::ws::protocol::{PlayerId, PlayerInfo, Vec3};

/// Health of a freshly joined or respawned player
pub const MAX_HEALTH: i32 = 100;

/// Name used when `join` carries none
pub const DEFAULT_NAME: &str = "Player";

/// Spawn position used when `join` carries none
pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, 2.0, 0.0);

/// Player state (authoritative)
#[derive(Debug, Clone)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    /// Connection that most recently joined under this id
    pub conn_id: Uuid,

    // Client-trusted transform
    pub position: Vec3,
    pub rotation: Vec3,
    pub velocity: Vec3,

    // Server-authoritative combat state
    pub health: i32,
    pub kills: u32,
    pub deaths: u32,
    pub last_shot_at: Option<u64>,
}

impl PlayerState {
    pub fn new(
        id: PlayerId,
        conn_id: Uuid,
        name: Option<String>,
        position: Option<Vec3>,
        rotation: Option<Vec3>,
    ) -> Self {
        Self {
            id,
            name: name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            conn_id,
            position: position.unwrap_or(DEFAULT_POSITION),
            rotation: rotation.unwrap_or(Vec3::ZERO),
            velocity: Vec3::ZERO,
            health: MAX_HEALTH,
            kills: 0,
            deaths: 0,
            last_shot_at: None,
        }
    }

    /// Client-facing view of this player
    pub fn info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            position: self.position,
            rotation: self.rotation,
            velocity: self.velocity,
            health: self.health,
            kills: self.kills,
            deaths: self.deaths,
        }
    }
}

/// Mapping from player id to player state
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<PlayerId, PlayerState>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a player, replacing any entry with the same id
    pub fn insert(&mut self, player: PlayerState) -> Option<PlayerState> {
        self.players.insert(player.id.clone(), player)
    }

    pub fn get(&self, id: &str) -> Option<&PlayerState> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PlayerState> {
        self.players.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.players.contains_key(id)
    }

    /// Remove `id` only if it is still owned by `conn_id`
    pub fn remove_owned(&mut self, id: &str, conn_id: Uuid) -> Option<PlayerState> {
        match self.players.get(id) {
            Some(player) if player.conn_id == conn_id => self.players.remove(id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerState> {
        self.players.values_mut()
    }

    /// Zero kills and deaths for every player in place
    pub fn reset_scores(&mut self) {
        for player in self.iter_mut() {
            player.kills = 0;
            player.deaths = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, conn_id: Uuid) -> PlayerState {
        PlayerState::new(id.to_string(), conn_id, None, None, None)
    }

    #[test]
    fn new_player_uses_defaults() {
        let p = PlayerState::new("p1".to_string(), Uuid::new_v4(), Some(String::new()), None, None);
        assert_eq!(p.name, DEFAULT_NAME);
        assert_eq!(p.position, DEFAULT_POSITION);
        assert_eq!(p.rotation, Vec3::ZERO);
        assert_eq!(p.velocity, Vec3::ZERO);
        assert_eq!(p.health, MAX_HEALTH);
        assert_eq!((p.kills, p.deaths), (0, 0));
        assert_eq!(p.last_shot_at, None);
    }

    #[test]
    fn insert_overwrites_same_id() {
        let mut registry = PlayerRegistry::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(registry.insert(player("p1", first)).is_none());
        let previous = registry.insert(player("p1", second)).unwrap();

        assert_eq!(previous.conn_id, first);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("p1").unwrap().conn_id, second);
    }

    #[test]
    fn remove_owned_ignores_stale_owner() {
        let mut registry = PlayerRegistry::new();
        let stale = Uuid::new_v4();
        let current = Uuid::new_v4();
        registry.insert(player("p1", current));

        assert!(registry.remove_owned("p1", stale).is_none());
        assert!(registry.contains("p1"));

        assert!(registry.remove_owned("p1", current).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn reset_scores_zeroes_everyone() {
        let mut registry = PlayerRegistry::new();
        let conn = Uuid::new_v4();
        registry.insert(player("a", conn));
        registry.insert(player("b", conn));
        for p in registry.iter_mut() {
            p.kills = 3;
            p.deaths = 2;
        }

        registry.reset_scores();

        assert!(registry.iter().all(|p| p.kills == 0 && p.deaths == 0));
    }
}
