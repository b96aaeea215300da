//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Player identifier, declared by the client on `join`
pub type PlayerId = String;

/// Bullet identifier, allocated by the server
pub type BulletId = u64;

/// Three-component vector used for position, rotation, velocity and direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMsg {
    /// Declare identity and enter the session
    Join {
        id: PlayerId,
        name: Option<String>,
        position: Option<Vec3>,
        rotation: Option<Vec3>,
    },

    /// Client-authoritative movement update
    Move {
        position: Vec3,
        rotation: Vec3,
        velocity: Vec3,
    },

    /// Fire a bullet or rocket
    Shoot {
        position: Vec3,
        direction: Vec3,
        is_rocket: Option<bool>,
    },

    /// Report damage dealt to another player
    Hit {
        target_id: PlayerId,
        /// Any JSON number; rounded when applied
        damage: Option<f64>,
    },

    /// Visual explosion relay
    Explode {
        position: Vec3,
        radius: Option<f64>,
    },

    /// Chat line
    Chat { message: String },

    /// Any discriminant this server does not know; ignored
    #[serde(other)]
    Unknown,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMsg {
    /// Snapshot sent only to a joining connection
    Init {
        players: Vec<PlayerInfo>,
        /// Negative during the intermission between rounds
        round_time_left: i64,
    },

    PlayerJoined {
        player: PlayerInfo,
    },

    PlayerMoved {
        id: PlayerId,
        position: Vec3,
        rotation: Vec3,
        velocity: Vec3,
    },

    /// Accepted shot, echoed to the shooter as confirmation
    Shot {
        bullet_id: BulletId,
        player_id: PlayerId,
        position: Vec3,
        direction: Vec3,
        is_rocket: bool,
    },

    PlayerHit {
        id: PlayerId,
        health: i32,
    },

    PlayerDied {
        id: PlayerId,
        killer_id: PlayerId,
        killer_name: String,
    },

    PlayerLeft {
        id: PlayerId,
    },

    Explosion {
        position: Vec3,
        radius: f64,
    },

    Chat {
        player_id: PlayerId,
        name: String,
        message: String,
    },

    RoundEnd {
        winner: Option<ScoreEntry>,
        scores: Vec<ScoreEntry>,
    },

    RoundStart,
}

/// Full player state as seen by clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    pub velocity: Vec3,
    pub health: i32,
    pub kills: u32,
    pub deaths: u32,
}

/// Scoreboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: PlayerId,
    pub name: String,
    pub kills: u32,
}

/// Inbound decode failure
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode a text frame into a client message
pub fn decode(text: &str) -> Result<ClientMsg, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode a binary frame; clients may send JSON as bytes
pub fn decode_bytes(bytes: &[u8]) -> Result<ClientMsg, ProtocolError> {
    decode(std::str::from_utf8(bytes)?)
}

/// Serialize a server message once for fan-out
pub fn encode(msg: &ServerMsg) -> Result<Arc<str>, serde_json::Error> {
    serde_json::to_string(msg).map(Arc::from)
}
