//! Game state aggregate owned by the game loop

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::ws::protocol::Vec3;

use super::bullet::BulletRegistry;
use super::player::PlayerRegistry;
use super::round::RoundController;

/// Respawn points lie in [-RESPAWN_EXTENT, RESPAWN_EXTENT) on x and z
pub const RESPAWN_EXTENT: f64 = 20.0;

/// Respawn height
pub const RESPAWN_HEIGHT: f64 = 2.0;

/// Players, bullets and the round, plus the respawn RNG
pub struct GameState {
    pub players: PlayerRegistry,
    pub bullets: BulletRegistry,
    pub round: RoundController,
    pub(super) rng: ChaCha8Rng,
}

impl GameState {
    /// Fresh state with the first round starting at `now`
    pub fn new(now: u64, seed: u64) -> Self {
        Self {
            players: PlayerRegistry::new(),
            bullets: BulletRegistry::new(),
            round: RoundController::new(now),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

/// Uniformly random respawn point
pub fn respawn_point(rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-RESPAWN_EXTENT..RESPAWN_EXTENT),
        RESPAWN_HEIGHT,
        rng.gen_range(-RESPAWN_EXTENT..RESPAWN_EXTENT),
    )
}
