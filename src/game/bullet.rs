//! Bullet registry - transient, self-expiring projectiles

use std::collections::HashMap;

use tracing::trace;

use crate::ws::protocol::{BulletId, PlayerId, Vec3};

/// Minimum time between two accepted shots of one player (ms)
pub const FIRE_INTERVAL_MS: u64 = 100;

/// Lifetime of a standard bullet (ms)
pub const BULLET_LIFETIME_MS: u64 = 3_000;

/// Lifetime of a rocket (ms)
pub const ROCKET_LIFETIME_MS: u64 = 5_000;

/// Check the per-player fire-rate limit
pub fn can_fire(last_shot_at: Option<u64>, now: u64) -> bool {
    match last_shot_at {
        Some(last) => now.saturating_sub(last) >= FIRE_INTERVAL_MS,
        None => true,
    }
}

/// Server-side record of an in-flight shot
#[derive(Debug, Clone)]
pub struct BulletState {
    pub id: BulletId,
    pub owner_id: PlayerId,
    #[allow(dead_code)]
    pub position: Vec3,
    #[allow(dead_code)]
    pub direction: Vec3,
    pub created_at: u64,
    pub is_rocket: bool,
    pub expires_at: u64,
}

impl BulletState {
    pub fn lifetime(is_rocket: bool) -> u64 {
        if is_rocket {
            ROCKET_LIFETIME_MS
        } else {
            BULLET_LIFETIME_MS
        }
    }
}

/// Mapping from bullet id to bullet state
#[derive(Debug, Default)]
pub struct BulletRegistry {
    bullets: HashMap<BulletId, BulletState>,
    next_id: BulletId,
}

impl BulletRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new bullet and return its id. Ids are never reused.
    pub fn spawn(
        &mut self,
        owner_id: PlayerId,
        position: Vec3,
        direction: Vec3,
        is_rocket: bool,
        now: u64,
    ) -> BulletId {
        let id = self.next_id;
        self.next_id += 1;

        self.bullets.insert(
            id,
            BulletState {
                id,
                owner_id,
                position,
                direction,
                created_at: now,
                is_rocket,
                expires_at: now + BulletState::lifetime(is_rocket),
            },
        );

        id
    }

    /// Drop every bullet whose deadline has passed; returns how many
    pub fn expire(&mut self, now: u64) -> usize {
        let before = self.bullets.len();
        self.bullets.retain(|_, b| {
            let alive = b.expires_at > now;
            if !alive {
                trace!(
                    bullet_id = b.id,
                    owner_id = %b.owner_id,
                    is_rocket = b.is_rocket,
                    age_ms = now.saturating_sub(b.created_at),
                    "Bullet expired"
                );
            }
            alive
        });
        before - self.bullets.len()
    }

    #[cfg(test)]
    pub fn get(&self, id: BulletId) -> Option<&BulletState> {
        self.bullets.get(&id)
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }
}
