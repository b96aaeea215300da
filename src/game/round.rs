//! Round controller - timed rounds with a fixed intermission

use tracing::info;

use crate::ws::protocol::ServerMsg;

use super::player::PlayerRegistry;
use super::snapshot::scoreboard;

/// Length of a round (ms)
pub const ROUND_DURATION_MS: u64 = 300_000;

/// Intermission between `roundEnd` and `roundStart` (ms)
pub const ROUND_RESET_DELAY_MS: u64 = 10_000;

/// Round phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Round in progress
    Active,
    /// Round over, next one starts at `reset_at`
    Ended { reset_at: u64 },
}

/// The single process-wide round, reset in place every cycle
#[derive(Debug)]
pub struct RoundController {
    start_time: u64,
    phase: RoundPhase,
}

impl RoundController {
    /// Start the first round at `now`
    pub fn new(now: u64) -> Self {
        Self {
            start_time: now,
            phase: RoundPhase::Active,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    #[cfg(test)]
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// `roundDuration - (now - roundStartTime)`, negative during intermission
    pub fn time_left(&self, now: u64) -> i64 {
        ROUND_DURATION_MS as i64 - now.saturating_sub(self.start_time) as i64
    }

    /// Deadline of the pending Ended -> Active transition, if any
    pub fn reset_deadline(&self) -> Option<u64> {
        match self.phase {
            RoundPhase::Active => None,
            RoundPhase::Ended { reset_at } => Some(reset_at),
        }
    }

    /// Advance the state machine; returns the message to broadcast on a transition
    pub fn tick(&mut self, now: u64, players: &mut PlayerRegistry) -> Option<ServerMsg> {
        match self.phase {
            RoundPhase::Active => {
                if now.saturating_sub(self.start_time) < ROUND_DURATION_MS {
                    return None;
                }

                self.phase = RoundPhase::Ended {
                    reset_at: now + ROUND_RESET_DELAY_MS,
                };

                let (winner, scores) = scoreboard(players);
                info!(
                    winner = winner.as_ref().map(|w| w.id.as_str()).unwrap_or("none"),
                    players = scores.len(),
                    "Round ended"
                );

                Some(ServerMsg::RoundEnd { winner, scores })
            }
            RoundPhase::Ended { reset_at } => {
                if now < reset_at {
                    return None;
                }

                self.start_time = now;
                self.phase = RoundPhase::Active;
                players.reset_scores();

                info!(players = players.len(), "Round started");

                Some(ServerMsg::RoundStart)
            }
        }
    }
}
