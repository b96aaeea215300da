//! Time utilities for the game loop

use std::time::Duration;

use tokio::time::Instant;

/// Round controller tick interval
pub const ROUND_TICK: Duration = Duration::from_millis(1000);

/// Keepalive ping interval per connection
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_millis(30_000);

/// Monotonic millisecond clock injected into the game loop.
///
/// Handlers never read the clock themselves; the loop samples it once per
/// event and passes `now` down, so tests can drive time explicitly.
pub trait Clock: Send + 'static {
    fn now_millis(&self) -> u64;
}

/// Clock backed by `tokio::time::Instant`.
///
/// Under a paused tokio runtime this follows simulated time.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(std::time::Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Milliseconds until `deadline`, saturating at zero.
pub fn until(deadline: u64, now: u64) -> Duration {
    Duration::from_millis(deadline.saturating_sub(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn monotonic_clock_follows_paused_time() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.now_millis(), 0);

        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(clock.now_millis(), 1500);
    }

    #[test]
    fn until_saturates_for_past_deadlines() {
        assert_eq!(until(1_000, 400), Duration::from_millis(600));
        assert_eq!(until(1_000, 1_000), Duration::ZERO);
        assert_eq!(until(1_000, 5_000), Duration::ZERO);
    }
}
