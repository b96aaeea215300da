//! Authoritative game loop
//!
//! A single task owns the registries, the round and the connection set.
//! Connection events and timers are processed one at a time, so every
//! handler observes and leaves the state consistent without locking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::util::time::{until, Clock, MonotonicClock, ROUND_TICK};

use super::connections::ConnectionSet;
use super::state::GameState;
use super::ConnectionEvent;

/// Capacity of the connection event queue
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Handle to the running game loop
#[derive(Clone)]
pub struct GameHandle {
    pub events_tx: mpsc::Sender<ConnectionEvent>,
    pub player_count: Arc<AtomicUsize>,
    pub connection_count: Arc<AtomicUsize>,
}

impl GameHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn connection_count(&self) -> usize {
        self.connection_count.load(Ordering::Relaxed)
    }
}

/// The authoritative game server
pub struct GameServer<C: Clock = MonotonicClock> {
    state: GameState,
    connections: ConnectionSet,
    events_rx: mpsc::Receiver<ConnectionEvent>,
    clock: C,
    player_count: Arc<AtomicUsize>,
    connection_count: Arc<AtomicUsize>,
}

impl<C: Clock> GameServer<C> {
    /// Create the server; the first round starts now
    pub fn new(clock: C, seed: u64) -> (Self, GameHandle) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let player_count = Arc::new(AtomicUsize::new(0));
        let connection_count = Arc::new(AtomicUsize::new(0));

        let handle = GameHandle {
            events_tx,
            player_count: player_count.clone(),
            connection_count: connection_count.clone(),
        };

        let server = Self {
            state: GameState::new(clock.now_millis(), seed),
            connections: ConnectionSet::new(),
            events_rx,
            clock,
            player_count,
            connection_count,
        };

        (server, handle)
    }

    /// Run until every handle is dropped
    pub async fn run(mut self) {
        info!("Game loop started");

        let mut round_tick = interval(ROUND_TICK);
        round_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let reset_in = self
                .state
                .round
                .reset_deadline()
                .map(|at| until(at, self.clock.now_millis()));

            tokio::select! {
                event = self.events_rx.recv() => {
                    let Some(event) = event else {
                        break;
                    };
                    let now = self.clock.now_millis();
                    self.handle_event(event, now);
                }
                _ = round_tick.tick() => {
                    let now = self.clock.now_millis();
                    self.tick(now);
                }
                _ = sleep(reset_in.unwrap_or_default()), if reset_in.is_some() => {
                    let now = self.clock.now_millis();
                    self.tick(now);
                }
            }
        }

        info!("Game loop stopped");
    }

    fn handle_event(&mut self, event: ConnectionEvent, now: u64) {
        match event {
            ConnectionEvent::Opened { conn_id, outbound } => {
                self.connections.open(conn_id, outbound);
                debug!(conn_id = %conn_id, connections = self.connections.len(), "Connection registered");
            }
            ConnectionEvent::Message { conn_id, msg } => {
                self.state
                    .handle_message(&mut self.connections, conn_id, msg, now);
            }
            ConnectionEvent::Closed { conn_id } => {
                self.state.handle_disconnect(&mut self.connections, conn_id);
            }
        }

        self.publish_counts();
    }

    /// Round timing and bullet expiry
    fn tick(&mut self, now: u64) {
        let expired = self.state.bullets.expire(now);
        if expired > 0 {
            trace!(expired, live = self.state.bullets.len(), "Swept expired bullets");
        }

        if let Some(msg) = self.state.round.tick(now, &mut self.state.players) {
            self.connections.broadcast(&msg, None);
        }
    }

    fn publish_counts(&self) {
        self.player_count
            .store(self.state.players.len(), Ordering::Relaxed);
        self.connection_count
            .store(self.connections.len(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use uuid::Uuid;

    use crate::game::connections::{ConnectionId, Outbound, OUTBOUND_CAPACITY};
    use crate::game::round::{ROUND_DURATION_MS, ROUND_RESET_DELAY_MS};
    use crate::game::testing::drain_receiver;
    use crate::ws::protocol::{ClientMsg, ServerMsg};

    async fn open(handle: &GameHandle) -> (ConnectionId, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let conn_id = Uuid::new_v4();
        handle
            .events_tx
            .send(ConnectionEvent::Opened {
                conn_id,
                outbound: tx,
            })
            .await
            .unwrap();
        (conn_id, rx)
    }

    async fn send(handle: &GameHandle, conn_id: ConnectionId, msg: ClientMsg) {
        handle
            .events_tx
            .send(ConnectionEvent::Message { conn_id, msg })
            .await
            .unwrap();
    }

    fn join(id: &str, name: &str) -> ClientMsg {
        ClientMsg::Join {
            id: id.to_string(),
            name: Some(name.to_string()),
            position: None,
            rotation: None,
        }
    }

    fn count(msgs: &[ServerMsg], pred: impl Fn(&ServerMsg) -> bool) -> usize {
        msgs.iter().filter(|m| pred(m)).count()
    }

    #[tokio::test(start_paused = true)]
    async fn round_cycle_over_simulated_time() {
        let (server, handle) = GameServer::new(MonotonicClock::new(), 1);
        tokio::spawn(server.run());

        let (a, mut rx_a) = open(&handle).await;
        let (b, _rx_b) = open(&handle).await;
        send(&handle, a, join("A", "Alice")).await;
        send(&handle, b, join("B", "Bob")).await;
        send(&handle, b, ClientMsg::Hit { target_id: "A".to_string(), damage: Some(100.0) }).await;

        sleep(Duration::from_millis(ROUND_DURATION_MS - 500)).await;
        let before = drain_receiver(&mut rx_a);
        assert_eq!(count(&before, |m| matches!(m, ServerMsg::RoundEnd { .. })), 0);
        assert_eq!(count(&before, |m| matches!(m, ServerMsg::PlayerDied { .. })), 1);

        sleep(Duration::from_millis(1_000)).await;
        let ended = drain_receiver(&mut rx_a);
        match ended.as_slice() {
            [ServerMsg::RoundEnd { winner, scores }] => {
                assert_eq!(winner.as_ref().unwrap().id, "B");
                assert_eq!(scores.len(), 2);
            }
            other => panic!("expected a single roundEnd, got {:?}", other),
        }

        sleep(Duration::from_millis(ROUND_RESET_DELAY_MS - 1_000)).await;
        assert!(drain_receiver(&mut rx_a).is_empty());

        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(drain_receiver(&mut rx_a), vec![ServerMsg::RoundStart]);
        assert_eq!(handle.player_count(), 2);

        // Scores were reset: a fresh join sees zeroed kills and deaths
        let (c, mut rx_c) = open(&handle).await;
        send(&handle, c, join("C", "Cid")).await;
        sleep(Duration::from_millis(1)).await;
        match drain_receiver(&mut rx_c).as_slice() {
            [ServerMsg::Init { players, round_time_left }] => {
                assert!(players.iter().all(|p| p.kills == 0 && p.deaths == 0));
                assert!(*round_time_left > 0);
            }
            other => panic!("expected init, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn round_start_fires_exactly_after_reset_delay() {
        let (server, handle) = GameServer::new(MonotonicClock::new(), 1);
        tokio::spawn(server.run());
        let (_a, mut rx_a) = open(&handle).await;

        // Stop 1ms short of the roundStart deadline, then step 1ms past it
        let end = ROUND_DURATION_MS + ROUND_RESET_DELAY_MS;
        sleep(Duration::from_millis(end - 1)).await;
        let msgs = drain_receiver(&mut rx_a);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0], ServerMsg::RoundEnd { winner: None, .. }));

        sleep(Duration::from_millis(2)).await;
        assert_eq!(drain_receiver(&mut rx_a), vec![ServerMsg::RoundStart]);
    }

    #[tokio::test]
    async fn close_event_cleans_up_and_updates_counts() {
        let (mut server, handle) = GameServer::new(MonotonicClock::new(), 1);

        let (tx_a, _rx_a) = mpsc::channel(OUTBOUND_CAPACITY);
        let (tx_b, mut rx_b) = mpsc::channel(OUTBOUND_CAPACITY);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        server.handle_event(ConnectionEvent::Opened { conn_id: a, outbound: tx_a }, 0);
        server.handle_event(ConnectionEvent::Opened { conn_id: b, outbound: tx_b }, 0);
        server.handle_event(ConnectionEvent::Message { conn_id: a, msg: join("X", "Xena") }, 0);
        assert_eq!(handle.player_count(), 1);
        assert_eq!(handle.connection_count(), 2);
        drain_receiver(&mut rx_b);

        server.handle_event(ConnectionEvent::Closed { conn_id: a }, 10);

        assert_eq!(handle.player_count(), 0);
        assert_eq!(handle.connection_count(), 1);
        assert_eq!(
            drain_receiver(&mut rx_b),
            vec![ServerMsg::PlayerLeft { id: "X".to_string() }]
        );

        server.handle_event(
            ConnectionEvent::Message {
                conn_id: a,
                msg: ClientMsg::Chat { message: "still here?".to_string() },
            },
            20,
        );
        assert!(drain_receiver(&mut rx_b).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn loop_stops_when_handles_are_dropped() {
        let (server, handle) = GameServer::new(MonotonicClock::new(), 1);
        let task = tokio::spawn(server.run());
        drop(handle);
        task.await.unwrap();
    }
}
