//! WebSocket upgrade handler

use std::fmt::Display;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::connections::OUTBOUND_CAPACITY;
use crate::game::{ConnectionEvent, ConnectionId, Outbound};
use crate::util::time::KEEPALIVE_INTERVAL;
use crate::ws::protocol::{decode, decode_bytes, ProtocolError};

/// WebSocket upgrade handler; identity is declared later with `join`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let events_tx = state.game.events_tx.clone();

    let (outbound_tx, outbound_rx) = mpsc::channel::<Outbound>(OUTBOUND_CAPACITY);
    if events_tx
        .send(ConnectionEvent::Opened {
            conn_id,
            outbound: outbound_tx,
        })
        .await
        .is_err()
    {
        error!(conn_id = %conn_id, "Game loop is gone, dropping connection");
        return;
    }

    info!(
        conn_id = %conn_id,
        connections = state.game.connection_count() + 1,
        "Client connected"
    );

    let (ws_sink, ws_stream) = socket.split();
    run_session(conn_id, ws_sink, ws_stream, &events_tx, outbound_rx).await;

    info!(conn_id = %conn_id, "Client disconnected");
}

/// Run one registered connection until the client goes away
async fn run_session<S, R, E>(
    conn_id: ConnectionId,
    ws_sink: S,
    ws_stream: R,
    events_tx: &mpsc::Sender<ConnectionEvent>,
    outbound_rx: mpsc::Receiver<Outbound>,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let writer_handle = tokio::spawn(run_writer(conn_id, ws_sink, outbound_rx));
    run_reader(conn_id, ws_stream, events_tx).await;

    // Closing and transport errors take the same cleanup path
    let _ = events_tx.send(ConnectionEvent::Closed { conn_id }).await;
    writer_handle.abort();
}

/// Writer task: game loop payloads and keepalive pings -> WebSocket
async fn run_writer<S>(
    conn_id: ConnectionId,
    mut ws_sink: S,
    mut outbound_rx: mpsc::Receiver<Outbound>,
) where
    S: Sink<Message> + Unpin,
    S::Error: Display,
{
    let mut keepalive = interval(KEEPALIVE_INTERVAL);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    keepalive.tick().await;

    loop {
        tokio::select! {
            payload = outbound_rx.recv() => {
                let Some(payload) = payload else {
                    debug!(conn_id = %conn_id, "Outbound channel closed");
                    break;
                };
                if let Err(e) = ws_sink.send(Message::Text(payload.to_string())).await {
                    debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                    break;
                }
            }
            _ = keepalive.tick() => {
                if let Err(e) = ws_sink.send(Message::Ping(Vec::new())).await {
                    debug!(conn_id = %conn_id, error = %e, "Keepalive ping failed");
                    break;
                }
            }
        }
    }
}

/// Reader loop: WebSocket -> game loop
async fn run_reader<R, E>(
    conn_id: ConnectionId,
    mut ws_stream: R,
    events_tx: &mpsc::Sender<ConnectionEvent>,
) where
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    while let Some(result) = ws_stream.next().await {
        let decoded: Result<_, ProtocolError> = match result {
            Ok(Message::Text(text)) => decode(&text),
            Ok(Message::Binary(bytes)) => decode_bytes(&bytes),
            Ok(Message::Ping(_)) => {
                trace!(conn_id = %conn_id, "Received ping");
                continue;
            }
            Ok(Message::Pong(_)) => {
                trace!(conn_id = %conn_id, "Received pong");
                continue;
            }
            Ok(Message::Close(_)) => {
                debug!(conn_id = %conn_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        };

        match decoded {
            Ok(msg) => {
                if events_tx
                    .send(ConnectionEvent::Message { conn_id, msg })
                    .await
                    .is_err()
                {
                    debug!(conn_id = %conn_id, "Game loop closed");
                    break;
                }
            }
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "Failed to parse client message");
            }
        }
    }
}
