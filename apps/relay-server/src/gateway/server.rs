//! WebSocket upgrade handler and per-connection event loop.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use relay_common::ConnectionId;
use tokio::sync::mpsc;

use crate::AppState;

/// Sent when the relay dropped this client (dead or too slow).
const CLOSE_POLICY_VIOLATION: u16 = 1008;
/// Sent when the connection could not be registered.
const CLOSE_INTERNAL_ERROR: u16 = 1011;

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, ws_rx) = socket.split();

    let (conn_id, outbound_rx) = match state.relay.accept() {
        Ok(accepted) => accepted,
        Err(err) => {
            tracing::warn!(%err, "rejecting connection");
            let _ = send_close(&mut ws_tx, CLOSE_INTERNAL_ERROR, "Registration failed").await;
            return;
        }
    };

    run_connection(&state, conn_id, ws_tx, ws_rx, outbound_rx).await;

    // Exactly one close signal per connection; a no-op if a failed push
    // already removed it.
    state.relay.disconnect(conn_id);
}

/// Main loop: feed client frames to the relay in order, and write queued
/// notices to the socket.
async fn run_connection(
    state: &AppState,
    conn_id: ConnectionId,
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut ws_rx: SplitStream<WebSocket>,
    mut outbound_rx: mpsc::Receiver<String>,
) {
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let outcome = state.relay.handle_text(conn_id, text.as_str());
                        tracing::trace!(conn_id = %conn_id, ?outcome, "frame handled");
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        tracing::debug!(conn_id = %conn_id, "ignoring non-text frame");
                    }
                    Some(Err(e)) => {
                        tracing::debug!(?e, conn_id = %conn_id, "ws read error");
                        break;
                    }
                }
            }

            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(text) => {
                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // Every handle is gone: the relay removed us after a failed push.
                        let _ = send_close(&mut ws_tx, CLOSE_POLICY_VIOLATION, "Dropped by relay").await;
                        break;
                    }
                }
            }
        }
    }
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
