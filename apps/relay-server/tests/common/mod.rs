#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use relay_common::InboundEvent;
use relay_server::config::Config;
use relay_server::AppState;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long to wait for a frame that should arrive.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);
/// How long to listen before concluding nothing was sent.
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Build a test config pointing at the bundled client assets.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        client_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        ..Config::default()
    }
}

/// Build the full application router wired to a fresh state.
pub fn test_app(config: Config) -> (Router, AppState) {
    let state = AppState::new(config);
    let app = relay_server::routes::router().with_state(state.clone());
    (app, state)
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background for the rest of the test.
pub async fn start_ws_server() -> (SocketAddr, AppState) {
    let (app, state) = test_app(test_config());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

/// Open a WebSocket to the relay without sending anything.
pub async fn connect(addr: SocketAddr) -> WsClient {
    let url = format!("ws://{addr}/ws");
    let (ws, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws
}

pub async fn send_text(ws: &mut WsClient, text: &str) {
    ws.send(Message::Text(text.to_string().into()))
        .await
        .expect("send frame");
}

pub async fn send_event(ws: &mut WsClient, event: &InboundEvent) {
    send_text(ws, &event.to_json()).await;
}

/// Connect and join as `username`, waiting until the relay has committed the
/// join so later broadcasts are ordered after it.
pub async fn connect_and_join(addr: SocketAddr, state: &AppState, username: &str) -> WsClient {
    let expected = state.relay.registry().active_count() + 1;
    let mut ws = connect(addr).await;
    send_event(&mut ws, &InboundEvent::join(username)).await;
    wait_for_members(state, expected).await;
    ws
}

/// Read the next text frame, skipping control frames.
pub async fn recv_text(ws: &mut WsClient) -> String {
    loop {
        let msg = time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("ws read error");
        match msg {
            Message::Text(text) => return text.to_string(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("expected text frame, got: {other:?}"),
        }
    }
}

/// Assert that no text frame arrives within [`QUIET_PERIOD`].
pub async fn expect_silence(ws: &mut WsClient) {
    if let Ok(Some(Ok(Message::Text(text)))) = time::timeout(QUIET_PERIOD, ws.next()).await {
        panic!("expected no message, got: {}", text.as_str());
    }
}

/// Poll the registry until `n` members have joined.
pub async fn wait_for_members(state: &AppState, n: usize) {
    wait_until(|| state.relay.registry().active_count() == n).await;
}

/// Poll the registry until it holds `n` connections in any state.
pub async fn wait_for_connections(state: &AppState, n: usize) {
    wait_until(|| state.relay.registry().len() == n).await;
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    time::timeout(RECV_TIMEOUT, async {
        while !condition() {
            time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timeout waiting for registry state");
}
