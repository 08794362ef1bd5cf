//! Shared helpers for end-to-end tests: a relay on an ephemeral port and a
//! few WebSocket conveniences.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use room_relay::app_state::AppState;
use room_relay::server;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// A relay serving on `127.0.0.1:<ephemeral>` for the duration of a test.
#[derive(Debug)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    task: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("failed to bind test listener");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        let state = AppState::default();
        let task = tokio::spawn(server::serve(
            listener,
            state.clone(),
            std::future::pending(),
        ));
        Self { addr, state, task }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn connect(&self) -> WsClient {
        let Ok((ws, _response)) = connect_async(self.ws_url()).await else {
            panic!("failed to connect to {}", self.ws_url());
        };
        ws
    }

    /// Polls until the registry holds `rooms` rooms, or panics.
    pub async fn wait_for_room_count(&self, rooms: usize) {
        let waited = timeout(RECV_TIMEOUT, async {
            while self.state.registry.room_count().await != rooms {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        if waited.is_err() {
            panic!("registry never reached {rooms} rooms");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub async fn send_text(ws: &mut WsClient, text: &str) {
    if ws.send(Message::text(text)).await.is_err() {
        panic!("failed to send {text}");
    }
}

pub async fn send_json(ws: &mut WsClient, value: Value) {
    send_text(ws, &value.to_string()).await;
}

/// Next JSON text frame from the relay.
pub async fn recv_json(ws: &mut WsClient) -> Value {
    let next = timeout(RECV_TIMEOUT, async {
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                return serde_json::from_str::<Value>(text.as_str()).ok();
            }
        }
        None
    })
    .await;
    match next {
        Ok(Some(value)) => value,
        Ok(None) => panic!("connection ended while waiting for a message"),
        Err(_) => panic!("timed out waiting for a message"),
    }
}

/// Asserts nothing arrives for a short window.
pub async fn assert_silent(ws: &mut WsClient) {
    if let Ok(Some(Ok(Message::Text(text)))) = timeout(SILENCE_WINDOW, ws.next()).await {
        panic!("expected silence, got {text}");
    }
}

/// Sends `join` and returns the `peers` reply.
pub async fn join(ws: &mut WsClient, room: &str, peer: &str) -> Value {
    send_json(ws, json!({"type": "join", "roomId": room, "peerId": peer})).await;
    recv_json(ws).await
}
