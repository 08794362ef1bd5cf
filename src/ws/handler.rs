//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// Also mounted at `/` so that a bare `ws://host:port` URL works.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let lifecycle = state.lifecycle.clone();
    let router = state.router.clone();
    let capacity = state.outbound_capacity;

    ws.on_upgrade(move |socket| run_connection(socket, lifecycle, router, capacity))
}
