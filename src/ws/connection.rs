//! WebSocket connection state machine.
//!
//! Each socket gets one task running [`run_connection`]. The task owns a
//! [`Session`] (the connection's state plus the owning end of its outbound
//! queue) and multiplexes two sources: frames from the peer, and messages
//! other tasks enqueued for it. Socket writes only ever happen here.
//!
//! ```text
//! Connected ──join──▶ InRoom ──close / leave──▶ Closed
//!                      │  ▲
//!                      └──┘ join (room switch)
//! ```

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use super::messages::ClientMessage;
use crate::domain::outbound::{self, Outbound};
use crate::domain::{ConnectionId, Membership, PeerId, RoomId, ServerMessage};
use crate::error::RelayError;
use crate::service::{LifecycleManager, MessageRouter};

/// Lifecycle state of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket open, not in any room.
    Connected,
    /// Joined; holds the room and identity the peer registered with.
    InRoom(Membership),
    /// Terminal. The peer has been removed from the registry.
    Closed,
}

/// What the socket loop should do after handling a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep serving the connection.
    Continue,
    /// Stop reading and close the socket.
    Close,
}

/// Per-connection state driven by inbound frames.
#[derive(Debug)]
pub struct Session {
    state: ConnectionState,
    outbound: Outbound,
    lifecycle: LifecycleManager,
    router: MessageRouter,
}

impl Session {
    /// Creates a session in the `Connected` state.
    #[must_use]
    pub fn new(outbound: Outbound, lifecycle: LifecycleManager, router: MessageRouter) -> Self {
        Self {
            state: ConnectionState::Connected,
            outbound,
            lifecycle,
            router,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Connection identifier used in logs.
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.outbound.connection_id()
    }

    fn membership(&self) -> Option<&Membership> {
        match &self.state {
            ConnectionState::InRoom(membership) => Some(membership),
            _ => None,
        }
    }

    /// Handles one inbound text frame.
    ///
    /// Malformed and unknown messages are logged and dropped; they never
    /// end the connection.
    pub async fn handle_text(&mut self, text: &str) -> Flow {
        if self.state == ConnectionState::Closed {
            return Flow::Close;
        }
        match ClientMessage::parse(text) {
            Ok(msg) => self.dispatch(msg).await,
            Err(err) => {
                tracing::warn!(connection_id = %self.connection_id(), %err, "dropping inbound message");
                Flow::Continue
            }
        }
    }

    async fn dispatch(&mut self, msg: ClientMessage) -> Flow {
        let kind = msg.status_kind();
        match msg {
            ClientMessage::Join { room_id, peer_id } => {
                self.join(Membership::new(room_id, peer_id)).await;
            }
            ClientMessage::Signal {
                room_id,
                to,
                from,
                signal,
            } => match self.resolve(room_id, from) {
                Ok((room_id, from)) => {
                    self.router.forward_signal(&room_id, from, &to, signal).await;
                }
                Err(err) => self.log_unroutable("signal", &err),
            },
            ClientMessage::Mute {
                room_id,
                peer_id,
                value,
            }
            | ClientMessage::Speaking {
                room_id,
                peer_id,
                value,
            } => match (self.resolve(room_id, peer_id), kind) {
                (Ok((room_id, peer_id)), Some(kind)) => {
                    self.router
                        .broadcast_status(&room_id, peer_id, kind, value)
                        .await;
                }
                (Err(err), _) => self.log_unroutable("status", &err),
                (Ok(_), None) => {}
            },
            ClientMessage::Leave { room_id, peer_id } => {
                tracing::debug!(
                    connection_id = %self.connection_id(),
                    room_id = ?room_id.as_ref().map(RoomId::as_str),
                    peer_id = ?peer_id.as_ref().map(PeerId::as_str),
                    current = ?self.membership(),
                    "leave requested"
                );
                self.close().await;
                return Flow::Close;
            }
        }
        Flow::Continue
    }

    async fn join(&mut self, target: Membership) {
        let joined = self
            .lifecycle
            .join(&self.outbound, self.membership(), target)
            .await;
        match joined {
            Ok(membership) => self.state = ConnectionState::InRoom(membership),
            Err(err) => {
                tracing::warn!(connection_id = %self.connection_id(), %err, "join rejected");
                if let Err(reply_err) =
                    MessageRouter::reply(&self.outbound, &ServerMessage::from_error(&err))
                {
                    tracing::debug!(%reply_err, "join rejection not delivered");
                }
            }
        }
    }

    /// Fills missing routing fields from the connection's own membership.
    fn resolve(
        &self,
        room_id: Option<RoomId>,
        peer_id: Option<PeerId>,
    ) -> Result<(RoomId, PeerId), RelayError> {
        let membership = self.membership();
        let room_id = room_id
            .or_else(|| membership.map(|m| m.room_id.clone()))
            .ok_or_else(|| RelayError::MalformedMessage("no roomId and not in a room".into()))?;
        let peer_id = peer_id
            .or_else(|| membership.map(|m| m.peer_id.clone()))
            .ok_or_else(|| RelayError::MalformedMessage("no peer identity and not in a room".into()))?;
        Ok((room_id, peer_id))
    }

    fn log_unroutable(&self, kind: &str, err: &RelayError) {
        tracing::warn!(connection_id = %self.connection_id(), kind, %err, "dropping unroutable message");
    }

    /// Leaves the current room, if any, and moves to `Closed`.
    ///
    /// Safe to call more than once.
    pub async fn close(&mut self) {
        let previous = std::mem::replace(&mut self.state, ConnectionState::Closed);
        if let ConnectionState::InRoom(membership) = previous {
            self.lifecycle.leave(&membership).await;
        }
    }
}

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads frames from the peer and feeds them to the [`Session`].
/// - Writes messages other connections enqueued for this peer.
///
/// On exit, for any reason, the peer leaves its room.
pub async fn run_connection(
    socket: WebSocket,
    lifecycle: LifecycleManager,
    router: MessageRouter,
    outbound_capacity: usize,
) {
    let connection_id = ConnectionId::new();
    let (outbound, mut outbound_rx) = outbound::channel(connection_id, outbound_capacity);
    let mut session = Session::new(outbound, lifecycle, router);
    let (mut ws_tx, mut ws_rx) = socket.split();

    tracing::debug!(%connection_id, "ws connection opened");

    loop {
        tokio::select! {
            // Incoming frame from the peer
            frame = ws_rx.next() => {
                let flow = match frame {
                    Some(Ok(Message::Text(text))) => session.handle_text(text.as_str()).await,
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => session.handle_text(text).await,
                        Err(err) => {
                            tracing::warn!(%connection_id, %err, "dropping non-UTF-8 binary frame");
                            Flow::Continue
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => Flow::Close,
                    Some(Ok(_)) => Flow::Continue,
                    Some(Err(err)) => {
                        tracing::debug!(%connection_id, %err, "ws read failed");
                        Flow::Close
                    }
                };
                if flow == Flow::Close {
                    break;
                }
            }
            // Message queued by another connection
            Some(text) = outbound_rx.recv() => {
                if ws_tx.send(Message::text(text)).await.is_err() {
                    break;
                }
            }
        }
    }

    session.close().await;
    let _ = ws_tx.send(Message::Close(None)).await;

    tracing::debug!(%connection_id, "ws connection closed");
}
