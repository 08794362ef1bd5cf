//! Message router: reply, unicast, and room broadcast.
//!
//! Delivery is best effort. A recipient whose connection is gone is
//! skipped and logged at `debug`; it never aborts delivery to anyone
//! else and is never reported back to the sender.

use std::sync::Arc;

use crate::domain::{Outbound, PeerId, RoomId, RoomRegistry, RoomTable, ServerMessage, StatusKind};
use crate::error::RelayError;

/// Routes messages to their recipients using the shared [`RoomRegistry`].
#[derive(Debug, Clone)]
pub struct MessageRouter {
    registry: Arc<RoomRegistry>,
}

impl MessageRouter {
    /// Creates a router over the given registry.
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Enqueues a message for the requesting connection itself.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PeerGone`] if the connection stopped reading,
    /// or [`RelayError::Internal`] if the message cannot be serialized.
    pub fn reply(outbound: &Outbound, msg: &ServerMessage) -> Result<(), RelayError> {
        outbound.send(msg.to_json()?)
    }

    /// Enqueues `msg` for every member of `room_id` except `excluding`.
    ///
    /// Must be called with a guard on the registry held, so that the
    /// recipient set is the one committed by the triggering mutation.
    /// Returns the number of members the message was enqueued for.
    pub fn broadcast(
        table: &RoomTable,
        room_id: &RoomId,
        excluding: Option<&PeerId>,
        msg: &ServerMessage,
    ) -> usize {
        let members = table.members(room_id);
        if members.is_empty() {
            return 0;
        }
        let text = match msg.to_json() {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(%room_id, %err, "dropping broadcast that failed to serialize");
                return 0;
            }
        };

        let mut delivered = 0;
        for member in members.iter().filter(|m| Some(&m.peer_id) != excluding) {
            match member.handle.deliver(text.clone()) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::debug!(%room_id, peer_id = %member.peer_id, %err, "skipping unreachable peer");
                }
            }
        }
        delivered
    }

    /// Forwards an opaque negotiation payload to one member of a room.
    ///
    /// Returns `false` when the target is absent or gone; the sender is
    /// never told, since the target leaving mid-negotiation is expected.
    pub async fn forward_signal(
        &self,
        room_id: &RoomId,
        from: PeerId,
        to: &PeerId,
        signal: serde_json::Value,
    ) -> bool {
        let table = self.registry.read().await;
        let handle = match table.lookup(room_id, to) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::debug!(%err, %from, "dropping signal for absent peer");
                return false;
            }
        };

        let msg = ServerMessage::Signal { from, signal };
        let delivered = msg.to_json().and_then(|text| handle.deliver(text));
        match delivered {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(%room_id, peer_id = %to, %err, "signal not delivered");
                false
            }
        }
    }

    /// Broadcasts a `mute` / `speaking` change to the rest of the room.
    ///
    /// Returns the number of members the notice was enqueued for.
    pub async fn broadcast_status(
        &self,
        room_id: &RoomId,
        peer_id: PeerId,
        kind: StatusKind,
        value: bool,
    ) -> usize {
        let table = self.registry.read().await;
        let exclude = peer_id.clone();
        let msg = ServerMessage::status(kind, peer_id, value);
        Self::broadcast(&table, room_id, Some(&exclude), &msg)
    }
}
