//! Inbound WebSocket message envelope.
//!
//! Peers send flat JSON objects discriminated by `type`:
//!
//! ```json
//! {"type": "join", "roomId": "R1", "peerId": "p1"}
//! {"type": "signal", "roomId": "R1", "to": "p2", "from": "p1", "signal": {"sdp": "..."}}
//! {"type": "mute", "roomId": "R1", "peerId": "p1", "value": true}
//! {"type": "speaking", "roomId": "R1", "peerId": "p1", "value": false}
//! {"type": "leave"}
//! ```
//!
//! Routing fields other than those of `join` may be omitted once the
//! connection has joined; the connection's own room and identity fill in.

use serde::Deserialize;

use crate::domain::{PeerId, RoomId, StatusKind};
use crate::error::RelayError;

/// Client → server message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Enter a room under the given identity.
    Join {
        /// Room to enter.
        room_id: RoomId,
        /// Identity to announce.
        peer_id: PeerId,
    },

    /// Forward an opaque negotiation payload to one peer.
    Signal {
        /// Room the target is in.
        room_id: Option<RoomId>,
        /// Target peer.
        to: PeerId,
        /// Sending peer.
        from: Option<PeerId>,
        /// Opaque payload, forwarded verbatim.
        signal: serde_json::Value,
    },

    /// Announce a mute state change to the room.
    Mute {
        /// Room to notify.
        room_id: Option<RoomId>,
        /// Peer whose state changed.
        peer_id: Option<PeerId>,
        /// `true` when muted.
        value: bool,
    },

    /// Announce a speaking state change to the room.
    Speaking {
        /// Room to notify.
        room_id: Option<RoomId>,
        /// Peer whose state changed.
        peer_id: Option<PeerId>,
        /// `true` while speaking.
        value: bool,
    },

    /// Leave the current room and close the connection.
    Leave {
        /// Room being left. Logged only; the connection's membership decides.
        room_id: Option<RoomId>,
        /// Identity leaving. Logged only.
        peer_id: Option<PeerId>,
    },
}

impl ClientMessage {
    /// Message types the relay understands.
    pub const KNOWN_TYPES: [&'static str; 5] = ["join", "signal", "mute", "speaking", "leave"];

    /// Parses one inbound frame.
    ///
    /// # Errors
    ///
    /// - [`RelayError::MalformedMessage`] if the frame is not a JSON object
    ///   with a string `type`, a known type lacks required fields, or an
    ///   identifier is empty.
    /// - [`RelayError::UnknownMessageType`] if `type` is not one of
    ///   [`Self::KNOWN_TYPES`].
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| RelayError::MalformedMessage(format!("invalid JSON: {e}")))?;

        let Some(kind) = value.get("type").and_then(serde_json::Value::as_str) else {
            return Err(RelayError::MalformedMessage(
                "missing string field `type`".to_string(),
            ));
        };
        if !Self::KNOWN_TYPES.iter().any(|known| *known == kind) {
            return Err(RelayError::UnknownMessageType(kind.to_string()));
        }
        let kind = kind.to_string();

        let msg: Self = serde_json::from_value(value)
            .map_err(|e| RelayError::MalformedMessage(format!("{kind}: {e}")))?;
        msg.validate()?;
        Ok(msg)
    }

    /// Returns the `type` discriminant as sent on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Signal { .. } => "signal",
            Self::Mute { .. } => "mute",
            Self::Speaking { .. } => "speaking",
            Self::Leave { .. } => "leave",
        }
    }

    /// Maps `mute` / `speaking` to their [`StatusKind`].
    #[must_use]
    pub const fn status_kind(&self) -> Option<StatusKind> {
        match self {
            Self::Mute { .. } => Some(StatusKind::Mute),
            Self::Speaking { .. } => Some(StatusKind::Speaking),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), RelayError> {
        let empty_room = |room: Option<&RoomId>| room.is_some_and(RoomId::is_empty);
        let empty_peer = |peer: Option<&PeerId>| peer.is_some_and(PeerId::is_empty);

        let invalid = match self {
            Self::Join { room_id, peer_id } => room_id.is_empty() || peer_id.is_empty(),
            Self::Signal {
                room_id, to, from, ..
            } => empty_room(room_id.as_ref()) || to.is_empty() || empty_peer(from.as_ref()),
            Self::Mute {
                room_id, peer_id, ..
            }
            | Self::Speaking {
                room_id, peer_id, ..
            }
            | Self::Leave { room_id, peer_id } => {
                empty_room(room_id.as_ref()) || empty_peer(peer_id.as_ref())
            }
        };
        if invalid {
            return Err(RelayError::MalformedMessage(format!(
                "{}: identifiers must not be empty",
                self.kind()
            )));
        }
        Ok(())
    }
}
