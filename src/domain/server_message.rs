//! Messages the relay pushes to connected peers.
//!
//! Every variant serializes to a flat JSON object discriminated by a
//! kebab-case `type` field, with camelCase payload keys, e.g.
//! `{"type":"new-peer","peerId":"p2"}`.

use serde::{Deserialize, Serialize};

use super::PeerId;
use crate::error::RelayError;

/// Which presence flag a status broadcast carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Microphone muted / unmuted.
    Mute,
    /// Voice activity started / stopped.
    Speaking,
}

/// Server → peer message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Reply to a joiner: everyone already in the room, in join order.
    Peers {
        /// Other members of the room.
        peers: Vec<PeerId>,
    },

    /// Someone joined the recipient's room.
    NewPeer {
        /// The new member.
        peer_id: PeerId,
    },

    /// Negotiation payload forwarded from another peer.
    Signal {
        /// Sender of the payload.
        from: PeerId,
        /// Opaque payload, forwarded verbatim.
        signal: serde_json::Value,
    },

    /// Mute state of another member.
    Mute {
        /// Member whose state changed.
        peer_id: PeerId,
        /// `true` when muted.
        value: bool,
    },

    /// Speaking state of another member.
    Speaking {
        /// Member whose state changed.
        peer_id: PeerId,
        /// `true` while speaking.
        value: bool,
    },

    /// A member left the recipient's room.
    PeerLeft {
        /// The departed member.
        peer_id: PeerId,
    },

    /// A request from this connection was rejected.
    Error {
        /// Numeric code, see [`RelayError::error_code`].
        code: u32,
        /// Human-readable reason.
        message: String,
    },
}

impl ServerMessage {
    /// Builds a `mute` or `speaking` broadcast.
    #[must_use]
    pub fn status(kind: StatusKind, peer_id: PeerId, value: bool) -> Self {
        match kind {
            StatusKind::Mute => Self::Mute { peer_id, value },
            StatusKind::Speaking => Self::Speaking { peer_id, value },
        }
    }

    /// Builds the rejection notice sent back to a connection.
    #[must_use]
    pub fn from_error(err: &RelayError) -> Self {
        Self::Error {
            code: err.error_code(),
            message: err.to_string(),
        }
    }

    /// Serializes the message to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if serialization fails.
    pub fn to_json(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }
}
