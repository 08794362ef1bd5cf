//! Type-safe identifiers for rooms, peers, and connections.
//!
//! [`RoomId`] and [`PeerId`] are opaque client-chosen strings; the relay
//! never interprets them beyond equality. [`ConnectionId`] is a
//! server-generated UUID v4 used to correlate log lines for one socket.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a client-provided identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the identifier is the empty string.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

opaque_id!(
    /// Name of a room. Peers sharing a `RoomId` can see each other.
    RoomId
);

opaque_id!(
    /// Identity a peer announces when joining a room.
    ///
    /// Unique across the whole registry for as long as the peer is joined.
    PeerId
);

/// Server-side identifier for one WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `(room, peer)` pair a connection currently occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// Room the peer is in.
    pub room_id: RoomId,
    /// Identity the peer joined with.
    pub peer_id: PeerId,
}

impl Membership {
    /// Creates a membership record.
    #[must_use]
    pub fn new(room_id: RoomId, peer_id: PeerId) -> Self {
        Self { room_id, peer_id }
    }
}
