//! Domain layer: identifiers, outbound queues, wire messages, and the
//! room registry.
//!
//! Nothing here knows about sockets or HTTP; the WebSocket layer turns
//! frames into calls on the service layer, which mutates the registry and
//! enqueues [`ServerMessage`]s onto [`PeerHandle`]s.

pub mod identity;
pub mod outbound;
pub mod room_registry;
pub mod server_message;

pub use identity::{ConnectionId, Membership, PeerId, RoomId};
pub use outbound::{Outbound, PeerHandle};
pub use room_registry::{Member, RoomRegistry, RoomTable};
pub use server_message::{ServerMessage, StatusKind};
