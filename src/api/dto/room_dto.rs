//! Room inspection DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Member, PeerId, RoomId};

/// One member as reported by `GET /api/v1/rooms/{room_id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomMemberDto {
    /// Peer identity.
    #[schema(value_type = String)]
    pub peer_id: PeerId,
    /// When the peer joined.
    pub joined_at: DateTime<Utc>,
}

impl From<&Member> for RoomMemberDto {
    fn from(member: &Member) -> Self {
        Self {
            peer_id: member.peer_id.clone(),
            joined_at: member.joined_at,
        }
    }
}

/// Response for `GET /api/v1/rooms/{room_id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomDetailResponse {
    /// Room name.
    #[schema(value_type = String)]
    pub room_id: RoomId,
    /// Number of members.
    pub peer_count: usize,
    /// Members in join order.
    pub peers: Vec<RoomMemberDto>,
}
