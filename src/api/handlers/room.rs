//! Room inspection handler.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{RoomDetailResponse, RoomMemberDto};
use crate::app_state::AppState;
use crate::domain::RoomId;
use crate::error::{ErrorResponse, RelayError};

/// `GET /rooms/{room_id}` — Current members of a room.
///
/// # Errors
///
/// Returns [`RelayError::RoomNotFound`] if the room has no members.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{room_id}",
    tag = "Rooms",
    summary = "Get room membership",
    description = "Returns the peers currently in the room, in join order.",
    params(("room_id" = String, Path, description = "Room name")),
    responses(
        (status = 200, description = "Room membership", body = RoomDetailResponse),
        (status = 404, description = "Room does not exist", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    let room_id = RoomId::new(room_id);
    let table = state.registry.read().await;
    let members = table.members(&room_id);
    if members.is_empty() {
        return Err(RelayError::RoomNotFound(room_id));
    }

    let peers: Vec<RoomMemberDto> = members.iter().map(RoomMemberDto::from).collect();
    Ok(Json(RoomDetailResponse {
        room_id,
        peer_count: peers.len(),
        peers,
    }))
}

/// Room routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/rooms/{room_id}", get(get_room))
}
