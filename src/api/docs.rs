//! OpenAPI document for the REST surface.

use utoipa::OpenApi;

use super::dto::{RoomDetailResponse, RoomMemberDto};
use super::handlers::system::HealthResponse;
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of the REST endpoints.
///
/// The WebSocket protocol at `/ws` is documented in [`crate::ws::messages`].
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "room-relay", description = "Rendezvous and signaling relay for peer-to-peer audio rooms"),
    paths(
        super::handlers::system::health_handler,
        super::handlers::room::get_room,
    ),
    components(schemas(
        HealthResponse,
        RoomDetailResponse,
        RoomMemberDto,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "System", description = "Service health"),
        (name = "Rooms", description = "Room membership inspection"),
    )
)]
pub struct ApiDoc;
