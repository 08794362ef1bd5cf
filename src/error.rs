//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the relay. Each variant
//! carries a numeric code that is used both for the REST surface (via
//! [`IntoResponse`]) and for the `error` message sent back over a
//! WebSocket when a join is rejected.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{PeerId, RoomId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2002,
///     "message": "room not found: lobby"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Malformed input | 400 Bad Request              |
/// | 2000–2999 | Membership      | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The peer identity is already registered in some room.
    #[error("peer id already in use: {0}")]
    DuplicatePeer(PeerId),

    /// No peer with that identity is a member of the room.
    #[error("peer {peer_id} not found in room {room_id}")]
    PeerNotFound {
        /// Room that was searched.
        room_id: RoomId,
        /// Peer that was looked up.
        peer_id: PeerId,
    },

    /// The room does not exist (it has no members).
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The peer's connection has gone away; delivery is impossible.
    #[error("peer connection is closed")]
    PeerGone,

    /// Inbound frame could not be parsed into a message envelope.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// Inbound envelope carried a `type` the relay does not handle.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// Configuration value is present but invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::MalformedMessage(_) => 1001,
            Self::UnknownMessageType(_) => 1002,
            Self::DuplicatePeer(_) => 2001,
            Self::RoomNotFound(_) => 2002,
            Self::PeerNotFound { .. } => 2003,
            Self::PeerGone => 2004,
            Self::Internal(_) => 3000,
            Self::InvalidConfig(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedMessage(_) | Self::UnknownMessageType(_) => StatusCode::BAD_REQUEST,
            Self::RoomNotFound(_) | Self::PeerNotFound { .. } | Self::PeerGone => {
                StatusCode::NOT_FOUND
            }
            Self::DuplicatePeer(_) => StatusCode::CONFLICT,
            Self::InvalidConfig(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
