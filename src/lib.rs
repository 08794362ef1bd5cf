//! # room-relay
//!
//! Rendezvous and signaling relay for peer-to-peer audio rooms.
//!
//! Browser peers open a WebSocket, join a named room, and use the relay to
//! discover each other and exchange opaque negotiation payloads (SDP
//! offers/answers, ICE candidates) plus mute/speaking status. Media never
//! passes through this service.
//!
//! ## Architecture
//!
//! ```text
//! Peers (WebSocket)          Operators (HTTP)
//!     │                          │
//!     ├── WS Handler (ws/)       ├── REST Handlers (api/)
//!     │                          │
//!     ├── LifecycleManager ──┐   │
//!     ├── MessageRouter ─────┤   │
//!     │    (service/)        │   │
//!     │                      ▼   ▼
//!     └────────────────── RoomRegistry (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod service;
pub mod ws;
