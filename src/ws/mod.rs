//! WebSocket layer: upgrade handler, per-connection state machine, and
//! inbound message parsing.
//!
//! Each peer opens one WebSocket per room visit at `/ws` and speaks the
//! JSON protocol described in [`messages`].

pub mod connection;
pub mod handler;
pub mod messages;
