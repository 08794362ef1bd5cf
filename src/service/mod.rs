//! Service layer: lifecycle management and message routing.
//!
//! Both services are thin, cloneable coordinators over the shared
//! [`crate::domain::RoomRegistry`].

pub mod lifecycle;
pub mod router;

pub use lifecycle::{LifecycleManager, SweepReport};
pub use router::MessageRouter;
