//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::{RoomRegistry, outbound};
use crate::service::{LifecycleManager, MessageRouter};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Room membership, shared by every connection.
    pub registry: Arc<RoomRegistry>,
    /// Join / leave / sweep coordinator.
    pub lifecycle: LifecycleManager,
    /// Unicast and broadcast delivery.
    pub router: MessageRouter,
    /// Messages buffered per connection before further ones are dropped.
    pub outbound_capacity: usize,
}

impl AppState {
    /// Builds the services over a registry.
    #[must_use]
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            lifecycle: LifecycleManager::new(Arc::clone(&registry)),
            router: MessageRouter::new(Arc::clone(&registry)),
            registry,
            outbound_capacity: outbound::DEFAULT_CAPACITY,
        }
    }

    /// Overrides the per-connection outbound queue size.
    #[must_use]
    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(RoomRegistry::new()))
    }
}
