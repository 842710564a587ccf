//! Application state for the HTTP server.

use crate::bus::MessageBus;
use crate::services::engine::TrackingEngine;

/// Shared state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: TrackingEngine,
    /// Source of the `positions` stream.
    pub bus: MessageBus,
    /// Name of the store backend reported by `/health`.
    pub backend: &'static str,
}

impl AppState {
    pub fn new(engine: TrackingEngine, bus: MessageBus) -> Self {
        Self {
            engine,
            bus,
            backend: "local",
        }
    }
}
