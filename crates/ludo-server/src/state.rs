//! Shared application state for the game server.

use chrono::{DateTime, Utc};
use ludo_core::RoomRegistry;

/// Shared state for the Axum application.
///
/// Wrapped in [`std::sync::Arc`] and injected via Axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    /// Live rooms and message routing.
    pub registry: RoomRegistry,
    /// When the server started, for the health endpoint.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state around a room registry.
    pub fn new(registry: RoomRegistry) -> Self {
        Self {
            registry,
            started_at: Utc::now(),
        }
    }
}
