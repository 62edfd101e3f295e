//! Axum router construction for the game server.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for browser clients on other origins.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the game server.
///
/// The router includes:
/// - `GET /ws` -- `WebSocket` game channel
/// - `GET /api/health` -- liveness
/// - `GET /api/rooms/{id}` -- room state
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::ws_play))
        .route("/api/health", get(handlers::health))
        .route("/api/rooms/{id}", get(handlers::get_room))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
