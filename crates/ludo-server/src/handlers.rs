//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/health` | Liveness and live room count |
//! | `GET` | `/api/rooms/{id}` | Current state of one room |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use ludo_types::{Room, RoomId};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the server answers.
    pub status: &'static str,
    /// Rooms with a live actor.
    pub rooms: usize,
    /// Seconds since the server started.
    pub uptime_seconds: i64,
}

/// Report liveness and the number of live rooms.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.started_at);
    Json(HealthResponse {
        status: "ok",
        rooms: state.registry.room_count().await,
        uptime_seconds: uptime.num_seconds(),
    })
}

/// Return the current state of a room, live or persisted.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    let room_id = RoomId::new(id);
    if !room_id.is_valid() {
        return Err(ApiError::BadRequest(format!("invalid room id: {room_id}")));
    }
    Ok(Json(state.registry.snapshot(&room_id).await?))
}
