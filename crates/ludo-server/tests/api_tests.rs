//! Integration tests for the REST API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Rooms are opened through the registry the way a
//! `WebSocket` join would open them.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ludo_core::{ConnectionHandle, InMemoryRepository, LudoConfig, RoomRegistry};
use ludo_server::router::build_router;
use ludo_server::state::AppState;
use ludo_types::{ClientAction, ClientMessage, RoomId};
use serde_json::Value;
use tower::ServiceExt;

fn make_test_state() -> Arc<AppState> {
    let registry = RoomRegistry::new(
        Arc::new(LudoConfig::default()),
        Arc::new(InMemoryRepository::new()),
    );
    Arc::new(AppState::new(registry))
}

async fn join(state: &AppState, room: &str, name: &str) {
    let (conn, _rx) = ConnectionHandle::open();
    let message = ClientMessage {
        room_id: RoomId::from(room),
        player_id: None,
        action: ClientAction::Join {
            player_name: name.to_owned(),
            player_id: None,
        },
    };
    state.registry.dispatch(&conn, message).await.unwrap();
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let app = build_router(state);
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn health_reports_live_rooms() {
    let state = make_test_state();
    let (status, json) = get(Arc::clone(&state), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["rooms"], 0);

    join(&state, "lobby-1", "ada").await;
    let (_, json) = get(state, "/api/health").await;
    assert_eq!(json["rooms"], 1);
}

#[tokio::test]
async fn unknown_room_is_not_found() {
    let (status, json) = get(make_test_state(), "/api/rooms/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
    assert!(json["error"].as_str().unwrap().contains("nowhere"));
}

#[tokio::test]
async fn malformed_room_id_is_bad_request() {
    let (status, json) = get(make_test_state(), "/api/rooms/bad%20id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn room_state_is_served() {
    let state = make_test_state();
    join(&state, "lobby-2", "ada").await;
    join(&state, "lobby-2", "bo").await;

    let (status, json) = get(state, "/api/rooms/lobby-2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], "lobby-2");
    assert_eq!(json["phase"], "WaitingForPlayers");
    let players = json["players"].as_array().unwrap();
    assert_eq!(players.len(), 2);
    assert_eq!(players[0]["name"], "ada");
}
