//! `WebSocket` game channel.
//!
//! Clients connect to `GET /ws`, send JSON-encoded [`ClientMessage`]
//! frames and receive JSON-encoded [`ServerEvent`] frames. One socket may
//! sit in several rooms; when it closes, every room it joined is told the
//! connection went away so the seat can wait for a reconnect.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use ludo_core::{ConnectionHandle, EngineError};
use ludo_types::{ClientAction, ClientMessage, RoomId, ServerEvent};
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` game connection.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_play(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: pump room events out and client
/// frames in until either side closes.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let (conn, mut rx) = ConnectionHandle::open();
    let mut joined: HashSet<RoomId> = HashSet::new();
    debug!(conn_id = %conn.id, "WebSocket client connected");

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    return;
                };
                let json = match serde_json::to_string(&event) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("Failed to serialize server event: {e}");
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    debug!(conn_id = %conn.id, "WebSocket client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_frame(&state, &conn, &mut joined, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(conn_id = %conn.id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(conn_id = %conn.id, "WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(conn_id = %conn.id, "WebSocket error: {e}");
                        break;
                    }
                    Some(Ok(Message::Binary(_) | Message::Pong(_))) => {}
                }
            }
        }
    }

    for room_id in &joined {
        state.registry.disconnect(room_id, conn.id).await;
    }
}

/// Decode one inbound frame and route it to its room.
async fn handle_frame(
    state: &AppState,
    conn: &ConnectionHandle,
    joined: &mut HashSet<RoomId>,
    text: &str,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            let error = EngineError::validation(format!("malformed message: {e}"));
            conn.send(ServerEvent::Error {
                code: error.code(),
                message: error.to_string(),
            });
            return;
        }
    };
    let room_id = message.room_id.clone();
    let leaving = matches!(message.action, ClientAction::Leave);

    match state.registry.dispatch(conn, message).await {
        Ok(Some(_player_id)) => {
            joined.insert(room_id);
        }
        Ok(None) if leaving => {
            joined.remove(&room_id);
        }
        Ok(None) => {}
        Err(e) => {
            debug!(conn_id = %conn.id, room_id = %room_id, error = %e, "message rejected");
        }
    }
}

#[cfg(test)]
mod tests {
    use ludo_core::{InMemoryRepository, LudoConfig, RoomRegistry};
    use ludo_types::ErrorCode;

    use super::*;

    fn state() -> AppState {
        let registry = RoomRegistry::new(
            Arc::new(LudoConfig::default()),
            Arc::new(InMemoryRepository::new()),
        );
        AppState::new(registry)
    }

    #[tokio::test]
    async fn malformed_frame_is_answered_with_validation_error() {
        let state = state();
        let (conn, mut rx) = ConnectionHandle::open();
        let mut joined = HashSet::new();
        handle_frame(&state, &conn, &mut joined, "{not json").await;
        assert!(matches!(
            rx.recv().await,
            Some(ServerEvent::Error {
                code: ErrorCode::Validation,
                ..
            })
        ));
        assert!(joined.is_empty());
    }

    #[tokio::test]
    async fn join_and_leave_track_rooms() {
        let state = state();
        let (conn, _rx) = ConnectionHandle::open();
        let mut joined = HashSet::new();
        let join = r#"{"room_id":"ws-room","player_id":null,"action":{"Join":{"player_name":"Ann","player_id":null}}}"#;
        handle_frame(&state, &conn, &mut joined, join).await;
        assert!(joined.contains(&RoomId::from("ws-room")));

        let leave = r#"{"room_id":"ws-room","player_id":null,"action":"Leave"}"#;
        handle_frame(&state, &conn, &mut joined, leave).await;
        assert!(joined.is_empty());
    }
}
