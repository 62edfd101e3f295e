//! Room lookup and message routing.
//!
//! The registry maps room ids to live room actors. Joining an unknown room
//! opens it, loading a persisted copy from the repository when one exists.
//! Actors shut themselves down when their last player leaves; the registry
//! notices closed handles lazily and replaces them on the next join.

use std::collections::HashMap;
use std::sync::Arc;

use ludo_types::{ClientAction, ClientMessage, ConnectionId, PlayerId, Room, RoomId, ServerEvent};
use tokio::sync::Mutex;

use crate::config::LudoConfig;
use crate::error::EngineError;
use crate::repository::RoomRepository;
use crate::session::{RoomHandle, spawn_room};
use crate::transport::ConnectionHandle;

struct Inner {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
    config: Arc<LudoConfig>,
    repo: Arc<dyn RoomRepository>,
}

/// Shared directory of live rooms. Cloning is cheap.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<Inner>,
}

impl RoomRegistry {
    /// A registry persisting rooms through `repo`.
    pub fn new(config: Arc<LudoConfig>, repo: Arc<dyn RoomRepository>) -> Self {
        Self {
            inner: Arc::new(Inner {
                rooms: Mutex::new(HashMap::new()),
                config,
                repo,
            }),
        }
    }

    /// The configuration rooms are opened with.
    pub fn config(&self) -> &LudoConfig {
        &self.inner.config
    }

    fn validate(room_id: &RoomId) -> Result<(), EngineError> {
        if room_id.is_valid() {
            Ok(())
        } else {
            Err(EngineError::validation(format!("invalid room id {room_id}")))
        }
    }

    /// The live actor for `room_id`, opening it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for a malformed room id.
    pub async fn get_or_open(&self, room_id: &RoomId) -> Result<RoomHandle, EngineError> {
        Self::validate(room_id)?;
        if let Some(handle) = self.get(room_id).await {
            return Ok(handle);
        }

        // The registry lock is not held across the load.
        let stored = match self.inner.repo.load_room(room_id).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(room_id = %room_id, error = %e, "failed to load room, starting fresh");
                None
            }
        };
        let mut rooms = self.inner.rooms.lock().await;
        if let Some(handle) = rooms.get(room_id)
            && !handle.is_closed()
        {
            // Another join opened the room while this one was loading.
            return Ok(handle.clone());
        }
        let restored = stored.is_some();
        let room = stored.unwrap_or_else(|| {
            Room::new(room_id.clone(), self.inner.config.rules.rule_set())
        });
        let handle = spawn_room(
            room,
            restored,
            Arc::clone(&self.inner.config),
            Arc::clone(&self.inner.repo),
        );
        rooms.insert(room_id.clone(), handle.clone());
        Ok(handle)
    }

    /// The live actor for `room_id`, if any.
    pub async fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.inner
            .rooms
            .lock()
            .await
            .get(room_id)
            .filter(|h| !h.is_closed())
            .cloned()
    }

    /// Route one client message.
    ///
    /// Rejections are unicast to `conn` as error events and also returned.
    /// Joins answer with the seat the connection is now bound to.
    ///
    /// # Errors
    ///
    /// Returns the reason the message was rejected.
    pub async fn dispatch(
        &self,
        conn: &ConnectionHandle,
        message: ClientMessage,
    ) -> Result<Option<PlayerId>, EngineError> {
        let ClientMessage {
            room_id,
            player_id,
            action,
        } = message;
        let result = match action {
            ClientAction::Join {
                player_name,
                player_id: requested,
            } => self
                .join(conn, &room_id, player_name, requested.or(player_id))
                .await
                .map(Some),
            action => match self.get(&room_id).await {
                Some(handle) => handle
                    .act(conn.clone(), player_id, action)
                    .await
                    .map(|()| None),
                None => Err(report(conn, EngineError::RoomNotFound(room_id))),
            },
        };
        // Rooms answer their own rejections; a closed room cannot.
        if let Err(e @ EngineError::RoomClosed(_)) = &result {
            conn.send(error_event(e));
        }
        result
    }

    async fn join(
        &self,
        conn: &ConnectionHandle,
        room_id: &RoomId,
        name: String,
        player_id: Option<PlayerId>,
    ) -> Result<PlayerId, EngineError> {
        let handle = self
            .get_or_open(room_id)
            .await
            .map_err(|e| report(conn, e))?;
        match handle.join(conn.clone(), name.clone(), player_id).await {
            Err(EngineError::RoomClosed(_)) => {
                // The actor shut down between lookup and join.
                let handle = self
                    .get_or_open(room_id)
                    .await
                    .map_err(|e| report(conn, e))?;
                handle.join(conn.clone(), name, player_id).await
            }
            other => other,
        }
    }

    /// Tell the room that a connection went away.
    pub async fn disconnect(&self, room_id: &RoomId, conn_id: ConnectionId) {
        if let Some(handle) = self.get(room_id).await {
            handle.disconnect(conn_id).await;
        }
    }

    /// Current state of a room: the live copy, else the persisted one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RoomNotFound`] when neither exists.
    pub async fn snapshot(&self, room_id: &RoomId) -> Result<Room, EngineError> {
        Self::validate(room_id)?;
        if let Some(handle) = self.get(room_id).await
            && let Ok(room) = handle.snapshot().await
        {
            return Ok(room);
        }
        match self.inner.repo.load_room(room_id).await {
            Ok(Some(room)) => Ok(room),
            Ok(None) => Err(EngineError::RoomNotFound(room_id.clone())),
            Err(e) => {
                tracing::warn!(room_id = %room_id, error = %e, "failed to load room");
                Err(EngineError::RoomNotFound(room_id.clone()))
            }
        }
    }

    /// Number of live rooms. Prunes rooms whose actors have stopped.
    pub async fn room_count(&self) -> usize {
        let mut rooms = self.inner.rooms.lock().await;
        rooms.retain(|_, handle| !handle.is_closed());
        rooms.len()
    }
}

fn report(conn: &ConnectionHandle, error: EngineError) -> EngineError {
    tracing::debug!(error = %error, "message rejected");
    conn.send(error_event(&error));
    error
}

fn error_event(error: &EngineError) -> ServerEvent {
    ServerEvent::Error {
        code: error.code(),
        message: error.to_string(),
    }
}
