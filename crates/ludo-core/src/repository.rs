//! Room persistence seam.
//!
//! The room actor saves its state after every accepted command and deletes
//! it when the room closes. A registry reopening a room that is not live
//! loads it from here first. The in-memory repository serves single-node
//! deployments and tests; `ludo-db` provides the Dragonfly implementation.

use std::collections::HashMap;

use futures::future::BoxFuture;
use ludo_types::{Room, RoomId};
use tokio::sync::RwLock;

/// Errors reported by a room repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The storage backend failed.
    #[error("storage backend error: {message}")]
    Backend {
        /// Backend-specific description.
        message: String,
    },

    /// A stored room could not be encoded or decoded.
    #[error("room codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Storage for room snapshots, keyed by room id.
pub trait RoomRepository: Send + Sync {
    /// Fetch a stored room, `None` when absent.
    fn load_room<'a>(
        &'a self,
        room_id: &'a RoomId,
    ) -> BoxFuture<'a, Result<Option<Room>, RepositoryError>>;

    /// Store the room, replacing any previous snapshot.
    fn save_room<'a>(&'a self, room: &'a Room) -> BoxFuture<'a, Result<(), RepositoryError>>;

    /// Remove a stored room. Removing an absent room succeeds.
    fn delete_room<'a>(&'a self, room_id: &'a RoomId)
    -> BoxFuture<'a, Result<(), RepositoryError>>;
}

/// Rooms kept in process memory. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl InMemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

impl RoomRepository for InMemoryRepository {
    fn load_room<'a>(
        &'a self,
        room_id: &'a RoomId,
    ) -> BoxFuture<'a, Result<Option<Room>, RepositoryError>> {
        Box::pin(async move { Ok(self.rooms.read().await.get(room_id).cloned()) })
    }

    fn save_room<'a>(&'a self, room: &'a Room) -> BoxFuture<'a, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.rooms
                .write()
                .await
                .insert(room.id.clone(), room.clone());
            Ok(())
        })
    }

    fn delete_room<'a>(
        &'a self,
        room_id: &'a RoomId,
    ) -> BoxFuture<'a, Result<(), RepositoryError>> {
        Box::pin(async move {
            self.rooms.write().await.remove(room_id);
            Ok(())
        })
    }
}
