//! `Dragonfly` (Redis-compatible) room storage.
//!
//! # Key Patterns
//!
//! | Pattern | Type | Description |
//! |---------|------|-------------|
//! | `ludo:room:{id}` | JSON | Full room state, expires after the configured TTL |

use fred::prelude::*;
use fred::types::Expiration;
use futures::future::BoxFuture;
use ludo_core::{RepositoryError, RoomRepository};
use ludo_types::{Room, RoomId};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DbError;

/// Storage key of a room document.
pub fn room_key(room_id: &RoomId) -> String {
    format!("ludo:room:{room_id}")
}

/// Connection handle to a `Dragonfly` instance storing rooms.
#[derive(Clone)]
pub struct DragonflyRepository {
    client: Client,
    ttl_seconds: i64,
}

impl DragonflyRepository {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str, ttl_seconds: i64) -> Result<Self, DbError> {
        let config = Config::from_url(url)
            .map_err(|e| DbError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!(ttl_seconds, "Connected to Dragonfly");
        Ok(Self {
            client,
            ttl_seconds,
        })
    }

    /// Serialize `value` as JSON and store it at `key` with the room TTL.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if serialization fails.
    /// Returns [`DbError::Dragonfly`] if the write fails.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DbError> {
        let json = serde_json::to_string(value)?;
        let expiration = (self.ttl_seconds > 0).then_some(Expiration::EX(self.ttl_seconds));
        let _: () = self
            .client
            .set(key, json.as_str(), expiration, None, false)
            .await?;
        Ok(())
    }

    /// Read the value at `key` and deserialize from JSON. `None` when the key
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Serialization`] if deserialization fails.
    /// Returns [`DbError::Dragonfly`] if the read fails.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DbError> {
        let value: Option<String> = self.client.get(key).await?;
        value
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(DbError::from)
    }

    /// Delete a key from `Dragonfly`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Dragonfly`] if the delete fails.
    pub async fn delete(&self, key: &str) -> Result<(), DbError> {
        let _: u32 = self.client.del(key).await?;
        Ok(())
    }
}

impl RoomRepository for DragonflyRepository {
    fn load_room<'a>(
        &'a self,
        room_id: &'a RoomId,
    ) -> BoxFuture<'a, Result<Option<Room>, RepositoryError>> {
        Box::pin(async move { Ok(self.get_json(&room_key(room_id)).await?) })
    }

    fn save_room<'a>(&'a self, room: &'a Room) -> BoxFuture<'a, Result<(), RepositoryError>> {
        Box::pin(async move { Ok(self.set_json(&room_key(&room.id), room).await?) })
    }

    fn delete_room<'a>(
        &'a self,
        room_id: &'a RoomId,
    ) -> BoxFuture<'a, Result<(), RepositoryError>> {
        Box::pin(async move { Ok(self.delete(&room_key(room_id)).await?) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn room_keys_are_namespaced() {
        assert_eq!(room_key(&RoomId::from("ABC-1")), "ludo:room:ABC-1");
    }

    #[test]
    fn codec_errors_stay_codec_errors() {
        let err = serde_json::from_str::<Room>("{").unwrap_err();
        let converted = RepositoryError::from(DbError::from(err));
        assert!(matches!(converted, RepositoryError::Codec(_)));

        let converted = RepositoryError::from(DbError::Config("bad url".to_owned()));
        assert!(matches!(converted, RepositoryError::Backend { .. }));
    }
}
