//! Type-safe identifier wrappers.
//!
//! Players, tokens, power-ups, and transport connections are identified by
//! UUID v7 newtypes so identifiers of different entities cannot be mixed at
//! compile time. Rooms are identified by a short human-shareable code chosen
//! by the client ([`RoomId`]).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Maximum length of a room code.
pub const MAX_ROOM_ID_LEN: usize = 32;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a seated player.
    PlayerId
}

define_id! {
    /// Unique identifier for a token (four per player).
    TokenId
}

define_id! {
    /// Unique identifier for a power-up placed on the track.
    PowerUpId
}

define_id! {
    /// Unique identifier for a transport connection (one per socket).
    ///
    /// Assigned by the transport layer, never by the client, and used to
    /// bind a seat to the connection currently allowed to act for it.
    ConnectionId
}

/// Client-chosen room code (e.g. `"ABC123"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoomId(pub String);

impl RoomId {
    /// Wrap a room code without validating it.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrow the room code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code is 1-32 characters of ASCII letters, digits, `-`
    /// or `_`.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_ROOM_ID_LEN
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl core::fmt::Display for RoomId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(code: &str) -> Self {
        Self(code.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let player = PlayerId::new();
        let token = TokenId::new();
        assert_ne!(player.into_inner(), Uuid::nil());
        assert_ne!(token.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = TokenId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn room_id_validation() {
        assert!(RoomId::from("ABC123").is_valid());
        assert!(RoomId::from("game_room-2").is_valid());
        assert!(!RoomId::from("").is_valid());
        assert!(!RoomId::from("has space").is_valid());
        assert!(!RoomId::new("x".repeat(MAX_ROOM_ID_LEN + 1)).is_valid());
    }

    #[test]
    fn room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::from("ROOM1")).ok();
        assert_eq!(json.as_deref(), Some("\"ROOM1\""));
    }
}
