//! Room persistence for Ludo Arena on `Dragonfly` (Redis-compatible).
//!
//! Each room is stored as one JSON document under `ludo:room:{id}` with a
//! sliding TTL, refreshed on every save. A restarted server reopens rooms
//! from these documents when their players reconnect.
//!
//! # Modules
//!
//! - [`dragonfly`] -- Connection handle and [`RoomRepository`] implementation.
//! - [`error`] -- Shared error types.
//!
//! [`RoomRepository`]: ludo_core::RoomRepository

pub mod dragonfly;
pub mod error;

pub use dragonfly::{DragonflyRepository, room_key};
pub use error::DbError;
