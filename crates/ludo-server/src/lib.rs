//! Network front end for Ludo Arena.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) carrying JSON [`ClientMessage`]
//!   frames in and [`ServerEvent`] frames out
//! - **REST endpoints** for room inspection and health checks
//!
//! # Architecture
//!
//! Every socket gets a [`ConnectionHandle`] whose queue the socket task
//! drains. Inbound frames are decoded and handed to the shared
//! [`RoomRegistry`], which routes them to the owning room actor. The
//! server holds no game state of its own.
//!
//! [`ClientMessage`]: ludo_types::ClientMessage
//! [`ServerEvent`]: ludo_types::ServerEvent
//! [`ConnectionHandle`]: ludo_core::ConnectionHandle
//! [`RoomRegistry`]: ludo_core::RoomRegistry

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
