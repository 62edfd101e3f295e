//! Turn coordination and room orchestration for Ludo Arena.
//!
//! The synchronous core ([`coordinator`], [`seating`]) owns every rule about
//! whose turn it is and what may happen next. The asynchronous shell
//! ([`session`], [`registry`]) serializes commands per room, runs the turn
//! clock and fans events out to connections.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `ludo-config.yaml`.
//! - [`coordinator`] -- Game start, rolling, moving, skipping and ending.
//! - [`seating`] -- Joining, readiness, rule votes, disconnects and leaving.
//! - [`transition`] -- Events and timer directives produced by a command.
//! - [`session`] -- The per-room actor and its [`RoomHandle`].
//! - [`registry`] -- Room lookup, lazy opening and message routing.
//! - [`repository`] -- [`RoomRepository`] persistence seam and an in-memory
//!   implementation.
//! - [`timer`] -- Cancellable timer slots.
//! - [`transport`] -- Outbound connection queues.
//! - [`error`] -- [`EngineError`] and its wire codes.
//!
//! [`RoomHandle`]: session::RoomHandle
//! [`RoomRepository`]: repository::RoomRepository
//! [`EngineError`]: error::EngineError

pub mod config;
pub mod coordinator;
pub mod error;
pub mod registry;
pub mod repository;
pub mod seating;
pub mod session;
pub mod timer;
pub mod transition;
pub mod transport;

pub use config::LudoConfig;
pub use error::EngineError;
pub use registry::RoomRegistry;
pub use repository::{InMemoryRepository, RepositoryError, RoomRepository};
pub use session::RoomHandle;
pub use transition::{Directive, Transition};
pub use transport::{ConnectionHandle, EventReceiver};
