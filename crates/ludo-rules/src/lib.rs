//! Game rules for Ludo Arena.
//!
//! Everything here is synchronous and free of I/O. Randomness is injected
//! as an [`rand::Rng`] so callers control seeding.
//!
//! # Modules
//!
//! - [`movement`] -- Move computation and legality queries.
//! - [`arrival`] -- Capture, power-up pickup, traps, and lap bonus on arrival.
//! - [`power_ups`] -- Spawning and spending held teleport/swap charges.
//! - [`resolve`] -- Applying an accepted move to the room.
//! - [`error`] -- Error types for illegal moves and power-up use.

pub mod arrival;
pub mod error;
pub mod movement;
pub mod power_ups;
pub mod resolve;

pub use arrival::{Arrival, ArrivalEffects, apply_arrival_effects, award_points};
pub use error::{IllegalMove, PowerUpError};
pub use movement::{
    DICE_MAX, EXIT_ROLL, MovePlan, apply_plan, compute_move, has_legal_move, movable_tokens,
};
pub use power_ups::{SHIELD_TURNS, spawn_initial_power_ups, spawn_power_up, use_power_up};
pub use resolve::execute_plan;
