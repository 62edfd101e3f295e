//! Shared type definitions for Ludo Arena.
//!
//! This crate is the single source of truth for the values exchanged between
//! the rules engine, the room actors, the repository, and connected clients.
//! Types flow downstream to `TypeScript` via `ts-rs` for the browser client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers for players, tokens, power-ups, rooms
//! - [`enums`] -- Colors, power-up kinds, turn phases, rule keys, error codes
//! - [`structs`] -- Tokens, players, power-ups, rule sets, and the room
//! - [`actions`] -- Inbound client actions and move outcomes
//! - [`events`] -- Outbound notifications

pub mod actions;
pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{ClientAction, ClientMessage, MoveOutcome, PowerUpTarget, TrapOutcome};
pub use enums::{Color, ErrorCategory, ErrorCode, PowerUpKind, RuleKey, SkipReason, TurnPhase};
pub use events::{FinalScore, ServerEvent};
pub use ids::{ConnectionId, PlayerId, PowerUpId, RoomId, TokenId};
pub use structs::{
    HOME_POSITION, MAX_PLAYERS, MIN_PLAYERS, Player, PowerUp, Room, RuleSet, TOKENS_PER_PLAYER,
    TimedEffect, Token,
};

#[cfg(test)]
mod tests {
    //! Binding generation for the browser client.

    #[test]
    fn export_bindings() {
        // Calling export_all writes every #[ts(export)] type and its
        // dependencies into `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::PlayerId::export_all();
        let _ = crate::ids::TokenId::export_all();
        let _ = crate::ids::PowerUpId::export_all();
        let _ = crate::ids::ConnectionId::export_all();
        let _ = crate::ids::RoomId::export_all();

        // Enums
        let _ = crate::enums::Color::export_all();
        let _ = crate::enums::PowerUpKind::export_all();
        let _ = crate::enums::TurnPhase::export_all();
        let _ = crate::enums::SkipReason::export_all();
        let _ = crate::enums::RuleKey::export_all();
        let _ = crate::enums::ErrorCategory::export_all();
        let _ = crate::enums::ErrorCode::export_all();

        // Structs
        let _ = crate::structs::TimedEffect::export_all();
        let _ = crate::structs::Token::export_all();
        let _ = crate::structs::Player::export_all();
        let _ = crate::structs::PowerUp::export_all();
        let _ = crate::structs::RuleSet::export_all();
        let _ = crate::structs::Room::export_all();

        // Actions and events
        let _ = crate::actions::PowerUpTarget::export_all();
        let _ = crate::actions::ClientAction::export_all();
        let _ = crate::actions::ClientMessage::export_all();
        let _ = crate::actions::TrapOutcome::export_all();
        let _ = crate::actions::MoveOutcome::export_all();
        let _ = crate::events::FinalScore::export_all();
        let _ = crate::events::ServerEvent::export_all();
    }
}
