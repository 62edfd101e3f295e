//! Error types for the ludo-core crate.
//!
//! Every rejected command surfaces as an [`EngineError`]. The room actor
//! turns it into a unicast [`ServerEvent::Error`] for the sender and returns
//! it to the caller; the room state is untouched.
//!
//! [`ServerEvent::Error`]: ludo_types::ServerEvent::Error

use ludo_rules::{IllegalMove, PowerUpError};
use ludo_types::{ErrorCode, PlayerId, RoomId, TokenId, TurnPhase};

/// Errors produced while handling a room command.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Malformed or out-of-range input.
    #[error("invalid request: {reason}")]
    Validation {
        /// What was wrong.
        reason: String,
    },

    /// Another player owns the turn.
    #[error("it is not {player_id}'s turn")]
    NotYourTurn {
        /// The player who tried to act.
        player_id: PlayerId,
    },

    /// The room's phase does not accept the action.
    #[error("cannot {action} during {phase:?}")]
    InvalidPhase {
        /// The current phase.
        phase: TurnPhase,
        /// The rejected action.
        action: &'static str,
    },

    /// The dice were already rolled this turn.
    #[error("dice already rolled this turn")]
    AlreadyRolled,

    /// The sending connection is not bound to the claimed seat.
    #[error("connection is not bound to this seat")]
    SessionMismatch,

    /// The move breaks a game rule.
    #[error("illegal move: {source}")]
    IllegalMove {
        /// The violated rule.
        #[from]
        source: IllegalMove,
    },

    /// A held power-up could not be applied.
    #[error("power-up rejected: {source}")]
    PowerUp {
        /// Why the power-up was rejected.
        #[from]
        source: PowerUpError,
    },

    /// The token belongs to another player.
    #[error("token {token_id} is not yours")]
    NotYourToken {
        /// The token named in the request.
        token_id: TokenId,
    },

    /// The room already seats four players.
    #[error("room is full")]
    RoomFull,

    /// No unused color remains.
    #[error("no colors left")]
    ColorsExhausted,

    /// The game has started and the joiner is not a known player.
    #[error("game already started")]
    AlreadyStarted,

    /// The room does not exist.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The player is not seated in the room.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The token does not exist in the room.
    #[error("token not found: {0}")]
    TokenNotFound(TokenId),

    /// The room actor stopped before answering.
    #[error("room {0} is closed")]
    RoomClosed(RoomId),
}

impl EngineError {
    /// Shorthand for a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// The wire code sent to clients.
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } | Self::NotYourToken { .. } => ErrorCode::Validation,
            Self::NotYourTurn { .. } => ErrorCode::NotYourTurn,
            Self::InvalidPhase { .. } => ErrorCode::InvalidPhase,
            Self::AlreadyRolled => ErrorCode::AlreadyRolled,
            Self::SessionMismatch => ErrorCode::SessionMismatch,
            Self::IllegalMove { .. } => ErrorCode::IllegalMove,
            Self::PowerUp { source } => match source {
                PowerUpError::NotHeld { .. } => ErrorCode::Validation,
                PowerUpError::PlayerNotFound(_) => ErrorCode::PlayerNotFound,
                PowerUpError::TokenNotFound(_) => ErrorCode::TokenNotFound,
                PowerUpError::NotOwnToken(_)
                | PowerUpError::TokenNotOnTrack(_)
                | PowerUpError::TokenFrozen(_)
                | PowerUpError::InvalidTarget { .. }
                | PowerUpError::CellOccupied { .. }
                | PowerUpError::BeyondHomeRunEntry { .. }
                | PowerUpError::TargetNotOpponent(_) => ErrorCode::IllegalMove,
            },
            Self::RoomFull => ErrorCode::RoomFull,
            Self::ColorsExhausted => ErrorCode::ColorsExhausted,
            Self::AlreadyStarted => ErrorCode::AlreadyStarted,
            Self::RoomNotFound(_) | Self::RoomClosed(_) => ErrorCode::RoomNotFound,
            Self::PlayerNotFound(_) => ErrorCode::PlayerNotFound,
            Self::TokenNotFound(_) => ErrorCode::TokenNotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use ludo_types::{ErrorCategory, PowerUpKind};

    use super::*;

    #[test]
    fn codes_follow_taxonomy() {
        let err = EngineError::NotYourTurn {
            player_id: PlayerId::new(),
        };
        assert_eq!(err.code().category(), ErrorCategory::TurnViolation);

        let err = EngineError::from(IllegalMove::NeedSixToExit { dice: 3 });
        assert_eq!(err.code(), ErrorCode::IllegalMove);

        let err = EngineError::from(PowerUpError::NotHeld {
            kind: PowerUpKind::Swap,
        });
        assert_eq!(err.code(), ErrorCode::Validation);

        assert_eq!(
            EngineError::RoomClosed(RoomId::from("x")).code(),
            ErrorCode::RoomNotFound
        );
        assert_eq!(EngineError::RoomFull.code().category(), ErrorCategory::Capacity);
    }
}
