//! Error types for the ludo-rules crate.
//!
//! Rule checks return typed errors rather than panicking. A rejected move or
//! power-up leaves the room untouched.

use ludo_types::{PlayerId, PowerUpKind, TokenId};

/// Why a token cannot move by the rolled value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMove {
    /// The token already completed its lane.
    #[error("token has already finished")]
    TokenFinished,

    /// The token is frozen by a trap.
    #[error("token is frozen")]
    TokenFrozen,

    /// The die value is outside 1-6.
    #[error("invalid dice value {dice}")]
    InvalidDice {
        /// The rejected value.
        dice: u8,
    },

    /// Leaving home requires an exact six.
    #[error("a six is required to leave home (rolled {dice})")]
    NeedSixToExit {
        /// The rolled value.
        dice: u8,
    },

    /// The move would pass the end of the home-run lane.
    #[error("move overshoots the finish (lane offset {offset})")]
    Overshoot {
        /// Lane offset the move would have reached.
        offset: i32,
    },

    /// The token holds a position outside every valid range.
    #[error("token has an invalid position {position}")]
    InvalidPosition {
        /// The stored position.
        position: i32,
    },
}

/// Why a held power-up could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PowerUpError {
    /// The player holds no charge of this kind.
    #[error("no {kind:?} charge held")]
    NotHeld {
        /// The requested kind.
        kind: PowerUpKind,
    },

    /// The acting player is not seated in the room.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The named token does not exist.
    #[error("token not found: {0}")]
    TokenNotFound(TokenId),

    /// The acting token belongs to someone else.
    #[error("token {0} is not yours")]
    NotOwnToken(TokenId),

    /// The token is not on the shared track.
    #[error("token {0} is not on the shared track")]
    TokenNotOnTrack(TokenId),

    /// The acting token is frozen.
    #[error("token {0} is frozen")]
    TokenFrozen(TokenId),

    /// The teleport destination is not a shared-track cell.
    #[error("position {position} is not on the shared track")]
    InvalidTarget {
        /// The requested destination.
        position: i32,
    },

    /// Another of the player's tokens occupies the destination.
    #[error("position {position} is occupied by your own token")]
    CellOccupied {
        /// The requested destination.
        position: i32,
    },

    /// The destination lies past the token's home-run entry.
    #[error("position {position} is beyond the home-run entry")]
    BeyondHomeRunEntry {
        /// The requested destination.
        position: i32,
    },

    /// The swap target is one of the player's own tokens.
    #[error("token {0} is not an opponent token")]
    TargetNotOpponent(TokenId),
}
