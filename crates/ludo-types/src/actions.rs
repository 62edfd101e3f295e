//! Inbound client actions and the results of resolving them.
//!
//! A client sends a [`ClientMessage`] naming the room, the seat it claims to
//! act for, and one [`ClientAction`]. Successful moves are summarised as a
//! [`MoveOutcome`], which is both broadcast and kept on the room as its last
//! move.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{PowerUpKind, RuleKey};
use crate::ids::{PlayerId, RoomId, TokenId};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Target of a held power-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PowerUpTarget {
    /// Move one of your tokens to a chosen shared-track cell.
    Teleport {
        /// Your token to relocate.
        token_id: TokenId,
        /// Destination track index.
        position: i32,
    },
    /// Trade positions between one of your tokens and an opponent token.
    Swap {
        /// Your token.
        token_id: TokenId,
        /// The opponent token.
        target_token_id: TokenId,
    },
}

impl PowerUpTarget {
    /// The held charge this target consumes.
    pub const fn kind(&self) -> PowerUpKind {
        match self {
            Self::Teleport { .. } => PowerUpKind::Teleport,
            Self::Swap { .. } => PowerUpKind::Swap,
        }
    }

    /// The acting player's own token.
    pub const fn token_id(&self) -> TokenId {
        match self {
            Self::Teleport { token_id, .. } | Self::Swap { token_id, .. } => *token_id,
        }
    }
}

/// An action a client asks the room to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ClientAction {
    /// Take a seat, or reclaim one by presenting a known player id.
    Join {
        /// Display name; must match the seat when reconnecting.
        player_name: String,
        /// Seat to reclaim.
        player_id: Option<PlayerId>,
    },
    /// Toggle the lobby ready flag.
    SetReady {
        /// New ready state.
        ready: bool,
    },
    /// Vote on a rule toggle before the game starts.
    VoteRule {
        /// The rule voted on.
        rule: RuleKey,
        /// Whether the voter wants it on.
        enabled: bool,
    },
    /// Roll the die.
    RollDice,
    /// Move one of your tokens by the rolled value.
    MoveToken {
        /// The token to move.
        token_id: TokenId,
    },
    /// Spend a held teleport or swap charge.
    UsePowerUp {
        /// What to apply it to.
        target: PowerUpTarget,
    },
    /// Give up the seat.
    Leave,
}

impl ClientAction {
    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::SetReady { .. } => "set_ready",
            Self::VoteRule { .. } => "vote_rule",
            Self::RollDice => "roll_dice",
            Self::MoveToken { .. } => "move_token",
            Self::UsePowerUp { .. } => "use_power_up",
            Self::Leave => "leave",
        }
    }
}

/// Envelope for every inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClientMessage {
    /// Target room.
    pub room_id: RoomId,
    /// Seat the sender claims; absent only on a first join.
    pub player_id: Option<PlayerId>,
    /// The requested action.
    pub action: ClientAction,
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What a trap cell did to the token that landed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TrapOutcome {
    /// The token was pushed back along the track.
    SteppedBack {
        /// Track index after stepping back.
        to: i32,
    },
    /// The token is frozen for its owner's next turn.
    Frozen,
}

/// Summary of a resolved token move, including every arrival effect.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MoveOutcome {
    /// The mover.
    pub player_id: PlayerId,
    /// The moved token.
    pub token_id: TokenId,
    /// Rolled value.
    pub dice: u8,
    /// Cells travelled (twice the dice under a speed boost).
    pub steps: u8,
    /// Position before the move.
    pub from: i32,
    /// Position the move landed on, before any trap push-back.
    pub landed: i32,
    /// Final position after arrival effects.
    pub to: i32,
    /// Tokens sent home by this move, in ascending id order.
    pub captured: Vec<TokenId>,
    /// The attack backfired and the moved token went home.
    pub reverse_killed: bool,
    /// Power-up collected on arrival.
    pub power_up: Option<PowerUpKind>,
    /// Trap effect on arrival.
    pub trap: Option<TrapOutcome>,
    /// Lap bonus awarded.
    pub round_bonus: bool,
    /// The token completed its lane.
    pub finished: bool,
    /// The mover keeps the turn.
    pub extra_turn: bool,
}
