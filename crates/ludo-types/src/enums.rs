//! Enumeration types shared across the engine and its clients.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Seats
// ---------------------------------------------------------------------------

/// A player color. Each color owns one start cell and one home-run lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Color {
    /// First seat; starts at track index 0.
    Red,
    /// Second seat; starts a quarter of the way around the track.
    Green,
    /// Third seat; starts opposite Red.
    Yellow,
    /// Fourth seat; starts three quarters of the way around the track.
    Blue,
}

impl Color {
    /// All colors in seat-assignment order.
    pub const ALL: [Self; 4] = [Self::Red, Self::Green, Self::Yellow, Self::Blue];

    /// Zero-based seat index of the color.
    pub const fn seat_index(self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Yellow => 2,
            Self::Blue => 3,
        }
    }

    /// Lowercase display name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Blue => "blue",
        }
    }
}

// ---------------------------------------------------------------------------
// Power-ups
// ---------------------------------------------------------------------------

/// The kind of a power-up lying on the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PowerUpKind {
    /// Token cannot be captured for two of its owner's turns.
    Shield,
    /// The token's next move covers twice the rolled distance.
    SpeedBoost,
    /// Held charge: move one of your tokens to a chosen track cell.
    Teleport,
    /// Held charge: trade places with an opponent token on the track.
    Swap,
}

impl PowerUpKind {
    /// All power-up kinds, used for uniform random spawning.
    pub const ALL: [Self; 4] = [Self::Shield, Self::SpeedBoost, Self::Teleport, Self::Swap];

    /// Whether the power-up needs a follow-up targeting message instead of
    /// applying on pickup.
    pub const fn is_targeted(self) -> bool {
        matches!(self, Self::Teleport | Self::Swap)
    }
}

// ---------------------------------------------------------------------------
// Turn state machine
// ---------------------------------------------------------------------------

/// Phase of the room's turn state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TurnPhase {
    /// Lobby: joins, ready flags and rule votes are accepted.
    WaitingForPlayers,
    /// The current player must roll.
    RollPending,
    /// The current player must pick a token to move with the rolled value.
    MovePending,
    /// Terminal: a winner has been decided, nothing else is accepted.
    Ended,
}

/// Why a turn was passed without a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum SkipReason {
    /// The rolled value left no token with a legal move.
    NoLegalMoves,
    /// The turn clock ran out.
    Timeout,
    /// The player left the game while holding the turn.
    Left,
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// A votable rule toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum RuleKey {
    /// Per-turn countdown with auto-skip on expiry.
    TimedMoves,
    /// Power-ups spawn on the track.
    PowerUps,
    /// Trap cells step back or freeze arriving tokens.
    TrapZones,
    /// Attacks on players with fewer kills backfire.
    ReverseKill,
    /// Kills, finishes and laps score points.
    PointsSystem,
    /// Periodic window in which any token may be captured.
    KillZone,
    /// A capture earns another roll.
    BonusRollOnCapture,
}

impl RuleKey {
    /// All votable rules.
    pub const ALL: [Self; 7] = [
        Self::TimedMoves,
        Self::PowerUps,
        Self::TrapZones,
        Self::ReverseKill,
        Self::PointsSystem,
        Self::KillZone,
        Self::BonusRollOnCapture,
    ];
}

// ---------------------------------------------------------------------------
// Errors on the wire
// ---------------------------------------------------------------------------

/// Broad class of a rejected action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ErrorCategory {
    /// Malformed or out-of-range input.
    Validation,
    /// Wrong player or wrong phase.
    TurnViolation,
    /// The move breaks a game rule.
    IllegalMove,
    /// Room full or colors exhausted.
    Capacity,
    /// Room, player, or token does not exist.
    NotFound,
}

/// Machine-readable reason attached to an `Error` notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ErrorCode {
    /// Input failed validation.
    Validation,
    /// Another player owns the turn.
    NotYourTurn,
    /// The room is not in a phase that accepts this action.
    InvalidPhase,
    /// The dice were already rolled this turn.
    AlreadyRolled,
    /// The sending connection is not bound to the claimed seat.
    SessionMismatch,
    /// The requested move is not allowed.
    IllegalMove,
    /// The room already seats four players.
    RoomFull,
    /// No unused color remains.
    ColorsExhausted,
    /// The game has started; only known players may rejoin.
    AlreadyStarted,
    /// The room does not exist.
    RoomNotFound,
    /// The player does not exist in the room.
    PlayerNotFound,
    /// The token does not exist in the room.
    TokenNotFound,
}

impl ErrorCode {
    /// Map the code onto the error taxonomy.
    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::Validation => ErrorCategory::Validation,
            Self::NotYourTurn
            | Self::InvalidPhase
            | Self::AlreadyRolled
            | Self::SessionMismatch => ErrorCategory::TurnViolation,
            Self::IllegalMove => ErrorCategory::IllegalMove,
            Self::RoomFull | Self::ColorsExhausted | Self::AlreadyStarted => {
                ErrorCategory::Capacity
            }
            Self::RoomNotFound | Self::PlayerNotFound | Self::TokenNotFound => {
                ErrorCategory::NotFound
            }
        }
    }
}
