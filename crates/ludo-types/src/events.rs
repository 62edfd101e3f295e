//! Outbound notifications pushed to room participants.
//!
//! Every variant except [`ServerEvent::Error`] and [`ServerEvent::Welcome`]
//! is broadcast to the whole room. A command's events are emitted only after
//! all of its effects have been applied, followed by one
//! [`ServerEvent::StateSnapshot`] carrying the resulting room.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::actions::{MoveOutcome, PowerUpTarget};
use crate::enums::{Color, ErrorCode, PowerUpKind, RuleKey, SkipReason};
use crate::ids::{PlayerId, RoomId, TokenId};
use crate::structs::{PowerUp, Room, RuleSet};

/// One line of the end-of-game scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FinalScore {
    /// The player.
    pub player_id: PlayerId,
    /// Display name.
    pub name: String,
    /// Seat color.
    pub color: Color,
    /// Points at game end.
    pub points: i32,
    /// Opponent tokens captured.
    pub kills: u32,
    /// Tokens that completed their lane.
    pub finished_tokens: u32,
}

/// A notification from the room to its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ServerEvent {
    /// Unicast to a joining connection: the seat it now acts for.
    Welcome {
        /// The room joined.
        room_id: RoomId,
        /// The seat bound to the connection.
        player_id: PlayerId,
    },
    /// Full, consistent room state.
    StateSnapshot(Box<Room>),
    /// A new seat was taken.
    PlayerJoined {
        /// The new player.
        player_id: PlayerId,
        /// Display name.
        name: String,
        /// Assigned color.
        color: Color,
    },
    /// A seat was given up.
    PlayerLeft {
        /// The departing player.
        player_id: PlayerId,
    },
    /// A known player rebound their seat to a new connection.
    PlayerReconnected {
        /// The returning player.
        player_id: PlayerId,
    },
    /// A seat lost its connection and is held for the grace period.
    PlayerDisconnected {
        /// The disconnected player.
        player_id: PlayerId,
    },
    /// The current player rolled.
    DiceRolled {
        /// The roller.
        player_id: PlayerId,
        /// Rolled value (1-6).
        value: u8,
        /// Tokens with a legal move for this value.
        movable_tokens: Vec<TokenId>,
    },
    /// A token moved.
    TokenMoved(MoveOutcome),
    /// A turn passed without a move.
    TurnSkipped {
        /// Whose turn was skipped.
        player_id: PlayerId,
        /// Why.
        reason: SkipReason,
    },
    /// A power-up appeared on the track.
    PowerUpSpawned(PowerUp),
    /// A held charge was spent.
    PowerUpUsed {
        /// The user.
        player_id: PlayerId,
        /// The charge spent.
        kind: PowerUpKind,
        /// What it was applied to.
        target: PowerUpTarget,
    },
    /// The lobby closed and the first turn began.
    GameStarted {
        /// Rules resolved from the votes.
        rules: RuleSet,
        /// Who rolls first.
        first_player_id: PlayerId,
    },
    /// A winner was decided.
    GameEnded {
        /// The winner.
        winner_id: PlayerId,
        /// Scoreboard in seat order.
        final_scores: Vec<FinalScore>,
    },
    /// A lobby vote was cast.
    RuleVotesUpdated {
        /// The voter.
        player_id: PlayerId,
        /// The rule voted on.
        rule: RuleKey,
        /// The vote.
        enabled: bool,
    },
    /// Turn clock countdown.
    TurnClock {
        /// Whose clock.
        player_id: PlayerId,
        /// Seconds left.
        seconds_remaining: u32,
    },
    /// The kill-zone window opened or closed.
    KillZoneToggled {
        /// Whether the window is now open.
        active: bool,
    },
    /// Unicast to the sender of a rejected action.
    Error {
        /// Machine-readable reason.
        code: ErrorCode,
        /// Human-readable description.
        message: String,
    },
}

impl ServerEvent {
    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::StateSnapshot(_) => "state_snapshot",
            Self::PlayerJoined { .. } => "player_joined",
            Self::PlayerLeft { .. } => "player_left",
            Self::PlayerReconnected { .. } => "player_reconnected",
            Self::PlayerDisconnected { .. } => "player_disconnected",
            Self::DiceRolled { .. } => "dice_rolled",
            Self::TokenMoved(_) => "token_moved",
            Self::TurnSkipped { .. } => "turn_skipped",
            Self::PowerUpSpawned(_) => "power_up_spawned",
            Self::PowerUpUsed { .. } => "power_up_used",
            Self::GameStarted { .. } => "game_started",
            Self::GameEnded { .. } => "game_ended",
            Self::RuleVotesUpdated { .. } => "rule_votes_updated",
            Self::TurnClock { .. } => "turn_clock",
            Self::KillZoneToggled { .. } => "kill_zone_toggled",
            Self::Error { .. } => "error",
        }
    }
}
