//! Core entity structs: tokens, players, power-ups, rules and the room.
//!
//! These are plain value types. The room exclusively owns its players and
//! power-ups and each player owns exactly four tokens; nothing is shared by
//! reference between rooms. Game rules that depend on board geometry live in
//! `ludo-rules`, not here.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::actions::MoveOutcome;
use crate::enums::{Color, PowerUpKind, RuleKey, TurnPhase};
use crate::ids::{PlayerId, PowerUpId, RoomId, TokenId};

/// Position value of a token that has not yet entered the track.
pub const HOME_POSITION: i32 = -1;

/// Number of tokens each player owns.
pub const TOKENS_PER_PLAYER: u8 = 4;

/// Minimum number of seated players required to start a game.
pub const MIN_PLAYERS: usize = 2;

/// Maximum number of seated players in a room.
pub const MAX_PLAYERS: usize = 4;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A status effect that lasts a number of its owner's completed turns.
///
/// `applied_on_turn` records the room turn counter at the time the effect
/// was applied; the end-of-turn tick ignores effects applied during the turn
/// that is ending, so the duration always counts whole subsequent turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimedEffect {
    /// Whether the effect is currently in force.
    pub active: bool,
    /// Owner turns remaining before the effect lapses.
    pub turns_left: u32,
    /// Room turn counter when the effect was applied.
    pub applied_on_turn: u32,
}

impl TimedEffect {
    /// An effect that is not in force.
    pub const INACTIVE: Self = Self {
        active: false,
        turns_left: 0,
        applied_on_turn: 0,
    };

    /// Put the effect in force for `turns` owner turns starting after
    /// `current_turn`.
    pub const fn activate(&mut self, turns: u32, current_turn: u32) {
        self.active = turns > 0;
        self.turns_left = turns;
        self.applied_on_turn = current_turn;
    }

    /// Count down one completed owner turn. `ending_turn` is the room turn
    /// counter of the turn that is ending.
    pub const fn tick(&mut self, ending_turn: u32) {
        if !self.active || self.applied_on_turn >= ending_turn {
            return;
        }
        self.turns_left = self.turns_left.saturating_sub(1);
        if self.turns_left == 0 {
            self.active = false;
        }
    }
}

/// One of a player's four pieces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Token {
    /// Unique token identifier.
    pub id: TokenId,
    /// The owning player.
    pub owner_id: PlayerId,
    /// Color of the owner; immutable.
    pub color: Color,
    /// Index of the token within its owner's set (0-3).
    pub index: u8,
    /// `-1` at home, `0..52` on the shared track, `52..=57` in the home-run
    /// lane.
    pub position: i32,
    /// Whether the token has left the shared track for its home-run lane.
    pub in_home_run: bool,
    /// Whether the token reached the end of its lane.
    pub finished: bool,
    /// Capture immunity.
    pub shield: TimedEffect,
    /// Cannot be selected as a move source while active.
    pub frozen: TimedEffect,
    /// The next move of this token covers twice the rolled distance.
    pub speed_boost_pending: bool,
}

impl Token {
    /// Create a token sitting at home.
    pub const fn new(owner_id: PlayerId, color: Color, index: u8, id: TokenId) -> Self {
        Self {
            id,
            owner_id,
            color,
            index,
            position: HOME_POSITION,
            in_home_run: false,
            finished: false,
            shield: TimedEffect::INACTIVE,
            frozen: TimedEffect::INACTIVE,
            speed_boost_pending: false,
        }
    }

    /// Whether the token has not entered the track yet.
    pub const fn is_at_home(&self) -> bool {
        self.position == HOME_POSITION
    }

    /// Whether the token is on the board and still in play.
    pub const fn is_in_play(&self) -> bool {
        !self.finished && self.position != HOME_POSITION
    }

    /// Return the token to its home area and clear every effect.
    pub const fn send_home(&mut self) {
        self.position = HOME_POSITION;
        self.in_home_run = false;
        self.finished = false;
        self.shield = TimedEffect::INACTIVE;
        self.frozen = TimedEffect::INACTIVE;
        self.speed_boost_pending = false;
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A seated player and everything they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique player identifier.
    pub id: PlayerId,
    /// Display name, unique within the room.
    pub name: String,
    /// Seat color, unique within the room.
    pub color: Color,
    /// The player's four tokens.
    pub tokens: Vec<Token>,
    /// Opponent tokens captured so far.
    pub kills: u32,
    /// Score under the points system; may go negative.
    pub points: i32,
    /// Ready flag set in the lobby.
    pub ready: bool,
    /// Seconds left on the current turn clock.
    pub turn_time_remaining: u32,
    /// Whether a live connection is bound to the seat.
    pub connected: bool,
    /// Whether the player abandoned the game after it started.
    pub left: bool,
    /// Collected teleport/swap charges awaiting use.
    pub held_power_ups: Vec<PowerUpKind>,
    /// Lobby votes on rule toggles.
    pub rule_votes: BTreeMap<RuleKey, bool>,
}

impl Player {
    /// Create a connected player with four fresh tokens at home.
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        let id = PlayerId::new();
        let tokens = (0..TOKENS_PER_PLAYER)
            .map(|index| Token::new(id, color, index, TokenId::new()))
            .collect();
        Self {
            id,
            name: name.into(),
            color,
            tokens,
            kills: 0,
            points: 0,
            ready: false,
            turn_time_remaining: 0,
            connected: true,
            left: false,
            held_power_ups: Vec::new(),
            rule_votes: BTreeMap::new(),
        }
    }

    /// Whether every token reached the end of its lane.
    pub fn all_finished(&self) -> bool {
        self.tokens.iter().all(|t| t.finished)
    }

    /// Number of finished tokens.
    pub fn finished_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.finished).count()
    }

    /// Whether the player still takes turns.
    pub const fn is_active(&self) -> bool {
        !self.left
    }

    /// Borrow one of the player's tokens.
    pub fn token(&self, token_id: TokenId) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == token_id)
    }

    /// Mutably borrow one of the player's tokens.
    pub fn token_mut(&mut self, token_id: TokenId) -> Option<&mut Token> {
        self.tokens.iter_mut().find(|t| t.id == token_id)
    }
}

// ---------------------------------------------------------------------------
// Power-up
// ---------------------------------------------------------------------------

/// A power-up lying on a track cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PowerUp {
    /// Unique power-up identifier.
    pub id: PowerUpId,
    /// What the power-up does.
    pub kind: PowerUpKind,
    /// Track index the power-up occupies.
    pub track_position: i32,
    /// Cleared exactly once, by the token that collects it.
    pub active: bool,
}

impl PowerUp {
    /// Create an active power-up at a track cell.
    pub fn new(kind: PowerUpKind, track_position: i32) -> Self {
        Self {
            id: PowerUpId::new(),
            kind,
            track_position,
            active: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Rule toggles fixed at game start.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RuleSet {
    /// Per-turn countdown with auto-skip on expiry.
    pub timed_moves: bool,
    /// Length of the turn clock in seconds.
    pub move_time_limit_seconds: u32,
    /// Power-ups spawn on the track.
    pub power_ups_enabled: bool,
    /// Trap cells are live.
    pub trap_zones_enabled: bool,
    /// Attacking a player with fewer kills sends the attacker home.
    pub reverse_kill_enabled: bool,
    /// Kills, finishes and laps score points.
    pub points_system_enabled: bool,
    /// Periodic window widening capture eligibility.
    pub kill_zone_enabled: bool,
    /// Turns between kill-zone window toggles.
    pub kill_zone_interval: u32,
    /// A capture grants another roll.
    pub bonus_roll_on_capture: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            timed_moves: true,
            move_time_limit_seconds: 15,
            power_ups_enabled: true,
            trap_zones_enabled: true,
            reverse_kill_enabled: false,
            points_system_enabled: true,
            kill_zone_enabled: false,
            kill_zone_interval: 15,
            bonus_roll_on_capture: false,
        }
    }
}

impl RuleSet {
    /// Read a boolean toggle.
    pub const fn is_enabled(&self, rule: RuleKey) -> bool {
        match rule {
            RuleKey::TimedMoves => self.timed_moves,
            RuleKey::PowerUps => self.power_ups_enabled,
            RuleKey::TrapZones => self.trap_zones_enabled,
            RuleKey::ReverseKill => self.reverse_kill_enabled,
            RuleKey::PointsSystem => self.points_system_enabled,
            RuleKey::KillZone => self.kill_zone_enabled,
            RuleKey::BonusRollOnCapture => self.bonus_roll_on_capture,
        }
    }

    /// Write a boolean toggle.
    pub const fn set(&mut self, rule: RuleKey, enabled: bool) {
        match rule {
            RuleKey::TimedMoves => self.timed_moves = enabled,
            RuleKey::PowerUps => self.power_ups_enabled = enabled,
            RuleKey::TrapZones => self.trap_zones_enabled = enabled,
            RuleKey::ReverseKill => self.reverse_kill_enabled = enabled,
            RuleKey::PointsSystem => self.points_system_enabled = enabled,
            RuleKey::KillZone => self.kill_zone_enabled = enabled,
            RuleKey::BonusRollOnCapture => self.bonus_roll_on_capture = enabled,
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// Authoritative state of one room. This is also the snapshot broadcast to
/// every participant and the document handed to the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Room {
    /// Room code.
    pub id: RoomId,
    /// Seats in turn order.
    pub players: Vec<Player>,
    /// Index into `players` of the player who owns the turn.
    pub current_player_index: usize,
    /// Rolled value, present only between a roll and the following move or
    /// skip.
    pub dice_value: Option<u8>,
    /// Turn state machine phase.
    pub phase: TurnPhase,
    /// Winner, once the game has ended.
    pub winner_id: Option<PlayerId>,
    /// Completed turns since the game started.
    pub turn_count: u32,
    /// Power-ups currently on the track.
    pub power_ups: Vec<PowerUp>,
    /// Rules in force (votes resolve into this at game start).
    pub rules: RuleSet,
    /// Whether the kill-zone window is currently open.
    pub kill_zone_active: bool,
    /// The most recent successful move.
    pub last_move: Option<MoveOutcome>,
    /// When the room was opened.
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Open an empty room in the lobby phase.
    pub fn new(id: RoomId, rules: RuleSet) -> Self {
        Self {
            id,
            players: Vec::new(),
            current_player_index: 0,
            dice_value: None,
            phase: TurnPhase::WaitingForPlayers,
            winner_id: None,
            turn_count: 0,
            power_ups: Vec::new(),
            rules,
            kill_zone_active: false,
            last_move: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the game has left the lobby.
    pub fn is_started(&self) -> bool {
        self.phase != TurnPhase::WaitingForPlayers
    }

    /// Whether the game reached its terminal state.
    pub fn is_ended(&self) -> bool {
        self.phase == TurnPhase::Ended
    }

    /// Whether the current player is expected to roll.
    pub fn roll_pending(&self) -> bool {
        self.phase == TurnPhase::RollPending
    }

    /// The player who owns the turn.
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    /// Mutable access to the player who owns the turn.
    pub fn current_player_mut(&mut self) -> Option<&mut Player> {
        self.players.get_mut(self.current_player_index)
    }

    /// Id of the player who owns the turn.
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.current_player().map(|p| p.id)
    }

    /// Seat index of a player.
    pub fn player_index(&self, player_id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    /// Borrow a player by id.
    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Mutably borrow a player by id.
    pub fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    /// Seat and token indices of a token.
    pub fn locate_token(&self, token_id: TokenId) -> Option<(usize, usize)> {
        self.players.iter().enumerate().find_map(|(pi, p)| {
            p.tokens
                .iter()
                .position(|t| t.id == token_id)
                .map(|ti| (pi, ti))
        })
    }

    /// Borrow any token in the room.
    pub fn token(&self, token_id: TokenId) -> Option<&Token> {
        self.players.iter().find_map(|p| p.token(token_id))
    }

    /// Mutably borrow any token in the room.
    pub fn token_mut(&mut self, token_id: TokenId) -> Option<&mut Token> {
        self.players.iter_mut().find_map(|p| p.token_mut(token_id))
    }

    /// Iterate over every token in the room.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.players.iter().flat_map(|p| p.tokens.iter())
    }

    /// Number of players who have not abandoned the game.
    pub fn active_player_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    /// Index of the active power-up on a track cell, if any.
    pub fn active_power_up_at(&self, track_position: i32) -> Option<usize> {
        self.power_ups
            .iter()
            .position(|p| p.active && p.track_position == track_position)
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn new_player_has_four_tokens_at_home() {
        let player = Player::new("Ada", Color::Green);
        assert_eq!(player.tokens.len(), usize::from(TOKENS_PER_PLAYER));
        for (i, token) in player.tokens.iter().enumerate() {
            assert!(token.is_at_home());
            assert_eq!(token.owner_id, player.id);
            assert_eq!(token.color, Color::Green);
            assert_eq!(usize::from(token.index), i);
        }
        assert!(!player.all_finished());
    }

    #[test]
    fn timed_effect_skips_the_turn_it_was_applied() {
        let mut shield = TimedEffect::INACTIVE;
        shield.activate(2, 7);
        shield.tick(7);
        assert!(shield.active);
        assert_eq!(shield.turns_left, 2);
        shield.tick(8);
        assert_eq!(shield.turns_left, 1);
        shield.tick(9);
        assert!(!shield.active);
        assert_eq!(shield.turns_left, 0);
    }

    #[test]
    fn send_home_clears_effects() {
        let player = Player::new("Bo", Color::Red);
        let mut token = player.tokens[0].clone();
        token.position = 12;
        token.shield.activate(2, 0);
        token.speed_boost_pending = true;
        token.send_home();
        assert!(token.is_at_home());
        assert!(!token.shield.active);
        assert!(!token.speed_boost_pending);
    }

    #[test]
    fn rule_toggles_round_trip_through_keys() {
        let mut rules = RuleSet::default();
        for key in RuleKey::ALL {
            rules.set(key, true);
            assert!(rules.is_enabled(key));
            rules.set(key, false);
            assert!(!rules.is_enabled(key));
        }
    }

    #[test]
    fn room_locates_tokens_across_players() {
        let mut room = Room::new(RoomId::from("R1"), RuleSet::default());
        room.players.push(Player::new("A", Color::Red));
        room.players.push(Player::new("B", Color::Green));
        let target = room.players[1].tokens[2].id;
        assert_eq!(room.locate_token(target), Some((1, 2)));
        assert_eq!(room.token(target).map(|t| t.color), Some(Color::Green));
        assert_eq!(room.tokens().count(), 8);
        assert!(!room.is_started());
    }
}
