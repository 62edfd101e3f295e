//! Lobby and seat management: joining, readiness, rule votes, disconnects
//! and leaving.
//!
//! Like the coordinator, these functions are synchronous and validate
//! before mutating.

use ludo_types::{Color, MAX_PLAYERS, MIN_PLAYERS, Player, PlayerId, Room, RuleKey, ServerEvent};
use rand::Rng;

use crate::config::LudoConfig;
use crate::coordinator::{end_game, skip_turn, start_game, turn_timer_directive};
use crate::error::EngineError;
use crate::transition::Transition;

/// Longest accepted display name, in characters.
pub const MAX_NAME_LEN: usize = 24;

/// Result of a join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResult {
    /// The seat the connection is now bound to.
    pub player_id: PlayerId,
    /// Whether an existing seat was reclaimed.
    pub reconnected: bool,
    /// Events and timers produced by the join.
    pub transition: Transition,
}

fn validate_name(name: &str) -> Result<&str, EngineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::validation("player name must not be empty"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(EngineError::validation(format!(
            "player name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Seat a new player, or reconnect a known one.
///
/// A request naming a disconnected seat by id and display name reclaims it,
/// before or after the game started. A seat that is still connected cannot
/// be claimed. Everyone else gets the first free color while the lobby is
/// open.
pub fn join_player(
    room: &mut Room,
    name: &str,
    requested_id: Option<PlayerId>,
    config: &LudoConfig,
) -> Result<JoinResult, EngineError> {
    let name = validate_name(name)?;

    if let Some(player_id) = requested_id
        && let Some(existing) = room.player(player_id)
    {
        if existing.name != name {
            return Err(EngineError::validation("name does not match the seat"));
        }
        if existing.left {
            return Err(EngineError::validation("player has left this room"));
        }
        if existing.connected {
            return Err(EngineError::SessionMismatch);
        }
        return Ok(reconnect(room, player_id, config));
    }

    if room.is_started() {
        return Err(EngineError::AlreadyStarted);
    }
    if room.players.len() >= MAX_PLAYERS {
        return Err(EngineError::RoomFull);
    }
    if room.players.iter().any(|p| p.name == name) {
        return Err(EngineError::validation(format!("name {name} is taken")));
    }
    let color = Color::ALL
        .into_iter()
        .find(|c| room.players.iter().all(|p| p.color != *c))
        .ok_or(EngineError::ColorsExhausted)?;

    let player = Player::new(name, color);
    let player_id = player.id;
    room.players.push(player);

    let mut transition = Transition::new();
    transition.emit(ServerEvent::PlayerJoined {
        player_id,
        name: name.to_owned(),
        color,
    });
    tracing::info!(room_id = %room.id, player_id = %player_id, ?color, "player joined");
    Ok(JoinResult {
        player_id,
        reconnected: false,
        transition,
    })
}

fn reconnect(room: &mut Room, player_id: PlayerId, config: &LudoConfig) -> JoinResult {
    if let Some(player) = room.player_mut(player_id) {
        player.connected = true;
    }
    let mut transition = Transition::new();
    transition.emit(ServerEvent::PlayerReconnected { player_id });
    if room.current_player_id() == Some(player_id)
        && let Some(directive) = turn_timer_directive(room, config)
    {
        transition.direct(directive);
    }
    tracing::info!(room_id = %room.id, player_id = %player_id, "player reconnected");
    JoinResult {
        player_id,
        reconnected: true,
        transition,
    }
}

/// Whether the lobby can start: enough seats and everyone ready.
fn lobby_complete(room: &Room) -> bool {
    !room.is_started()
        && room.players.len() >= MIN_PLAYERS
        && room.players.iter().all(|p| p.ready)
}

/// Toggle a player's readiness. The game starts once every seat is ready.
pub fn set_ready(
    room: &mut Room,
    player_id: PlayerId,
    ready: bool,
    config: &LudoConfig,
    rng: &mut impl Rng,
) -> Result<Transition, EngineError> {
    if room.is_started() {
        return Err(EngineError::AlreadyStarted);
    }
    let player = room
        .player_mut(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?;
    player.ready = ready;

    if lobby_complete(room) {
        start_game(room, config, rng)
    } else {
        Ok(Transition::new())
    }
}

/// Record a lobby vote on a rule toggle.
pub fn vote_rule(
    room: &mut Room,
    player_id: PlayerId,
    rule: RuleKey,
    enabled: bool,
) -> Result<Transition, EngineError> {
    if room.is_started() {
        return Err(EngineError::AlreadyStarted);
    }
    let player = room
        .player_mut(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?;
    player.rule_votes.insert(rule, enabled);

    let mut transition = Transition::new();
    transition.emit(ServerEvent::RuleVotesUpdated {
        player_id,
        rule,
        enabled,
    });
    Ok(transition)
}

/// Mark a seat as disconnected. The seat is kept for reconnection.
pub fn disconnect(
    room: &mut Room,
    player_id: PlayerId,
    config: &LudoConfig,
) -> Result<Transition, EngineError> {
    let player = room
        .player_mut(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?;
    if !player.connected {
        return Ok(Transition::new());
    }
    player.connected = false;

    let mut transition = Transition::new();
    transition.emit(ServerEvent::PlayerDisconnected { player_id });
    if room.current_player_id() == Some(player_id)
        && let Some(directive) = turn_timer_directive(room, config)
    {
        transition.direct(directive);
    }
    tracing::info!(room_id = %room.id, player_id = %player_id, "player disconnected");
    Ok(transition)
}

/// Give up a seat.
///
/// In the lobby the seat is removed outright. During a game it is kept but
/// marked as left so the scoreboard stays intact; when fewer than two
/// players remain the last one wins.
pub fn leave(
    room: &mut Room,
    player_id: PlayerId,
    config: &LudoConfig,
    rng: &mut impl Rng,
) -> Result<Transition, EngineError> {
    let seat = room
        .player_index(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?;
    let mut transition = Transition::new();

    if !room.is_started() {
        room.players.remove(seat);
        if room.current_player_index >= room.players.len() {
            room.current_player_index = 0;
        }
        transition.emit(ServerEvent::PlayerLeft { player_id });
        tracing::info!(room_id = %room.id, player_id = %player_id, "player left lobby");
        if lobby_complete(room) {
            transition.merge(start_game(room, config, rng)?);
        }
        return Ok(transition);
    }

    let was_current = room.current_player_id() == Some(player_id);
    if let Some(player) = room.players.get_mut(seat) {
        if player.left {
            return Ok(transition);
        }
        player.left = true;
        player.connected = false;
    }
    transition.emit(ServerEvent::PlayerLeft { player_id });
    tracing::info!(room_id = %room.id, player_id = %player_id, "player left game");

    if room.is_ended() {
        return Ok(transition);
    }
    let remaining: Vec<PlayerId> = room
        .players
        .iter()
        .filter(|p| p.is_active())
        .map(|p| p.id)
        .collect();
    if remaining.len() < MIN_PLAYERS {
        if let Some(&winner_id) = remaining.first() {
            transition.merge(end_game(room, winner_id));
        }
    } else if was_current {
        transition.merge(skip_turn(room, ludo_types::SkipReason::Left, config)?);
    }
    Ok(transition)
}

/// Whether nobody is left to play in the room.
pub fn is_abandoned(room: &Room) -> bool {
    room.players.iter().all(|p| p.left)
}
