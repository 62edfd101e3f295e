//! The turn coordinator: the game's state machine.
//!
//! ```text
//! WaitingForPlayers -> RollPending -> MovePending -> RollPending | Ended
//! ```
//!
//! Every function validates before it mutates. A rejected request returns an
//! [`EngineError`] and leaves the room exactly as it was, so there is nothing
//! to broadcast. Accepted requests return a [`Transition`] listing the events
//! to broadcast and the timers the room actor must arm.
//!
//! All randomness goes through the caller's RNG. Two rooms driven by equally
//! seeded RNGs and the same command sequence produce the same dice, moves and
//! effects.

use ludo_rules::{
    ArrivalEffects, DICE_MAX, EXIT_ROLL, compute_move, execute_plan, movable_tokens,
    spawn_initial_power_ups, spawn_power_up,
};
use ludo_types::{
    FinalScore, MoveOutcome, Player, PlayerId, PowerUpTarget, Room, RuleKey, RuleSet, ServerEvent,
    SkipReason, TokenId, TurnPhase,
};
use rand::Rng;

use crate::config::{LudoConfig, RulesConfig};
use crate::error::EngineError;
use crate::transition::{Directive, Transition};

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Ensure the game is running and `player_id` owns the turn.
fn ensure_turn(room: &Room, player_id: PlayerId, action: &'static str) -> Result<(), EngineError> {
    if !room.is_started() || room.is_ended() {
        return Err(EngineError::InvalidPhase {
            phase: room.phase,
            action,
        });
    }
    if room.player(player_id).is_none() {
        return Err(EngineError::PlayerNotFound(player_id));
    }
    if room.current_player_id() != Some(player_id) {
        return Err(EngineError::NotYourTurn { player_id });
    }
    Ok(())
}

/// The directive that (re)arms the current player's turn timer.
///
/// A roll with no legal move keeps its pending auto-skip; anything else
/// restarts the countdown.
pub fn turn_timer_directive(room: &Room, config: &LudoConfig) -> Option<Directive> {
    if !room.is_started() || room.is_ended() {
        return None;
    }
    let player = room.current_player()?;
    let stuck = room.phase == TurnPhase::MovePending
        && room
            .dice_value
            .is_some_and(|dice| movable_tokens(player, dice).is_empty());
    Some(if stuck {
        Directive::ScheduleAutoSkip {
            player_id: player.id,
            delay_ms: config.timing.auto_skip_delay_ms,
        }
    } else {
        Directive::RestartTurnTimer {
            player_id: player.id,
        }
    })
}

/// Reset the current player's clock to the full limit.
fn reset_clock(room: &mut Room) {
    let limit = room.rules.move_time_limit_seconds;
    if let Some(player) = room.current_player_mut() {
        player.turn_time_remaining = limit;
    }
}

// ---------------------------------------------------------------------------
// Game start
// ---------------------------------------------------------------------------

/// Resolve the rule toggles from lobby votes.
///
/// An unvoted player counts as the configured default. A toggle is on when
/// at least half of the seated players want it.
pub fn resolve_rules(players: &[Player], defaults: &RulesConfig) -> RuleSet {
    let mut rules = defaults.rule_set();
    let seated = players.len();
    if seated == 0 {
        return rules;
    }
    for key in RuleKey::ALL {
        let default = defaults.default_for(key);
        let yes = players
            .iter()
            .filter(|p| p.rule_votes.get(&key).copied().unwrap_or(default))
            .count();
        rules.set(key, yes.saturating_mul(2) >= seated);
    }
    rules
}

/// Start the game: fix the rules, reset scores, place the initial power-ups
/// and hand the first turn to seat 0.
pub fn start_game(
    room: &mut Room,
    config: &LudoConfig,
    rng: &mut impl Rng,
) -> Result<Transition, EngineError> {
    if room.is_started() {
        return Err(EngineError::AlreadyStarted);
    }
    if room.players.len() < ludo_types::MIN_PLAYERS {
        return Err(EngineError::validation("at least two players are required"));
    }
    if !room.players.iter().all(|p| p.ready) {
        return Err(EngineError::validation("every player must be ready"));
    }

    room.rules = resolve_rules(&room.players, &config.rules);
    for player in &mut room.players {
        player.kills = 0;
        player.points = 0;
        player.held_power_ups.clear();
        player.turn_time_remaining = 0;
        for token in &mut player.tokens {
            token.send_home();
        }
    }
    room.power_ups.clear();
    room.current_player_index = 0;
    room.dice_value = None;
    room.winner_id = None;
    room.turn_count = 0;
    room.kill_zone_active = false;
    room.last_move = None;
    room.phase = TurnPhase::RollPending;
    if let Some(next) = next_seat(room, room.players.len().saturating_sub(1)) {
        room.current_player_index = next;
    }
    reset_clock(room);

    let mut transition = Transition::new();
    let first_player_id = room
        .current_player_id()
        .ok_or_else(|| EngineError::validation("no active player"))?;
    transition.emit(ServerEvent::GameStarted {
        rules: room.rules,
        first_player_id,
    });
    if room.rules.power_ups_enabled {
        for power_up in spawn_initial_power_ups(room, config.rules.initial_power_ups, rng) {
            transition.emit(ServerEvent::PowerUpSpawned(power_up));
        }
    }
    transition.direct(Directive::RestartTurnTimer {
        player_id: first_player_id,
    });
    tracing::info!(
        room_id = %room.id,
        players = room.players.len(),
        "game started"
    );
    Ok(transition)
}

// ---------------------------------------------------------------------------
// Rolling
// ---------------------------------------------------------------------------

/// Roll the die for the current player.
pub fn roll_dice(
    room: &mut Room,
    player_id: PlayerId,
    config: &LudoConfig,
    rng: &mut impl Rng,
) -> Result<Transition, EngineError> {
    check_roll(room, player_id)?;
    let value = rng.random_range(1..=DICE_MAX);
    apply_roll(room, player_id, value, config)
}

fn check_roll(room: &Room, player_id: PlayerId) -> Result<(), EngineError> {
    ensure_turn(room, player_id, "roll")?;
    match room.phase {
        TurnPhase::RollPending => Ok(()),
        TurnPhase::MovePending => Err(EngineError::AlreadyRolled),
        phase => Err(EngineError::InvalidPhase {
            phase,
            action: "roll",
        }),
    }
}

/// Record a die value for the current player.
///
/// [`roll_dice`] draws the value from the room RNG; replays and tests feed
/// recorded values through here directly.
pub fn apply_roll(
    room: &mut Room,
    player_id: PlayerId,
    value: u8,
    config: &LudoConfig,
) -> Result<Transition, EngineError> {
    check_roll(room, player_id)?;
    if value == 0 || value > DICE_MAX {
        return Err(EngineError::validation(format!("invalid die value {value}")));
    }
    let player = room
        .player(player_id)
        .ok_or(EngineError::PlayerNotFound(player_id))?;
    let movable = movable_tokens(player, value);

    room.dice_value = Some(value);
    room.phase = TurnPhase::MovePending;

    let mut transition = Transition::new();
    transition.emit(ServerEvent::DiceRolled {
        player_id,
        value,
        movable_tokens: movable.clone(),
    });
    if movable.is_empty() {
        transition.direct(Directive::ScheduleAutoSkip {
            player_id,
            delay_ms: config.timing.auto_skip_delay_ms,
        });
    } else {
        reset_clock(room);
        transition.direct(Directive::RestartTurnTimer { player_id });
    }
    tracing::debug!(
        room_id = %room.id,
        player_id = %player_id,
        dice = value,
        movable = movable.len(),
        "dice rolled"
    );
    Ok(transition)
}

// ---------------------------------------------------------------------------
// Moving
// ---------------------------------------------------------------------------

/// Move one of the current player's tokens by the rolled value.
pub fn move_token(
    room: &mut Room,
    player_id: PlayerId,
    token_id: TokenId,
    config: &LudoConfig,
    rng: &mut impl Rng,
) -> Result<Transition, EngineError> {
    ensure_turn(room, player_id, "move")?;
    if room.phase != TurnPhase::MovePending {
        return Err(EngineError::InvalidPhase {
            phase: room.phase,
            action: "move",
        });
    }
    let dice = room.dice_value.ok_or(EngineError::InvalidPhase {
        phase: room.phase,
        action: "move",
    })?;
    let token = room
        .token(token_id)
        .ok_or(EngineError::TokenNotFound(token_id))?;
    if token.owner_id != player_id {
        return Err(EngineError::NotYourToken { token_id });
    }
    let plan = compute_move(token, dice)?;

    let effects = execute_plan(room, token_id, &plan, rng);
    let to = room.token(token_id).map_or(plan.new_position, |t| t.position);
    let won = room.player(player_id).is_some_and(Player::all_finished);
    let extra_turn = !won
        && (dice == EXIT_ROLL || (room.rules.bonus_roll_on_capture && effects.captured_any()));

    let outcome = build_outcome(player_id, token_id, dice, &plan, to, &effects, extra_turn);
    room.last_move = Some(outcome.clone());
    room.dice_value = None;

    let mut transition = Transition::new();
    transition.emit(ServerEvent::TokenMoved(outcome));
    if effects.power_up.is_some() {
        transition.direct(Directive::ScheduleRespawn {
            delay_ms: config.timing.power_up_respawn_ms,
        });
    }
    tracing::debug!(
        room_id = %room.id,
        player_id = %player_id,
        token_id = %token_id,
        dice,
        from = plan.from,
        to,
        captured = effects.captured.len(),
        "token moved"
    );

    if won {
        transition.merge(end_game(room, player_id));
    } else if extra_turn {
        room.phase = TurnPhase::RollPending;
        reset_clock(room);
        transition.direct(Directive::RestartTurnTimer { player_id });
    } else {
        transition.merge(advance_turn(room, config));
    }
    Ok(transition)
}

fn build_outcome(
    player_id: PlayerId,
    token_id: TokenId,
    dice: u8,
    plan: &ludo_rules::MovePlan,
    to: i32,
    effects: &ArrivalEffects,
    extra_turn: bool,
) -> MoveOutcome {
    MoveOutcome {
        player_id,
        token_id,
        dice,
        steps: plan.steps,
        from: plan.from,
        landed: plan.new_position,
        to,
        captured: effects.captured.clone(),
        reverse_killed: effects.reverse_killed,
        power_up: effects.power_up.as_ref().map(|p| p.kind),
        trap: effects.trap,
        round_bonus: effects.round_bonus,
        finished: plan.finished,
        extra_turn,
    }
}

// ---------------------------------------------------------------------------
// Turn passing
// ---------------------------------------------------------------------------

/// Seat index of the next connected, non-left player after `from`.
///
/// Falls back to the next non-left player when nobody is connected.
pub fn next_seat(room: &Room, from: usize) -> Option<usize> {
    let seats = room.players.len();
    if seats == 0 {
        return None;
    }
    let order = || {
        (1..=seats).filter_map(move |offset| {
            let seat = from.saturating_add(offset).checked_rem(seats)?;
            room.players.get(seat).map(|p| (seat, p))
        })
    };
    order()
        .find(|(_, p)| p.is_active() && p.connected)
        .or_else(|| order().find(|(_, p)| p.is_active()))
        .map(|(seat, _)| seat)
}

/// End the current turn and hand the dice to the next player.
///
/// Ticks down the outgoing player's timed effects, advances the turn
/// counter and toggles the kill-zone window on schedule.
pub fn advance_turn(room: &mut Room, config: &LudoConfig) -> Transition {
    let mut transition = Transition::new();
    let ending_turn = room.turn_count;
    if let Some(player) = room.current_player_mut() {
        player.turn_time_remaining = 0;
        for token in &mut player.tokens {
            token.shield.tick(ending_turn);
            token.frozen.tick(ending_turn);
        }
    }
    room.turn_count = room.turn_count.saturating_add(1);

    if room.rules.kill_zone_enabled
        && room
            .turn_count
            .checked_rem(room.rules.kill_zone_interval)
            .is_some_and(|r| r == 0)
    {
        room.kill_zone_active = !room.kill_zone_active;
        transition.emit(ServerEvent::KillZoneToggled {
            active: room.kill_zone_active,
        });
    }

    if let Some(next) = next_seat(room, room.current_player_index) {
        room.current_player_index = next;
    }
    room.dice_value = None;
    room.phase = TurnPhase::RollPending;
    reset_clock(room);
    if let Some(directive) = turn_timer_directive(room, config) {
        transition.direct(directive);
    }
    transition
}

/// Pass the current player's turn without a move.
pub fn skip_turn(
    room: &mut Room,
    reason: SkipReason,
    config: &LudoConfig,
) -> Result<Transition, EngineError> {
    if !room.is_started() || room.is_ended() {
        return Err(EngineError::InvalidPhase {
            phase: room.phase,
            action: "skip",
        });
    }
    let player_id = room
        .current_player_id()
        .ok_or_else(|| EngineError::validation("no current player"))?;
    let mut transition = Transition::new();
    transition.emit(ServerEvent::TurnSkipped { player_id, reason });
    transition.merge(advance_turn(room, config));
    tracing::debug!(room_id = %room.id, player_id = %player_id, ?reason, "turn skipped");
    Ok(transition)
}

/// One beat of the turn clock. Skips the turn when the clock runs out.
pub fn tick_turn_clock(room: &mut Room, config: &LudoConfig) -> Result<Transition, EngineError> {
    if !matches!(room.phase, TurnPhase::RollPending | TurnPhase::MovePending) {
        return Ok(Transition::new());
    }
    let Some(player) = room.current_player_mut() else {
        return Ok(Transition::new());
    };
    player.turn_time_remaining = player.turn_time_remaining.saturating_sub(1);
    let player_id = player.id;
    let seconds_remaining = player.turn_time_remaining;

    let mut transition = Transition::new();
    transition.emit(ServerEvent::TurnClock {
        player_id,
        seconds_remaining,
    });
    if seconds_remaining == 0 {
        transition.merge(skip_turn(room, SkipReason::Timeout, config)?);
    }
    Ok(transition)
}

/// Decide the game for `winner_id`.
pub fn end_game(room: &mut Room, winner_id: PlayerId) -> Transition {
    room.phase = TurnPhase::Ended;
    room.winner_id = Some(winner_id);
    room.dice_value = None;

    let final_scores = room
        .players
        .iter()
        .map(|p| FinalScore {
            player_id: p.id,
            name: p.name.clone(),
            color: p.color,
            points: p.points,
            kills: p.kills,
            finished_tokens: u32::try_from(p.finished_count()).unwrap_or(u32::MAX),
        })
        .collect();

    let mut transition = Transition::new();
    transition.emit(ServerEvent::GameEnded {
        winner_id,
        final_scores,
    });
    transition.direct(Directive::CancelAll);
    tracing::info!(room_id = %room.id, winner_id = %winner_id, "game ended");
    transition
}

// ---------------------------------------------------------------------------
// Power-ups
// ---------------------------------------------------------------------------

/// Spend a held teleport or swap charge before rolling.
pub fn use_power_up(
    room: &mut Room,
    player_id: PlayerId,
    target: &PowerUpTarget,
) -> Result<Transition, EngineError> {
    ensure_turn(room, player_id, "use a power-up")?;
    if room.phase != TurnPhase::RollPending {
        return Err(EngineError::InvalidPhase {
            phase: room.phase,
            action: "use a power-up",
        });
    }
    ludo_rules::use_power_up(room, player_id, target)?;

    let mut transition = Transition::new();
    transition.emit(ServerEvent::PowerUpUsed {
        player_id,
        kind: target.kind(),
        target: target.clone(),
    });
    Ok(transition)
}

/// Replace a consumed power-up, if the game is still running.
pub fn respawn_power_up(room: &mut Room, rng: &mut impl Rng) -> Transition {
    let mut transition = Transition::new();
    if !room.is_started() || room.is_ended() || !room.rules.power_ups_enabled {
        return transition;
    }
    if let Some(power_up) = spawn_power_up(room, rng) {
        transition.emit(ServerEvent::PowerUpSpawned(power_up));
    }
    transition
}
