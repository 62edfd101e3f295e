//! Effects triggered by a token arriving on a shared-track cell.
//!
//! Resolution runs in a fixed order:
//!
//! 1. **Capture** -- other unfinished tokens on the cell are sent home,
//!    unless shielded or on a safe cell. Under reverse-kill the attack can
//!    backfire instead, in which case nothing else resolves.
//! 2. **Power-up** -- an active power-up on the cell is consumed.
//! 3. **Trap** -- an unshielded token on a trap cell steps back or freezes.
//! 4. **Round bonus** -- a move that wrapped the track index scores once.
//!
//! All randomness comes from the injected RNG so two rooms fed the same seed
//! and the same commands resolve identically.

use ludo_board::{is_safe, is_track, is_trap, step_back};
use ludo_types::{Player, PowerUp, PowerUpKind, Room, RuleSet, TokenId, TrapOutcome};
use rand::Rng;

use crate::power_ups::SHIELD_TURNS;

/// Points for capturing an opponent token.
pub const CAPTURE_POINTS: i32 = 10;

/// Points lost by the owner of a captured token.
pub const CAPTURED_PENALTY: i32 = 5;

/// Points for bringing a token to the finishing cell.
pub const FINISH_POINTS: i32 = 5;

/// Points for completing a lap of the shared track.
pub const ROUND_BONUS_POINTS: i32 = 2;

/// Cells a trap pushes a token back.
pub const TRAP_STEP_BACK: i32 = 3;

/// Owner turns a trap freezes a token for.
pub const FREEZE_TURNS: u32 = 1;

/// A token that has just been moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrival {
    /// The moved token.
    pub token_id: TokenId,
    /// Position before the move.
    pub from: i32,
    /// Position the move landed on.
    pub to: i32,
}

/// Everything that happened on arrival.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArrivalEffects {
    /// Tokens sent home, in ascending id order.
    pub captured: Vec<TokenId>,
    /// Whether the capture backfired and the moved token went home.
    pub reverse_killed: bool,
    /// The power-up consumed on the cell.
    pub power_up: Option<PowerUp>,
    /// The trap effect applied.
    pub trap: Option<TrapOutcome>,
    /// Whether the lap bonus was awarded.
    pub round_bonus: bool,
}

impl ArrivalEffects {
    /// Whether at least one opponent or own token was captured.
    pub fn captured_any(&self) -> bool {
        !self.captured.is_empty()
    }
}

/// Add `delta` points to a player when the points system is on.
pub const fn award_points(rules: &RuleSet, player: &mut Player, delta: i32) {
    if rules.points_system_enabled {
        player.points = player.points.saturating_add(delta);
    }
}

/// Resolve capture, power-up, trap and lap bonus for a token that landed on
/// `arrival.to`. Arrivals off the shared track and unknown tokens resolve to
/// no effects.
pub fn apply_arrival_effects(
    room: &mut Room,
    arrival: &Arrival,
    rng: &mut impl Rng,
) -> ArrivalEffects {
    let mut effects = ArrivalEffects::default();
    if !is_track(arrival.to) {
        return effects;
    }
    let Some((mover_seat, _)) = room.locate_token(arrival.token_id) else {
        return effects;
    };

    resolve_capture(room, arrival, mover_seat, &mut effects);
    if effects.reverse_killed {
        return effects;
    }
    resolve_power_up(room, arrival, mover_seat, &mut effects);
    resolve_trap(room, arrival, rng, &mut effects);
    resolve_round_bonus(room, arrival, mover_seat, &mut effects);
    effects
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// A token on the arrival cell that may be sent home.
struct Victim {
    token_id: TokenId,
    seat: usize,
}

fn resolve_capture(
    room: &mut Room,
    arrival: &Arrival,
    mover_seat: usize,
    effects: &mut ArrivalEffects,
) {
    if is_safe(arrival.to) {
        return;
    }
    let kill_zone = room.kill_zone_active;
    let mut victims: Vec<Victim> = room
        .players
        .iter()
        .enumerate()
        .filter(|(seat, _)| *seat != mover_seat || kill_zone)
        .flat_map(|(seat, player)| {
            player
                .tokens
                .iter()
                .filter(|t| {
                    t.id != arrival.token_id
                        && !t.finished
                        && t.position == arrival.to
                        && !t.shield.active
                })
                .map(move |t| Victim {
                    token_id: t.id,
                    seat,
                })
        })
        .collect();
    if victims.is_empty() {
        return;
    }

    let mover_kills = room.players.get(mover_seat).map_or(0, |p| p.kills);
    if room.rules.reverse_kill_enabled && !kill_zone {
        let backfires = victims.iter().any(|v| {
            v.seat != mover_seat
                && room
                    .players
                    .get(v.seat)
                    .is_some_and(|owner| owner.kills < mover_kills)
        });
        if backfires {
            if let Some(token) = room.token_mut(arrival.token_id) {
                token.send_home();
            }
            effects.reverse_killed = true;
            tracing::debug!(
                room_id = %room.id,
                token_id = %arrival.token_id,
                "capture backfired under reverse-kill"
            );
            return;
        }
    }

    victims.sort_by_key(|v| v.token_id);
    let rules = room.rules;
    for victim in victims {
        if let Some(token) = room.token_mut(victim.token_id) {
            token.send_home();
        }
        if victim.seat != mover_seat {
            if let Some(mover) = room.players.get_mut(mover_seat) {
                mover.kills = mover.kills.saturating_add(1);
                award_points(&rules, mover, CAPTURE_POINTS);
            }
            if let Some(owner) = room.players.get_mut(victim.seat) {
                award_points(&rules, owner, CAPTURED_PENALTY.saturating_neg());
            }
        }
        effects.captured.push(victim.token_id);
    }
}

// ---------------------------------------------------------------------------
// Power-up pickup
// ---------------------------------------------------------------------------

fn resolve_power_up(
    room: &mut Room,
    arrival: &Arrival,
    mover_seat: usize,
    effects: &mut ArrivalEffects,
) {
    if !room.rules.power_ups_enabled {
        return;
    }
    let Some(index) = room.active_power_up_at(arrival.to) else {
        return;
    };
    let mut power_up = room.power_ups.remove(index);
    power_up.active = false;

    let turn = room.turn_count;
    match power_up.kind {
        PowerUpKind::Shield => {
            if let Some(token) = room.token_mut(arrival.token_id) {
                token.shield.activate(SHIELD_TURNS, turn);
            }
        }
        PowerUpKind::SpeedBoost => {
            if let Some(token) = room.token_mut(arrival.token_id) {
                token.speed_boost_pending = true;
            }
        }
        PowerUpKind::Teleport | PowerUpKind::Swap => {
            if let Some(player) = room.players.get_mut(mover_seat) {
                player.held_power_ups.push(power_up.kind);
            }
        }
    }
    effects.power_up = Some(power_up);
}

// ---------------------------------------------------------------------------
// Traps
// ---------------------------------------------------------------------------

fn resolve_trap(
    room: &mut Room,
    arrival: &Arrival,
    rng: &mut impl Rng,
    effects: &mut ArrivalEffects,
) {
    if !room.rules.trap_zones_enabled || !is_trap(arrival.to) {
        return;
    }
    let turn = room.turn_count;
    let Some(token) = room.token_mut(arrival.token_id) else {
        return;
    };
    if token.shield.active {
        return;
    }
    if rng.random_bool(0.5) {
        let to = step_back(token.color, arrival.to, TRAP_STEP_BACK);
        token.position = to;
        effects.trap = Some(TrapOutcome::SteppedBack { to });
    } else {
        token.frozen.activate(FREEZE_TURNS, turn);
        effects.trap = Some(TrapOutcome::Frozen);
    }
}

// ---------------------------------------------------------------------------
// Lap bonus
// ---------------------------------------------------------------------------

fn resolve_round_bonus(
    room: &mut Room,
    arrival: &Arrival,
    mover_seat: usize,
    effects: &mut ArrivalEffects,
) {
    if !room.rules.points_system_enabled || !is_track(arrival.from) || arrival.to >= arrival.from
    {
        return;
    }
    let still_on_track = room
        .token(arrival.token_id)
        .is_some_and(|t| is_track(t.position));
    if !still_on_track {
        return;
    }
    let rules = room.rules;
    if let Some(player) = room.players.get_mut(mover_seat) {
        award_points(&rules, player, ROUND_BONUS_POINTS);
        effects.round_bonus = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use ludo_types::{Color, RoomId};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn two_player_room() -> Room {
        let mut room = Room::new(RoomId::from("T"), RuleSet::default());
        room.players.push(Player::new("red", Color::Red));
        room.players.push(Player::new("green", Color::Green));
        room
    }

    fn place(room: &mut Room, seat: usize, token: usize, position: i32) -> TokenId {
        let t = &mut room.players[seat].tokens[token];
        t.position = position;
        t.id
    }

    fn arrive(room: &mut Room, token_id: TokenId, from: i32, to: i32) -> ArrivalEffects {
        let mut rng = SmallRng::seed_from_u64(7);
        apply_arrival_effects(room, &Arrival { token_id, from, to }, &mut rng)
    }

    #[test]
    fn capture_sends_opponent_home_and_scores() {
        let mut room = two_player_room();
        let mover = place(&mut room, 0, 0, 12);
        let victim = place(&mut room, 1, 0, 12);

        let effects = arrive(&mut room, mover, 9, 12);
        assert_eq!(effects.captured, vec![victim]);
        assert!(room.token(victim).unwrap().is_at_home());
        assert_eq!(room.players[0].kills, 1);
        assert_eq!(room.players[0].points, CAPTURE_POINTS);
        assert_eq!(room.players[1].points, -CAPTURED_PENALTY);
    }

    #[test]
    fn shielded_tokens_and_safe_cells_are_immune() {
        let mut room = two_player_room();
        let mover = place(&mut room, 0, 0, 12);
        let victim = place(&mut room, 1, 0, 12);
        room.players[1].tokens[0].shield.activate(SHIELD_TURNS, 0);
        assert!(arrive(&mut room, mover, 9, 12).captured.is_empty());
        assert_eq!(room.token(victim).unwrap().position, 12);

        let mover = place(&mut room, 0, 1, 21);
        let victim = place(&mut room, 1, 1, 21);
        assert!(arrive(&mut room, mover, 17, 21).captured.is_empty());
        assert_eq!(room.token(victim).unwrap().position, 21);
    }

    #[test]
    fn own_tokens_only_captured_inside_kill_zone() {
        let mut room = two_player_room();
        let mover = place(&mut room, 0, 0, 12);
        let own = place(&mut room, 0, 1, 12);
        assert!(arrive(&mut room, mover, 9, 12).captured.is_empty());

        room.kill_zone_active = true;
        let effects = arrive(&mut room, mover, 9, 12);
        assert_eq!(effects.captured, vec![own]);
        assert_eq!(room.players[0].kills, 0);
    }

    #[test]
    fn reverse_kill_sends_attacker_home() {
        let mut room = two_player_room();
        room.rules.reverse_kill_enabled = true;
        room.players[0].kills = 2;
        let mover = place(&mut room, 0, 0, 12);
        let victim = place(&mut room, 1, 0, 12);
        room.power_ups.push(PowerUp::new(PowerUpKind::Shield, 12));

        let effects = arrive(&mut room, mover, 9, 12);
        assert!(effects.reverse_killed);
        assert!(effects.captured.is_empty());
        assert!(effects.power_up.is_none());
        assert!(room.token(mover).unwrap().is_at_home());
        assert_eq!(room.token(victim).unwrap().position, 12);
        assert_eq!(room.power_ups.len(), 1);
    }

    #[test]
    fn reverse_kill_spares_attacks_on_stronger_players() {
        let mut room = two_player_room();
        room.rules.reverse_kill_enabled = true;
        room.players[1].kills = 1;
        let mover = place(&mut room, 0, 0, 12);
        let victim = place(&mut room, 1, 0, 12);
        assert_eq!(arrive(&mut room, mover, 9, 12).captured, vec![victim]);
    }

    #[test]
    fn shield_pickup_protects_mover() {
        let mut room = two_player_room();
        room.turn_count = 4;
        room.power_ups.push(PowerUp::new(PowerUpKind::Shield, 10));
        let mover = place(&mut room, 0, 0, 10);
        let effects = arrive(&mut room, mover, 6, 10);
        assert_eq!(effects.power_up.map(|p| p.kind), Some(PowerUpKind::Shield));
        let shield = room.token(mover).unwrap().shield;
        assert!(shield.active);
        assert_eq!(shield.turns_left, SHIELD_TURNS);
        assert_eq!(shield.applied_on_turn, 4);
        assert!(room.power_ups.is_empty());
    }

    #[test]
    fn targeted_pickups_become_held_charges() {
        let mut room = two_player_room();
        room.power_ups.push(PowerUp::new(PowerUpKind::Swap, 16));
        let mover = place(&mut room, 0, 0, 16);
        arrive(&mut room, mover, 12, 16);
        assert_eq!(room.players[0].held_power_ups, vec![PowerUpKind::Swap]);
    }

    #[test]
    fn trap_applies_exactly_one_effect() {
        for seed in 0..32 {
            let mut room = two_player_room();
            let mover = place(&mut room, 0, 0, 18);
            let mut rng = SmallRng::seed_from_u64(seed);
            let effects = apply_arrival_effects(
                &mut room,
                &Arrival { token_id: mover, from: 14, to: 18 },
                &mut rng,
            );
            let token = room.token(mover).unwrap();
            match effects.trap {
                Some(TrapOutcome::SteppedBack { to }) => {
                    assert_eq!(to, 15);
                    assert_eq!(token.position, 15);
                    assert!(!token.frozen.active);
                }
                Some(TrapOutcome::Frozen) => {
                    assert_eq!(token.position, 18);
                    assert!(token.frozen.active);
                }
                None => assert!(effects.trap.is_some(), "trap did not fire"),
            }
        }
    }

    #[test]
    fn shielded_token_ignores_trap() {
        let mut room = two_player_room();
        let mover = place(&mut room, 0, 0, 18);
        room.players[0].tokens[0].shield.activate(SHIELD_TURNS, 0);
        assert!(arrive(&mut room, mover, 14, 18).trap.is_none());
    }

    #[test]
    fn wrapping_the_track_awards_round_bonus() {
        let mut room = two_player_room();
        let mover = place(&mut room, 1, 0, 2);
        let effects = arrive(&mut room, mover, 49, 2);
        assert!(effects.round_bonus);
        assert_eq!(room.players[1].points, ROUND_BONUS_POINTS);

        room.rules.points_system_enabled = false;
        let effects = arrive(&mut room, mover, 49, 2);
        assert!(!effects.round_bonus);
    }

    #[test]
    fn lane_arrivals_have_no_effects() {
        let mut room = two_player_room();
        let mover = place(&mut room, 0, 0, 54);
        assert_eq!(arrive(&mut room, mover, 48, 54), ArrivalEffects::default());
    }
}
