//! Power-up spawning and held-charge effects.
//!
//! Shield and speed boost take effect the moment a token lands on them (see
//! [`crate::arrival`]). Teleport and swap are banked as charges on the
//! collecting player and spent later with [`use_power_up`], which validates
//! the whole request before mutating anything.

use ludo_board::{HOME_RUN_ENTRY_PROGRESS, POWER_UP_CELLS, is_track, progress};
use ludo_types::{PlayerId, PowerUp, PowerUpKind, PowerUpTarget, Room, Token, TokenId};
use rand::Rng;

use crate::error::PowerUpError;

/// Owner turns a shield lasts.
pub const SHIELD_TURNS: u32 = 2;

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Place a random power-up on a free spawn cell.
///
/// Returns `None` when every spawn cell already holds an active power-up.
pub fn spawn_power_up(room: &mut Room, rng: &mut impl Rng) -> Option<PowerUp> {
    let free: Vec<i32> = POWER_UP_CELLS
        .iter()
        .copied()
        .filter(|cell| room.active_power_up_at(*cell).is_none())
        .collect();
    if free.is_empty() {
        return None;
    }
    let cell = *free.get(rng.random_range(0..free.len()))?;
    let kind = *PowerUpKind::ALL.get(rng.random_range(0..PowerUpKind::ALL.len()))?;
    let power_up = PowerUp::new(kind, cell);
    room.power_ups.push(power_up.clone());
    Some(power_up)
}

/// Spawn up to `count` power-ups, stopping early when the cells run out.
pub fn spawn_initial_power_ups(room: &mut Room, count: u32, rng: &mut impl Rng) -> Vec<PowerUp> {
    (0..count)
        .map_while(|_| spawn_power_up(room, rng))
        .collect()
}

// ---------------------------------------------------------------------------
// Held charges
// ---------------------------------------------------------------------------

/// Spend one held teleport or swap charge of `player_id`.
///
/// Callers are responsible for turn ownership and phase; this function
/// checks the charge and the tokens involved. On error nothing changes.
pub fn use_power_up(
    room: &mut Room,
    player_id: PlayerId,
    target: &PowerUpTarget,
) -> Result<(), PowerUpError> {
    let kind = target.kind();
    let seat = room
        .player_index(player_id)
        .ok_or(PowerUpError::PlayerNotFound(player_id))?;
    let charge = room
        .players
        .get(seat)
        .and_then(|p| p.held_power_ups.iter().position(|k| *k == kind))
        .ok_or(PowerUpError::NotHeld { kind })?;

    match *target {
        PowerUpTarget::Teleport { token_id, position } => {
            validate_teleport(room, player_id, token_id, position)?;
            if let Some(token) = room.token_mut(token_id) {
                token.position = position;
            }
        }
        PowerUpTarget::Swap {
            token_id,
            target_token_id,
        } => {
            let (mine, theirs) = validate_swap(room, player_id, token_id, target_token_id)?;
            if let Some(token) = room.token_mut(token_id) {
                token.position = theirs;
            }
            if let Some(token) = room.token_mut(target_token_id) {
                token.position = mine;
            }
        }
    }

    if let Some(player) = room.players.get_mut(seat) {
        player.held_power_ups.remove(charge);
    }
    tracing::debug!(room_id = %room.id, player_id = %player_id, ?kind, "power-up used");
    Ok(())
}

/// The acting player's own token, which must be on the shared track.
fn own_track_token(
    room: &Room,
    player_id: PlayerId,
    token_id: TokenId,
) -> Result<&Token, PowerUpError> {
    let token = room
        .token(token_id)
        .ok_or(PowerUpError::TokenNotFound(token_id))?;
    if token.owner_id != player_id {
        return Err(PowerUpError::NotOwnToken(token_id));
    }
    if token.finished || !is_track(token.position) {
        return Err(PowerUpError::TokenNotOnTrack(token_id));
    }
    Ok(token)
}

fn validate_teleport(
    room: &Room,
    player_id: PlayerId,
    token_id: TokenId,
    position: i32,
) -> Result<(), PowerUpError> {
    let token = own_track_token(room, player_id, token_id)?;
    if token.frozen.active {
        return Err(PowerUpError::TokenFrozen(token_id));
    }
    if !is_track(position) {
        return Err(PowerUpError::InvalidTarget { position });
    }
    if progress(token.color, position) > HOME_RUN_ENTRY_PROGRESS {
        return Err(PowerUpError::BeyondHomeRunEntry { position });
    }
    let occupied = room
        .player(player_id)
        .is_some_and(|p| {
            p.tokens
                .iter()
                .any(|t| t.id != token_id && !t.finished && t.position == position)
        });
    if occupied {
        return Err(PowerUpError::CellOccupied { position });
    }
    Ok(())
}

/// Returns the current positions of the acting token and the target.
fn validate_swap(
    room: &Room,
    player_id: PlayerId,
    token_id: TokenId,
    target_token_id: TokenId,
) -> Result<(i32, i32), PowerUpError> {
    let mine = own_track_token(room, player_id, token_id)?.position;
    let target = room
        .token(target_token_id)
        .ok_or(PowerUpError::TokenNotFound(target_token_id))?;
    if target.owner_id == player_id {
        return Err(PowerUpError::TargetNotOpponent(target_token_id));
    }
    if target.finished || !is_track(target.position) {
        return Err(PowerUpError::TokenNotOnTrack(target_token_id));
    }
    Ok((mine, target.position))
}
