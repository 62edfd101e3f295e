//! Applying an accepted move to the room.

use ludo_types::{Room, TokenId};
use rand::Rng;

use crate::arrival::{Arrival, ArrivalEffects, FINISH_POINTS, apply_arrival_effects, award_points};
use crate::movement::{MovePlan, apply_plan};

/// Move `token_id` according to `plan`, score a finish, and resolve arrival
/// effects on the landing cell.
///
/// The plan must come from [`crate::compute_move`] on the token's current
/// state. Unknown tokens are left alone.
pub fn execute_plan(
    room: &mut Room,
    token_id: TokenId,
    plan: &MovePlan,
    rng: &mut impl Rng,
) -> ArrivalEffects {
    let Some((seat, _)) = room.locate_token(token_id) else {
        return ArrivalEffects::default();
    };
    if let Some(token) = room.token_mut(token_id) {
        apply_plan(token, plan);
    }
    if plan.finished {
        let rules = room.rules;
        if let Some(player) = room.players.get_mut(seat) {
            award_points(&rules, player, FINISH_POINTS);
        }
    }
    let arrival = Arrival {
        token_id,
        from: plan.from,
        to: plan.new_position,
    };
    apply_arrival_effects(room, &arrival, rng)
}
