//! Pure move computation.
//!
//! [`compute_move`] answers "where would this token go with this roll"
//! without touching any state; [`apply_plan`] writes an accepted plan back
//! onto the token. Legality queries used by the turn coordinator are built
//! on the same function so "can move" and "does move" never disagree.

use ludo_board::{
    Cell, FINISH_OFFSET, HOME_RUN_ENTRY_PROGRESS, classify, home_run_position, progress,
    start_offset, track_index,
};
use ludo_types::{Player, Token, TokenId};

use crate::error::IllegalMove;

/// Highest face of the die.
pub const DICE_MAX: u8 = 6;

/// The face that releases a token from home and earns an extra roll.
pub const EXIT_ROLL: u8 = 6;

/// The result of a legal move, before arrival effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    /// Position before the move.
    pub from: i32,
    /// Cells travelled.
    pub steps: u8,
    /// Position after the move.
    pub new_position: i32,
    /// Whether the token is in its home-run lane afterwards.
    pub entered_home_run: bool,
    /// Whether the token reached the finishing cell.
    pub finished: bool,
}

/// Compute where `token` would land with a roll of `dice`.
///
/// A pending speed boost doubles the distance. Moves that would pass the
/// finishing cell are rejected, never clamped.
pub fn compute_move(token: &Token, dice: u8) -> Result<MovePlan, IllegalMove> {
    if token.finished {
        return Err(IllegalMove::TokenFinished);
    }
    if token.frozen.active {
        return Err(IllegalMove::TokenFrozen);
    }
    if dice == 0 || dice > DICE_MAX {
        return Err(IllegalMove::InvalidDice { dice });
    }

    let steps = if token.speed_boost_pending {
        dice.saturating_mul(2)
    } else {
        dice
    };
    let from = token.position;

    match classify(from) {
        Cell::Home => {
            if dice != EXIT_ROLL {
                return Err(IllegalMove::NeedSixToExit { dice });
            }
            Ok(MovePlan {
                from,
                steps: dice,
                new_position: start_offset(token.color),
                entered_home_run: false,
                finished: false,
            })
        }
        Cell::Track(index) => {
            let reached = progress(token.color, index).saturating_add(i32::from(steps));
            if reached <= HOME_RUN_ENTRY_PROGRESS {
                return Ok(MovePlan {
                    from,
                    steps,
                    new_position: track_index(token.color, reached),
                    entered_home_run: false,
                    finished: false,
                });
            }
            let offset = reached.saturating_sub(HOME_RUN_ENTRY_PROGRESS.saturating_add(1));
            lane_plan(from, steps, offset)
        }
        Cell::HomeRun(offset) => lane_plan(from, steps, offset.saturating_add(i32::from(steps))),
        Cell::Finish => Err(IllegalMove::TokenFinished),
        Cell::Invalid => Err(IllegalMove::InvalidPosition { position: from }),
    }
}

/// Plan for a move ending at lane offset `offset`.
const fn lane_plan(from: i32, steps: u8, offset: i32) -> Result<MovePlan, IllegalMove> {
    if offset > FINISH_OFFSET {
        return Err(IllegalMove::Overshoot { offset });
    }
    Ok(MovePlan {
        from,
        steps,
        new_position: home_run_position(offset),
        entered_home_run: true,
        finished: offset == FINISH_OFFSET,
    })
}

/// Write an accepted plan onto the token, consuming any speed boost.
pub const fn apply_plan(token: &mut Token, plan: &MovePlan) {
    token.position = plan.new_position;
    token.in_home_run = plan.entered_home_run;
    token.finished = plan.finished;
    token.speed_boost_pending = false;
}

/// Ids of the player's tokens that have a legal move with `dice`.
pub fn movable_tokens(player: &Player, dice: u8) -> Vec<TokenId> {
    player
        .tokens
        .iter()
        .filter(|t| compute_move(t, dice).is_ok())
        .map(|t| t.id)
        .collect()
}

/// Whether any of the player's tokens can move with `dice`.
pub fn has_legal_move(player: &Player, dice: u8) -> bool {
    player.tokens.iter().any(|t| compute_move(t, dice).is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use ludo_board::FINISH_POSITION;
    use ludo_types::Color;

    use super::*;

    fn token_at(color: Color, position: i32) -> Token {
        let mut token = Player::new("p", color).tokens[0].clone();
        token.position = position;
        token.in_home_run = position >= 52;
        token
    }

    #[test]
    fn leaving_home_needs_exact_six() {
        let token = token_at(Color::Green, -1);
        for dice in 1..=5 {
            assert_eq!(
                compute_move(&token, dice),
                Err(IllegalMove::NeedSixToExit { dice })
            );
        }
        let plan = compute_move(&token, 6).unwrap();
        assert_eq!(plan.new_position, 13);
        assert!(!plan.entered_home_run);
    }

    #[test]
    fn track_moves_wrap_around_the_board() {
        let token = token_at(Color::Blue, 50);
        let plan = compute_move(&token, 4).unwrap();
        assert_eq!(plan.new_position, 2);
    }

    #[test]
    fn passing_the_entry_turns_into_the_lane() {
        // Red entry is 50; 49 + 4 = progress 53 -> lane offset 2.
        let token = token_at(Color::Red, 49);
        let plan = compute_move(&token, 4).unwrap();
        assert_eq!(plan.new_position, 54);
        assert!(plan.entered_home_run);
        assert!(!plan.finished);

        // Landing exactly on the entry stays on the track.
        let plan = compute_move(&token, 1).unwrap();
        assert_eq!(plan.new_position, 50);
        assert!(!plan.entered_home_run);
    }

    #[test]
    fn exact_roll_finishes_and_overshoot_is_rejected() {
        let token = token_at(Color::Yellow, 55);
        let plan = compute_move(&token, 2).unwrap();
        assert_eq!(plan.new_position, FINISH_POSITION);
        assert!(plan.finished);
        assert_eq!(
            compute_move(&token, 3),
            Err(IllegalMove::Overshoot { offset: 6 })
        );
    }

    #[test]
    fn overshoot_from_track_is_rejected() {
        // Red at 48 (progress 48) + 6 = 54 -> offset 3, fine.
        assert!(compute_move(&token_at(Color::Red, 48), 6).is_ok());
        // Red at 50 + 6 = 56 -> offset 5, finished.
        let plan = compute_move(&token_at(Color::Red, 50), 6).unwrap();
        assert!(plan.finished);
    }

    #[test]
    fn speed_boost_doubles_distance() {
        let mut token = token_at(Color::Red, 10);
        token.speed_boost_pending = true;
        let plan = compute_move(&token, 3).unwrap();
        assert_eq!(plan.steps, 6);
        assert_eq!(plan.new_position, 16);
        apply_plan(&mut token, &plan);
        assert!(!token.speed_boost_pending);
        assert_eq!(token.position, 16);
    }

    #[test]
    fn finished_and_frozen_tokens_cannot_move() {
        let mut token = token_at(Color::Red, FINISH_POSITION);
        token.finished = true;
        assert_eq!(compute_move(&token, 1), Err(IllegalMove::TokenFinished));

        let mut frozen = token_at(Color::Red, 10);
        frozen.frozen.activate(1, 0);
        assert_eq!(compute_move(&frozen, 2), Err(IllegalMove::TokenFrozen));
    }

    #[test]
    fn dice_outside_range_rejected() {
        let token = token_at(Color::Red, 10);
        assert_eq!(
            compute_move(&token, 0),
            Err(IllegalMove::InvalidDice { dice: 0 })
        );
        assert_eq!(
            compute_move(&token, 7),
            Err(IllegalMove::InvalidDice { dice: 7 })
        );
    }

    #[test]
    fn movable_tokens_lists_only_legal_moves() {
        let mut player = Player::new("p", Color::Red);
        assert!(!has_legal_move(&player, 3));
        assert_eq!(movable_tokens(&player, 6).len(), 4);

        player.tokens[1].position = 20;
        assert_eq!(movable_tokens(&player, 3), vec![player.tokens[1].id]);
    }
}
