//! Board geometry for Ludo Arena.
//!
//! One canonical board: a shared circular track of [`TRACK_LENGTH`] cells,
//! quartered among the four colors, plus a private home-run lane of
//! [`HOME_RUN_LENGTH`] cells per color.
//!
//! # Position encoding
//!
//! | Value      | Meaning                                          |
//! |------------|--------------------------------------------------|
//! | `-1`       | At home, not yet entered                         |
//! | `0..=51`   | Shared track index                               |
//! | `52..=56`  | Home-run lane, offsets 0-4                       |
//! | `57`       | Last lane cell; the token is finished            |
//!
//! Lane positions are lane-relative: every color's lane uses `52..=57`, so
//! two tokens of different colors with the same lane position never meet.
//!
//! # Special cells
//!
//! | Cells                          | Kind                                  |
//! |--------------------------------|---------------------------------------|
//! | 8, 21, 34, 47                  | Safe (star) cells, no capture         |
//! | 5, 18, 31, 44                  | Trap cells                            |
//! | 3, 10, 16, 23, 29, 36, 42, 49  | Power-up spawn candidates             |
//!
//! Start cells are not safe. Every function here is total and free of side
//! effects.

use ludo_types::{Color, HOME_POSITION};

/// Cells on the shared track.
pub const TRACK_LENGTH: i32 = 52;

/// Cells in each color's home-run lane, the finishing cell included.
pub const HOME_RUN_LENGTH: i32 = 6;

/// Track distance between consecutive colors' start cells.
pub const START_SPACING: i32 = 13;

/// Progress value of the last shared-track cell a color visits.
pub const HOME_RUN_ENTRY_PROGRESS: i32 = 50;

/// Lane offset of the finishing cell.
pub const FINISH_OFFSET: i32 = HOME_RUN_LENGTH - 1;

/// Position of a finished token.
pub const FINISH_POSITION: i32 = TRACK_LENGTH + FINISH_OFFSET;

/// Safe (star) cells.
pub const SAFE_CELLS: [i32; 4] = [8, 21, 34, 47];

/// Trap cells.
pub const TRAP_CELLS: [i32; 4] = [5, 18, 31, 44];

/// Cells power-ups may spawn on.
pub const POWER_UP_CELLS: [i32; 8] = [3, 10, 16, 23, 29, 36, 42, 49];

/// Where a position lies on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Not yet entered.
    Home,
    /// Shared track, by index.
    Track(i32),
    /// Home-run lane, by offset (`0..FINISH_OFFSET`).
    HomeRun(i32),
    /// The finishing cell.
    Finish,
    /// Outside every valid range.
    Invalid,
}

/// Classify a raw position value.
pub const fn classify(position: i32) -> Cell {
    if position == HOME_POSITION {
        Cell::Home
    } else if is_track(position) {
        Cell::Track(position)
    } else if position == FINISH_POSITION {
        Cell::Finish
    } else if is_home_run(position) {
        Cell::HomeRun(position.saturating_sub(TRACK_LENGTH))
    } else {
        Cell::Invalid
    }
}

/// Track index where a color enters the board.
pub const fn start_offset(color: Color) -> i32 {
    match color {
        Color::Red => 0,
        Color::Green => START_SPACING,
        Color::Yellow => START_SPACING.saturating_mul(2),
        Color::Blue => START_SPACING.saturating_mul(3),
    }
}

/// Last shared-track index a color visits before turning into its lane.
pub const fn home_run_entry(color: Color) -> i32 {
    track_index(color, HOME_RUN_ENTRY_PROGRESS)
}

/// Distance travelled from the color's start to a track index.
pub const fn progress(color: Color, track_index: i32) -> i32 {
    track_index
        .saturating_sub(start_offset(color))
        .rem_euclid(TRACK_LENGTH)
}

/// Track index reached after travelling `progress` cells from the color's
/// start. Inverse of [`progress`].
pub const fn track_index(color: Color, progress: i32) -> i32 {
    start_offset(color)
        .saturating_add(progress)
        .rem_euclid(TRACK_LENGTH)
}

/// Track index after stepping back `cells` from `track_index`, clamped at the
/// color's own start so the token never wraps backwards past it.
pub const fn step_back(color: Color, track_index_now: i32, cells: i32) -> i32 {
    let back = progress(color, track_index_now).saturating_sub(cells);
    let clamped = if back < 0 { 0 } else { back };
    track_index(color, clamped)
}

/// Position of a lane offset.
pub const fn home_run_position(offset: i32) -> i32 {
    TRACK_LENGTH.saturating_add(offset)
}

/// Lane offset of a position, if it lies in the lane.
pub const fn home_run_offset(position: i32) -> Option<i32> {
    if is_home_run(position) {
        Some(position.saturating_sub(TRACK_LENGTH))
    } else {
        None
    }
}

/// Whether a position is on the shared track.
pub const fn is_track(position: i32) -> bool {
    position >= 0 && position < TRACK_LENGTH
}

/// Whether a position is in a home-run lane, finishing cell included.
pub const fn is_home_run(position: i32) -> bool {
    position >= TRACK_LENGTH && position <= FINISH_POSITION
}

/// Whether a track cell protects its occupants from capture.
pub fn is_safe(position: i32) -> bool {
    SAFE_CELLS.contains(&position)
}

/// Whether a track cell is a trap.
pub fn is_trap(position: i32) -> bool {
    TRAP_CELLS.contains(&position)
}

/// Whether power-ups may spawn on a track cell.
pub fn is_power_up_cell(position: i32) -> bool {
    POWER_UP_CELLS.contains(&position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_quarter_the_track() {
        assert_eq!(start_offset(Color::Red), 0);
        assert_eq!(start_offset(Color::Green), 13);
        assert_eq!(start_offset(Color::Yellow), 26);
        assert_eq!(start_offset(Color::Blue), 39);
    }

    #[test]
    fn home_run_entries_sit_two_cells_before_start() {
        assert_eq!(home_run_entry(Color::Red), 50);
        assert_eq!(home_run_entry(Color::Green), 11);
        assert_eq!(home_run_entry(Color::Yellow), 24);
        assert_eq!(home_run_entry(Color::Blue), 37);
    }

    #[test]
    fn progress_inverts_track_index() {
        for color in Color::ALL {
            for p in 0..TRACK_LENGTH {
                assert_eq!(progress(color, track_index(color, p)), p);
            }
        }
        assert_eq!(progress(Color::Blue, 2), 15);
        assert_eq!(track_index(Color::Blue, 15), 2);
    }

    #[test]
    fn step_back_clamps_at_own_start() {
        assert_eq!(step_back(Color::Red, 5, 3), 2);
        assert_eq!(step_back(Color::Green, 14, 3), 13);
        assert_eq!(step_back(Color::Blue, 44, 3), 41);
        // Green on cell 5 has travelled 44 cells; no wrap involved.
        assert_eq!(step_back(Color::Green, 5, 3), 2);
    }

    #[test]
    fn classification_covers_every_range() {
        assert_eq!(classify(-1), Cell::Home);
        assert_eq!(classify(0), Cell::Track(0));
        assert_eq!(classify(51), Cell::Track(51));
        assert_eq!(classify(52), Cell::HomeRun(0));
        assert_eq!(classify(56), Cell::HomeRun(4));
        assert_eq!(classify(FINISH_POSITION), Cell::Finish);
        assert_eq!(classify(58), Cell::Invalid);
        assert_eq!(classify(-2), Cell::Invalid);
        assert_eq!(home_run_offset(55), Some(3));
        assert_eq!(home_run_offset(10), None);
        assert_eq!(home_run_position(5), FINISH_POSITION);
    }

    #[test]
    fn special_cells_are_disjoint_and_on_track() {
        for cell in SAFE_CELLS.iter().chain(&TRAP_CELLS).chain(&POWER_UP_CELLS) {
            assert!(is_track(*cell));
        }
        for cell in SAFE_CELLS {
            assert!(!is_trap(cell));
            assert!(!is_power_up_cell(cell));
        }
        for color in Color::ALL {
            assert!(!is_safe(start_offset(color)));
        }
    }
}
