//! Scoring module - trio and level-clear points
//!
//! | Event | Points |
//! |-------|--------|
//! | Trio | `100 + 50 * (level - 1)` |
//! | Level clear | `1500 + 75 * seconds_left + 200 * (level - 1)` |

use crate::types::{
    TRIO_BASE_SCORE, TRIO_LEVEL_BONUS, VICTORY_BASE_BONUS, VICTORY_LEVEL_BONUS,
    VICTORY_TIME_BONUS,
};

fn levels_above_first(level: u32) -> u32 {
    level.max(1) - 1
}

/// Points for clearing one trio at `level`.
pub fn trio_score(level: u32) -> u32 {
    TRIO_BASE_SCORE.saturating_add(TRIO_LEVEL_BONUS.saturating_mul(levels_above_first(level)))
}

/// Completion bonus for clearing `level` with `seconds_left` on the countdown.
pub fn victory_bonus(level: u32, seconds_left: u32) -> u32 {
    VICTORY_BASE_BONUS
        .saturating_add(VICTORY_TIME_BONUS.saturating_mul(seconds_left))
        .saturating_add(VICTORY_LEVEL_BONUS.saturating_mul(levels_above_first(level)))
}
