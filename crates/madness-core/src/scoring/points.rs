// Point formula for a single game result.
//
// Recording and reverting a result both go through `award`, so the amount
// taken away on revert is always the amount that was given.

use serde::{Deserialize, Serialize};

/// Base points per tournament round. Rounds not listed are worth nothing.
pub const ROUND_POINTS: [(u32, u32); 6] = [(1, 1), (2, 1), (3, 2), (4, 2), (5, 3), (6, 3)];

pub fn base_points(round: u32) -> u32 {
    ROUND_POINTS
        .iter()
        .find(|(r, _)| *r == round)
        .map_or(0, |(_, points)| *points)
}

/// Group seeds into brackets of three (1-3 is bracket 1, ..., 13-15 is
/// bracket 5) with seed 16 alone in bracket 6. Out-of-range seeds map to 0.
pub fn seed_bracket(seed: u8) -> u32 {
    match seed {
        1..=3 => 1,
        4..=6 => 2,
        7..=9 => 3,
        10..=12 => 4,
        13..=15 => 5,
        16 => 6,
        _ => 0,
    }
}

/// Bracket gap when a weaker-bracket team beats a stronger-bracket one,
/// otherwise zero.
pub fn upset_bonus(winner_seed: u8, loser_seed: u8) -> u32 {
    seed_bracket(winner_seed).saturating_sub(seed_bracket(loser_seed))
}

/// Points a single win is worth to every member who drafted the winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Award {
    pub base: u32,
    pub upset_bonus: u32,
}

impl Award {
    pub fn total(&self) -> u32 {
        self.base + self.upset_bonus
    }
}

pub fn award(round: u32, winner_seed: u8, loser_seed: u8) -> Award {
    Award {
        base: base_points(round),
        upset_bonus: upset_bonus(winner_seed, loser_seed),
    }
}

pub fn total_points(round: u32, winner_seed: u8, loser_seed: u8) -> u32 {
    award(round, winner_seed, loser_seed).total()
}

/// Display name of a tournament round.
pub fn round_label(round: u32) -> &'static str {
    match round {
        1 => "First Round (Round of 64)",
        2 => "Second Round (Round of 32)",
        3 => "Sweet Sixteen",
        4 => "Elite Eight",
        5 => "Final Four",
        6 => "Championship Game",
        _ => "Unknown Round",
    }
}
