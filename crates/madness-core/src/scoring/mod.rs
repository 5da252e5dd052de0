// Tournament scoring: point formula, result protocols, and standings.

pub mod points;
pub mod results;
pub mod standings;

pub use points::{award, base_points, round_label, seed_bracket, total_points, upset_bonus, Award};
pub use results::{record_result, revert_result, ChangeKind, ScoreChange};
pub use standings::{
    group_standings, points_by_team, recomputed_score, roster, tournament_standings, RosterEntry,
    Standing,
};
