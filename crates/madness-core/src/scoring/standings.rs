// Read path: scores recomputed from picks and results, rosters, standings.
//
// Nothing here reads `Membership::score`'s history; points are derived from
// the stored results alone, so these totals double as an audit of the running
// scores the record/revert protocols maintain.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::points::total_points;
use crate::db::queries;
use crate::draft::board::require_group;
use crate::error::ActionError;
use crate::model::{DraftPick, GameResult, GroupId, Membership, Team, TeamId, TournamentId, UserId};

/// Points each team has earned from the given results. Results whose teams
/// are not in `teams` are ignored.
pub fn points_by_team(teams: &[Team], results: &[GameResult]) -> HashMap<TeamId, u32> {
    let seeds: HashMap<TeamId, u8> = teams.iter().map(|t| (t.id, t.seed)).collect();
    let mut points = HashMap::new();
    for result in results {
        let (Some(&winner_seed), Some(&loser_seed)) =
            (seeds.get(&result.winner_id), seeds.get(&result.loser_id))
        else {
            continue;
        };
        *points.entry(result.winner_id).or_insert(0) +=
            total_points(result.round, winner_seed, loser_seed);
    }
    points
}

/// One drafted team with what it has earned so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub pick: DraftPick,
    pub team: Team,
    pub points: u32,
}

/// A row in a standings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based; members level on score and teams alive share a rank.
    pub rank: usize,
    pub group_id: GroupId,
    pub user_id: UserId,
    pub user_name: String,
    pub score: i64,
    /// Drafted teams not yet eliminated.
    pub teams_alive: usize,
}

/// Teams and per-team points for a tournament, loaded once per read.
struct Scoreboard {
    teams: HashMap<TeamId, Team>,
    points: HashMap<TeamId, u32>,
}

impl Scoreboard {
    fn load(conn: &Connection, tournament_id: TournamentId) -> Result<Self, ActionError> {
        let teams = queries::load_teams(conn, tournament_id)?;
        let results = queries::load_results(conn, tournament_id)?;
        let points = points_by_team(&teams, &results);
        Ok(Self {
            teams: teams.into_iter().map(|t| (t.id, t)).collect(),
            points,
        })
    }

    fn roster(&self, picks: Vec<DraftPick>) -> Vec<RosterEntry> {
        picks
            .into_iter()
            .filter_map(|pick| {
                let team = self.teams.get(&pick.team_id)?.clone();
                let points = self.points.get(&pick.team_id).copied().unwrap_or(0);
                Some(RosterEntry { pick, team, points })
            })
            .collect()
    }
}

/// A member's drafted teams, in draft order, with per-team points.
pub fn roster(
    conn: &Connection,
    group_id: GroupId,
    user_id: UserId,
) -> Result<Vec<RosterEntry>, ActionError> {
    let group = require_group(conn, group_id)?;
    let board = Scoreboard::load(conn, group.tournament_id)?;
    Ok(board.roster(queries::load_user_picks(conn, group_id, user_id)?))
}

/// A member's total recomputed from scratch. Always equal to the stored
/// running score after any sequence of record and revert operations.
pub fn recomputed_score(conn: &Connection, group_id: GroupId, user_id: UserId) -> Result<i64, ActionError> {
    Ok(roster(conn, group_id, user_id)?
        .iter()
        .map(|entry| i64::from(entry.points))
        .sum())
}

fn rank(conn: &Connection, board: &Scoreboard, members: Vec<Membership>) -> Result<Vec<Standing>, ActionError> {
    let mut rows = Vec::with_capacity(members.len());
    for member in members {
        let picks = queries::load_user_picks(conn, member.group_id, member.user_id)?;
        let teams_alive = board
            .roster(picks)
            .iter()
            .filter(|entry| !entry.team.eliminated)
            .count();
        rows.push(Standing {
            rank: 0,
            group_id: member.group_id,
            user_id: member.user_id,
            user_name: member.user_name,
            score: member.score,
            teams_alive,
        });
    }

    rows.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.teams_alive.cmp(&a.teams_alive))
            .then_with(|| a.user_name.cmp(&b.user_name))
    });
    for i in 0..rows.len() {
        let tied = i > 0
            && rows[i].score == rows[i - 1].score
            && rows[i].teams_alive == rows[i - 1].teams_alive;
        rows[i].rank = if tied {
            rows[i - 1].rank
        } else {
            i + 1
        };
    }
    Ok(rows)
}

/// Members of one group by score, highest first, then by teams still alive.
pub fn group_standings(conn: &Connection, group_id: GroupId) -> Result<Vec<Standing>, ActionError> {
    let group = require_group(conn, group_id)?;
    let board = Scoreboard::load(conn, group.tournament_id)?;
    rank(conn, &board, queries::load_memberships(conn, group_id)?)
}

/// Members of every group in a tournament by score, highest first, then by
/// teams still alive.
pub fn tournament_standings(
    conn: &Connection,
    tournament_id: TournamentId,
) -> Result<Vec<Standing>, ActionError> {
    if queries::load_tournament(conn, tournament_id)?.is_none() {
        return Err(ActionError::not_found(format!("tournament {tournament_id}")));
    }
    let board = Scoreboard::load(conn, tournament_id)?;
    rank(conn, &board, queries::load_tournament_memberships(conn, tournament_id)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Region;
    use chrono::Utc;

    fn team(id: TeamId, seed: u8) -> Team {
        Team {
            id,
            tournament_id: 1,
            name: format!("Team {id}"),
            seed,
            region: Region::South,
            eliminated: false,
        }
    }

    fn result(id: i64, round: u32, winner_id: TeamId, loser_id: TeamId) -> GameResult {
        GameResult {
            id,
            tournament_id: 1,
            round,
            winner_id,
            loser_id,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn points_accumulate_across_rounds() {
        let teams = vec![team(1, 14), team(2, 3), team(3, 6), team(4, 11)];
        let results = vec![
            result(1, 1, 1, 2), // 1 base + 4 bonus
            result(2, 1, 3, 4), // 1 base, favourite
            result(3, 2, 1, 3), // 1 base + 3 bonus
        ];
        let points = points_by_team(&teams, &results);
        assert_eq!(points.get(&1), Some(&9));
        assert_eq!(points.get(&3), Some(&1));
        assert_eq!(points.get(&2), None);
    }

    #[test]
    fn results_with_unknown_teams_are_skipped() {
        let teams = vec![team(1, 1)];
        let points = points_by_team(&teams, &[result(1, 1, 1, 99)]);
        assert!(points.is_empty());
    }
}
