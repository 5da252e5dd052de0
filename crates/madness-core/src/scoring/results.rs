// Record and revert game results.
//
// Both protocols must run inside `Database::unit_of_work`: the result row,
// the loser's elimination flag, and every affected score change together or
// not at all.

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::points::{award, Award};
use crate::db::queries;
use crate::error::{is_constraint_violation, ActionError, Conflict};
use crate::model::{Actor, GameResult, GameResultId, Team, TeamId, TournamentId};

/// Direction of a score change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Recorded,
    Reverted,
}

/// What a record or revert changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreChange {
    pub kind: ChangeKind,
    pub result: GameResult,
    pub award: Award,
    /// Number of memberships whose score moved by `award.total()`.
    pub memberships_adjusted: usize,
}

fn require_reporter(actor: &Actor) -> Result<(), ActionError> {
    if actor.can_report_results() {
        Ok(())
    } else {
        Err(ActionError::Unauthorized(
            "only admins can report game results".into(),
        ))
    }
}

fn require_team(conn: &Connection, tournament_id: TournamentId, team_id: TeamId) -> Result<Team, ActionError> {
    queries::load_team(conn, team_id)?
        .filter(|t| t.tournament_id == tournament_id)
        .ok_or_else(|| {
            ActionError::not_found(format!("team {team_id} in tournament {tournament_id}"))
        })
}

/// Add `delta` to the score of every member, in every group, who drafted
/// `team_id`.
fn credit_owners(conn: &Connection, team_id: TeamId, delta: i64) -> Result<usize, ActionError> {
    let owners = queries::pick_owners(conn, team_id)?;
    for &(group_id, user_id) in &owners {
        queries::adjust_score(conn, group_id, user_id, delta)?;
    }
    Ok(owners.len())
}

/// Record that `winner_id` beat `loser_id` in `round`, eliminate the loser,
/// and credit every owner of the winner.
pub fn record_result(
    conn: &Connection,
    actor: &Actor,
    tournament_id: TournamentId,
    winner_id: TeamId,
    loser_id: TeamId,
    round: u32,
) -> Result<ScoreChange, ActionError> {
    require_reporter(actor)?;
    if round == 0 {
        return Err(ActionError::invalid("round", "must be 1 or greater"));
    }
    if winner_id == loser_id {
        return Err(Conflict::SameTeam.into());
    }
    if queries::load_tournament(conn, tournament_id)?.is_none() {
        return Err(ActionError::not_found(format!("tournament {tournament_id}")));
    }
    let winner = require_team(conn, tournament_id, winner_id)?;
    let loser = require_team(conn, tournament_id, loser_id)?;

    if queries::has_advanced(conn, tournament_id, round, winner_id)? {
        return Err(Conflict::AlreadyAdvanced {
            team_id: winner_id,
            round,
        }
        .into());
    }

    let result = queries::insert_result(conn, tournament_id, round, winner_id, loser_id, Utc::now())
        .map_err(|e| {
            if is_constraint_violation(&e) {
                ActionError::from(Conflict::AlreadyAdvanced {
                    team_id: winner_id,
                    round,
                })
            } else {
                ActionError::from(anyhow::Error::new(e).context("failed to insert game result"))
            }
        })?;

    queries::set_eliminated(conn, loser_id, true)?;

    let award = award(round, winner.seed, loser.seed);
    let memberships_adjusted = credit_owners(conn, winner_id, i64::from(award.total()))?;
    debug!(
        result_id = result.id,
        points = award.total(),
        memberships_adjusted,
        "result recorded"
    );

    Ok(ScoreChange {
        kind: ChangeKind::Recorded,
        result,
        award,
        memberships_adjusted,
    })
}

/// Undo a recorded result: restore the loser, take back exactly the points
/// the result awarded, and delete it.
pub fn revert_result(
    conn: &Connection,
    actor: &Actor,
    result_id: GameResultId,
) -> Result<ScoreChange, ActionError> {
    require_reporter(actor)?;
    let result = queries::load_result(conn, result_id)?
        .ok_or_else(|| ActionError::not_found(format!("game result {result_id}")))?;
    let winner = require_team(conn, result.tournament_id, result.winner_id)?;
    let loser = require_team(conn, result.tournament_id, result.loser_id)?;

    queries::set_eliminated(conn, loser.id, false)?;

    let award = award(result.round, winner.seed, loser.seed);
    let memberships_adjusted = credit_owners(conn, winner.id, -i64::from(award.total()))?;

    queries::delete_result(conn, result.id)?;
    debug!(
        result_id = result.id,
        points = award.total(),
        memberships_adjusted,
        "result reverted"
    );

    Ok(ScoreChange {
        kind: ChangeKind::Reverted,
        result,
        award,
        memberships_adjusted,
    })
}
