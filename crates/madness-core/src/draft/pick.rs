// Pick submission, undo, and reset protocols.
//
// Each function must run inside `Database::unit_of_work` so that the pick
// count, team availability, and roster size it reads cannot change before
// its own insert or delete commits.

use chrono::Utc;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::board::{acts_as_admin, require_group, turn_after};
use super::order::{self, ROSTER_SIZE};
use crate::db::queries;
use crate::error::{is_constraint_violation, ActionError, Conflict};
use crate::model::{Actor, DraftPick, GroupId, TeamId, TournamentId};

/// A successfully recorded pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickReceipt {
    pub pick: DraftPick,
    /// 1-based overall pick number in the group's draft.
    pub overall: usize,
    /// Name of the member the pick is attributed to.
    pub owner_name: String,
}

/// Which picks a reset clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetScope {
    All,
    Tournament(TournamentId),
    Group(GroupId),
}

/// Outcome of a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetReport {
    pub scope: ResetScope,
    pub deleted_picks: usize,
}

/// Draft `team_id` for whoever is on the clock in `group_id`.
///
/// A player may only pick on their own turn. A group administrator or super
/// admin may pick at any time; the pick is then recorded for the member on
/// the clock, not for the administrator.
pub fn submit_pick(
    conn: &Connection,
    actor: &Actor,
    group_id: GroupId,
    team_id: TeamId,
) -> Result<PickReceipt, ActionError> {
    let group = require_group(conn, group_id)?;
    let team = queries::load_team(conn, team_id)?
        .filter(|t| t.tournament_id == group.tournament_id)
        .ok_or_else(|| ActionError::not_found(format!("team {team_id} in group {group_id}")))?;

    let members = order::draft_order(queries::load_memberships(conn, group_id)?);
    let picks_made = queries::count_picks(conn, group_id)?;
    let turn = turn_after(&members, picks_made)
        .ok_or_else(|| ActionError::invalid("group", "group has no members to draft"))?;
    let picker = turn.member;

    if picker.user_id != actor.user_id && !acts_as_admin(conn, actor, &group)? {
        return Err(ActionError::OutOfTurn {
            expected: picker.user_name,
            expected_user_id: picker.user_id,
        });
    }

    if queries::team_is_taken(conn, group_id, team_id)? {
        return Err(Conflict::TeamTaken { team_id }.into());
    }

    if queries::count_user_picks(conn, group_id, picker.user_id)? >= ROSTER_SIZE {
        return Err(Conflict::RosterFull {
            user_id: picker.user_id,
            player: picker.user_name,
            limit: ROSTER_SIZE,
        }
        .into());
    }

    let pick = queries::insert_pick(
        conn,
        group_id,
        picker.user_id,
        team.id,
        turn.slot.round,
        turn.slot.pick_number,
        Utc::now(),
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            ActionError::from(Conflict::DraftChanged)
        } else {
            ActionError::from(anyhow::Error::new(e).context("failed to insert draft pick"))
        }
    })?;

    debug!(
        group_id,
        overall = turn.overall,
        round = pick.round,
        pick_number = pick.pick_number,
        "pick inserted"
    );

    Ok(PickReceipt {
        pick,
        overall: turn.overall,
        owner_name: picker.user_name,
    })
}

/// Delete the most recent pick in `group_id`. Administrators only.
///
/// Remaining picks keep their stored round and pick number; the next
/// submission derives its slot from the new pick count.
pub fn undo_last_pick(
    conn: &Connection,
    actor: &Actor,
    group_id: GroupId,
) -> Result<DraftPick, ActionError> {
    let group = require_group(conn, group_id)?;
    if !acts_as_admin(conn, actor, &group)? {
        return Err(ActionError::Unauthorized(
            "only admins can undo picks".into(),
        ));
    }

    let last = queries::last_pick(conn, group_id)?
        .ok_or_else(|| ActionError::not_found(format!("draft pick to undo in group {group_id}")))?;
    queries::delete_pick(conn, last.id)?;
    Ok(last)
}

/// Delete every pick in `scope`. Super admins only. Scores are not touched.
pub fn reset_draft(
    conn: &Connection,
    actor: &Actor,
    scope: ResetScope,
) -> Result<ResetReport, ActionError> {
    if !actor.is_super_admin() {
        return Err(ActionError::Unauthorized(
            "only super admins can reset the draft".into(),
        ));
    }
    match scope {
        ResetScope::All => {}
        ResetScope::Tournament(id) => {
            if queries::load_tournament(conn, id)?.is_none() {
                return Err(ActionError::not_found(format!("tournament {id}")));
            }
        }
        ResetScope::Group(id) => {
            require_group(conn, id)?;
        }
    }
    let deleted_picks = queries::delete_picks(conn, scope)?;
    Ok(ResetReport {
        scope,
        deleted_picks,
    })
}
