// Entry points for the surrounding application.
//
// Each mutating call runs as one unit of work and is logged once at this
// boundary. Read calls go straight to the connection.

use tracing::{error, info, warn};

use crate::db::Database;
use crate::draft::{self, PickReceipt, ResetReport, ResetScope, Turn};
use crate::error::ActionError;
use crate::model::{Actor, DraftPick, GameResultId, GroupId, Team, TeamId, TournamentId, UserId};
use crate::scoring::{self, RosterEntry, ScoreChange, Standing};

/// Runs the draft and keeps score for every group in the database.
pub struct Commissioner {
    db: Database,
}

/// Log a rejected or failed operation. Successful operations log their own
/// details.
fn traced<T>(operation: &'static str, outcome: Result<T, ActionError>) -> Result<T, ActionError> {
    if let Err(e) = &outcome {
        if e.is_recoverable() {
            warn!(operation, kind = ?e.kind(), "rejected: {e}");
        } else {
            error!(operation, "failed: {e}");
        }
    }
    outcome
}

impl Commissioner {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Direct access to the store, for setup and tests.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // ------------------------------------------------------------------
    // Draft
    // ------------------------------------------------------------------

    pub fn submit_pick(
        &self,
        actor: &Actor,
        group_id: GroupId,
        team_id: TeamId,
    ) -> Result<PickReceipt, ActionError> {
        let receipt = traced(
            "submit_pick",
            self.db
                .unit_of_work(|tx| draft::submit_pick(tx, actor, group_id, team_id)),
        )?;
        info!(
            group_id,
            team_id,
            actor = actor.user_id,
            owner = receipt.pick.user_id,
            overall = receipt.overall,
            "pick recorded"
        );
        Ok(receipt)
    }

    pub fn undo_last_pick(&self, actor: &Actor, group_id: GroupId) -> Result<DraftPick, ActionError> {
        let pick = traced(
            "undo_last_pick",
            self.db
                .unit_of_work(|tx| draft::undo_last_pick(tx, actor, group_id)),
        )?;
        info!(
            group_id,
            team_id = pick.team_id,
            round = pick.round,
            pick_number = pick.pick_number,
            "pick undone"
        );
        Ok(pick)
    }

    pub fn reset_draft(&self, actor: &Actor, scope: ResetScope) -> Result<ResetReport, ActionError> {
        let report = traced(
            "reset_draft",
            self.db.unit_of_work(|tx| draft::reset_draft(tx, actor, scope)),
        )?;
        info!(scope = ?report.scope, deleted = report.deleted_picks, "draft reset");
        Ok(report)
    }

    pub fn set_draft_position(
        &self,
        actor: &Actor,
        group_id: GroupId,
        user_id: UserId,
        position: u32,
    ) -> Result<(), ActionError> {
        traced(
            "set_draft_position",
            self.db.unit_of_work(|tx| {
                draft::set_draft_position(tx, actor, group_id, user_id, position)
            }),
        )?;
        info!(group_id, user_id, position, "draft position set");
        Ok(())
    }

    pub fn remove_member(
        &self,
        actor: &Actor,
        group_id: GroupId,
        user_id: UserId,
    ) -> Result<usize, ActionError> {
        let removed = traced(
            "remove_member",
            self.db
                .unit_of_work(|tx| draft::remove_member(tx, actor, group_id, user_id)),
        )?;
        info!(group_id, user_id, removed_picks = removed, "member removed");
        Ok(removed)
    }

    pub fn submit_tiebreaker(
        &self,
        actor: &Actor,
        group_id: GroupId,
        target_user_id: Option<UserId>,
        final_score_guess: u32,
        nit_winner_guess: &str,
    ) -> Result<(), ActionError> {
        traced(
            "submit_tiebreaker",
            self.db.unit_of_work(|tx| {
                draft::submit_tiebreaker(
                    tx,
                    actor,
                    group_id,
                    target_user_id,
                    final_score_guess,
                    nit_winner_guess,
                )
            }),
        )?;
        info!(
            group_id,
            actor = actor.user_id,
            user_id = target_user_id.unwrap_or(actor.user_id),
            "tie-breaker recorded"
        );
        Ok(())
    }

    pub fn current_picker(&self, group_id: GroupId) -> Result<Option<Turn>, ActionError> {
        self.db.read(|conn| draft::current_picker(conn, group_id))
    }

    pub fn available_teams(&self, group_id: GroupId) -> Result<Vec<Team>, ActionError> {
        self.db.read(|conn| draft::available_teams(conn, group_id))
    }

    pub fn draft_log(&self, group_id: GroupId) -> Result<Vec<DraftPick>, ActionError> {
        self.db.read(|conn| draft::draft_log(conn, group_id))
    }

    // ------------------------------------------------------------------
    // Scoring
    // ------------------------------------------------------------------

    pub fn record_result(
        &self,
        actor: &Actor,
        tournament_id: TournamentId,
        winner_id: TeamId,
        loser_id: TeamId,
        round: u32,
    ) -> Result<ScoreChange, ActionError> {
        let change = traced(
            "record_result",
            self.db.unit_of_work(|tx| {
                scoring::record_result(tx, actor, tournament_id, winner_id, loser_id, round)
            }),
        )?;
        info!(
            tournament_id,
            result_id = change.result.id,
            round,
            winner_id,
            loser_id,
            points = change.award.total(),
            memberships = change.memberships_adjusted,
            "result recorded"
        );
        Ok(change)
    }

    pub fn revert_result(
        &self,
        actor: &Actor,
        result_id: GameResultId,
    ) -> Result<ScoreChange, ActionError> {
        let change = traced(
            "revert_result",
            self.db
                .unit_of_work(|tx| scoring::revert_result(tx, actor, result_id)),
        )?;
        info!(
            result_id,
            points = change.award.total(),
            memberships = change.memberships_adjusted,
            "result reverted"
        );
        Ok(change)
    }

    pub fn roster(&self, group_id: GroupId, user_id: UserId) -> Result<Vec<RosterEntry>, ActionError> {
        self.db.read(|conn| scoring::roster(conn, group_id, user_id))
    }

    pub fn recomputed_score(&self, group_id: GroupId, user_id: UserId) -> Result<i64, ActionError> {
        self.db
            .read(|conn| scoring::recomputed_score(conn, group_id, user_id))
    }

    pub fn group_standings(&self, group_id: GroupId) -> Result<Vec<Standing>, ActionError> {
        self.db.read(|conn| scoring::group_standings(conn, group_id))
    }

    pub fn tournament_standings(
        &self,
        tournament_id: TournamentId,
    ) -> Result<Vec<Standing>, ActionError> {
        self.db
            .read(|conn| scoring::tournament_standings(conn, tournament_id))
    }
}
