// Row-level reads and writes used by the engines.
//
// Every function takes a plain `&Connection` so it can run either inside a
// unit of work (a `Transaction` derefs to `Connection`) or on a read path.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::draft::ResetScope;
use crate::model::{
    DraftPick, GameResult, GameResultId, Group, GroupId, Membership, PickId, Team, TeamId,
    Tournament, TournamentId, User, UserId,
};

// ---------------------------------------------------------------------------
// Row mappers
// ---------------------------------------------------------------------------

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: row.get(3)?,
    })
}

fn tournament_from_row(row: &Row<'_>) -> rusqlite::Result<Tournament> {
    Ok(Tournament {
        id: row.get(0)?,
        name: row.get(1)?,
        year: row.get(2)?,
        status: row.get(3)?,
    })
}

const TEAM_COLUMNS: &str = "id, tournament_id, name, seed, region, eliminated";

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        tournament_id: row.get(1)?,
        name: row.get(2)?,
        seed: row.get(3)?,
        region: row.get(4)?,
        eliminated: row.get(5)?,
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        tournament_id: row.get(1)?,
        name: row.get(2)?,
        admin_user_id: row.get(3)?,
    })
}

const MEMBERSHIP_SELECT: &str = "
    SELECT m.id, m.group_id, m.user_id, u.name, m.role, m.draft_position, m.score,
           m.joined_at, m.final_score_guess, m.nit_winner_guess
    FROM memberships m
    JOIN users u ON u.id = m.user_id";

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        id: row.get(0)?,
        group_id: row.get(1)?,
        user_id: row.get(2)?,
        user_name: row.get(3)?,
        role: row.get(4)?,
        draft_position: row.get(5)?,
        score: row.get(6)?,
        joined_at: row.get(7)?,
        final_score_guess: row.get(8)?,
        nit_winner_guess: row.get(9)?,
    })
}

const PICK_COLUMNS: &str = "id, group_id, user_id, team_id, round, pick_number, created_at";

fn pick_from_row(row: &Row<'_>) -> rusqlite::Result<DraftPick> {
    Ok(DraftPick {
        id: row.get(0)?,
        group_id: row.get(1)?,
        user_id: row.get(2)?,
        team_id: row.get(3)?,
        round: row.get(4)?,
        pick_number: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const RESULT_COLUMNS: &str = "id, tournament_id, round, winner_id, loser_id, created_at";

fn result_from_row(row: &Row<'_>) -> rusqlite::Result<GameResult> {
    Ok(GameResult {
        id: row.get(0)?,
        tournament_id: row.get(1)?,
        round: row.get(2)?,
        winner_id: row.get(3)?,
        loser_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

// ---------------------------------------------------------------------------
// Users, tournaments, teams, groups
// ---------------------------------------------------------------------------

pub fn load_user(conn: &Connection, user_id: UserId) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, name, email, role FROM users WHERE id = ?1",
        params![user_id],
        user_from_row,
    )
    .optional()
    .context("failed to load user")
}

pub fn load_tournament(conn: &Connection, tournament_id: TournamentId) -> Result<Option<Tournament>> {
    conn.query_row(
        "SELECT id, name, year, status FROM tournaments WHERE id = ?1",
        params![tournament_id],
        tournament_from_row,
    )
    .optional()
    .context("failed to load tournament")
}

pub fn load_team(conn: &Connection, team_id: TeamId) -> Result<Option<Team>> {
    conn.query_row(
        &format!("SELECT {TEAM_COLUMNS} FROM teams WHERE id = ?1"),
        params![team_id],
        team_from_row,
    )
    .optional()
    .context("failed to load team")
}

/// All teams of a tournament, strongest seed first.
pub fn load_teams(conn: &Connection, tournament_id: TournamentId) -> Result<Vec<Team>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams WHERE tournament_id = ?1 ORDER BY seed, name"
        ))
        .context("failed to prepare load_teams query")?;
    let teams = stmt
        .query_map(params![tournament_id], team_from_row)
        .context("failed to query teams")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to map team rows")?;
    Ok(teams)
}

/// Teams of the group's tournament that nobody in the group has drafted.
pub fn load_undrafted_teams(conn: &Connection, group: &Group) -> Result<Vec<Team>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams
             WHERE tournament_id = ?1
               AND id NOT IN (SELECT team_id FROM draft_picks WHERE group_id = ?2)
             ORDER BY seed, name"
        ))
        .context("failed to prepare load_undrafted_teams query")?;
    let teams = stmt
        .query_map(params![group.tournament_id, group.id], team_from_row)
        .context("failed to query undrafted teams")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to map team rows")?;
    Ok(teams)
}

pub fn set_eliminated(conn: &Connection, team_id: TeamId, eliminated: bool) -> Result<()> {
    conn.execute(
        "UPDATE teams SET eliminated = ?1 WHERE id = ?2",
        params![eliminated, team_id],
    )
    .context("failed to update team elimination")?;
    Ok(())
}

pub fn load_group(conn: &Connection, group_id: GroupId) -> Result<Option<Group>> {
    conn.query_row(
        "SELECT id, tournament_id, name, admin_user_id FROM draft_groups WHERE id = ?1",
        params![group_id],
        group_from_row,
    )
    .optional()
    .context("failed to load group")
}

// ---------------------------------------------------------------------------
// Memberships
// ---------------------------------------------------------------------------

/// Memberships of a group in storage order. Callers sort into draft order.
pub fn load_memberships(conn: &Connection, group_id: GroupId) -> Result<Vec<Membership>> {
    let mut stmt = conn
        .prepare(&format!("{MEMBERSHIP_SELECT} WHERE m.group_id = ?1 ORDER BY m.id"))
        .context("failed to prepare load_memberships query")?;
    let members = stmt
        .query_map(params![group_id], membership_from_row)
        .context("failed to query memberships")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to map membership rows")?;
    Ok(members)
}

/// Memberships of every group drafting against `tournament_id`.
pub fn load_tournament_memberships(
    conn: &Connection,
    tournament_id: TournamentId,
) -> Result<Vec<Membership>> {
    let mut stmt = conn
        .prepare(&format!(
            "{MEMBERSHIP_SELECT}
             JOIN draft_groups g ON g.id = m.group_id
             WHERE g.tournament_id = ?1
             ORDER BY m.id"
        ))
        .context("failed to prepare load_tournament_memberships query")?;
    let members = stmt
        .query_map(params![tournament_id], membership_from_row)
        .context("failed to query tournament memberships")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to map membership rows")?;
    Ok(members)
}

pub fn load_membership(
    conn: &Connection,
    group_id: GroupId,
    user_id: UserId,
) -> Result<Option<Membership>> {
    conn.query_row(
        &format!("{MEMBERSHIP_SELECT} WHERE m.group_id = ?1 AND m.user_id = ?2"),
        params![group_id, user_id],
        membership_from_row,
    )
    .optional()
    .context("failed to load membership")
}

/// Add `delta` to a member's running score.
pub fn adjust_score(conn: &Connection, group_id: GroupId, user_id: UserId, delta: i64) -> Result<()> {
    conn.execute(
        "UPDATE memberships SET score = score + ?1 WHERE group_id = ?2 AND user_id = ?3",
        params![delta, group_id, user_id],
    )
    .context("failed to adjust membership score")?;
    Ok(())
}

/// Returns `false` when no such membership exists.
pub fn set_draft_position(
    conn: &Connection,
    group_id: GroupId,
    user_id: UserId,
    position: u32,
) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE memberships SET draft_position = ?1 WHERE group_id = ?2 AND user_id = ?3",
            params![position, group_id, user_id],
        )
        .context("failed to update draft position")?;
    Ok(changed > 0)
}

pub fn set_tiebreaker(
    conn: &Connection,
    group_id: GroupId,
    user_id: UserId,
    final_score_guess: u32,
    nit_winner_guess: &str,
) -> Result<()> {
    conn.execute(
        "UPDATE memberships
         SET final_score_guess = ?1, nit_winner_guess = ?2
         WHERE group_id = ?3 AND user_id = ?4",
        params![final_score_guess, nit_winner_guess, group_id, user_id],
    )
    .context("failed to record tie-breaker")?;
    Ok(())
}

/// Returns `false` when no such membership exists.
pub fn delete_membership(conn: &Connection, group_id: GroupId, user_id: UserId) -> Result<bool> {
    let changed = conn
        .execute(
            "DELETE FROM memberships WHERE group_id = ?1 AND user_id = ?2",
            params![group_id, user_id],
        )
        .context("failed to delete membership")?;
    Ok(changed > 0)
}

// ---------------------------------------------------------------------------
// Draft picks
// ---------------------------------------------------------------------------

pub fn count_picks(conn: &Connection, group_id: GroupId) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM draft_picks WHERE group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )
        .context("failed to count draft picks")?;
    Ok(count as usize)
}

pub fn count_user_picks(conn: &Connection, group_id: GroupId, user_id: UserId) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM draft_picks WHERE group_id = ?1 AND user_id = ?2",
            params![group_id, user_id],
            |row| row.get(0),
        )
        .context("failed to count member picks")?;
    Ok(count as usize)
}

/// Whether anyone in the group already holds `team_id`.
pub fn team_is_taken(conn: &Connection, group_id: GroupId, team_id: TeamId) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM draft_picks WHERE group_id = ?1 AND team_id = ?2)",
        params![group_id, team_id],
        |row| row.get(0),
    )
    .context("failed to check team availability")
}

/// Insert a pick. The raw rusqlite error is returned so callers can tell a
/// uniqueness violation apart from other failures.
pub fn insert_pick(
    conn: &Connection,
    group_id: GroupId,
    user_id: UserId,
    team_id: TeamId,
    round: u32,
    pick_number: u32,
    created_at: DateTime<Utc>,
) -> rusqlite::Result<DraftPick> {
    conn.execute(
        "INSERT INTO draft_picks (group_id, user_id, team_id, round, pick_number, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![group_id, user_id, team_id, round, pick_number, created_at],
    )?;
    Ok(DraftPick {
        id: conn.last_insert_rowid(),
        group_id,
        user_id,
        team_id,
        round,
        pick_number,
        created_at,
    })
}

/// A group's picks in draft order.
pub fn load_picks(conn: &Connection, group_id: GroupId) -> Result<Vec<DraftPick>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PICK_COLUMNS} FROM draft_picks WHERE group_id = ?1
             ORDER BY round, pick_number, created_at, id"
        ))
        .context("failed to prepare load_picks query")?;
    let picks = stmt
        .query_map(params![group_id], pick_from_row)
        .context("failed to query draft picks")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to map draft pick rows")?;
    Ok(picks)
}

/// One member's picks in draft order.
pub fn load_user_picks(conn: &Connection, group_id: GroupId, user_id: UserId) -> Result<Vec<DraftPick>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {PICK_COLUMNS} FROM draft_picks WHERE group_id = ?1 AND user_id = ?2
             ORDER BY round, pick_number, created_at, id"
        ))
        .context("failed to prepare load_user_picks query")?;
    let picks = stmt
        .query_map(params![group_id, user_id], pick_from_row)
        .context("failed to query member picks")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to map draft pick rows")?;
    Ok(picks)
}

/// The most recent pick by round, pick-in-round, then creation time.
pub fn last_pick(conn: &Connection, group_id: GroupId) -> Result<Option<DraftPick>> {
    conn.query_row(
        &format!(
            "SELECT {PICK_COLUMNS} FROM draft_picks WHERE group_id = ?1
             ORDER BY round DESC, pick_number DESC, created_at DESC, id DESC
             LIMIT 1"
        ),
        params![group_id],
        pick_from_row,
    )
    .optional()
    .context("failed to load last pick")
}

pub fn delete_pick(conn: &Connection, pick_id: PickId) -> Result<()> {
    conn.execute("DELETE FROM draft_picks WHERE id = ?1", params![pick_id])
        .context("failed to delete draft pick")?;
    Ok(())
}

/// Delete every pick in `scope`, returning how many were removed.
pub fn delete_picks(conn: &Connection, scope: ResetScope) -> Result<usize> {
    let deleted = match scope {
        ResetScope::All => conn.execute("DELETE FROM draft_picks", []),
        ResetScope::Tournament(tournament_id) => conn.execute(
            "DELETE FROM draft_picks
             WHERE group_id IN (SELECT id FROM draft_groups WHERE tournament_id = ?1)",
            params![tournament_id],
        ),
        ResetScope::Group(group_id) => conn.execute(
            "DELETE FROM draft_picks WHERE group_id = ?1",
            params![group_id],
        ),
    }
    .context("failed to delete draft picks")?;
    Ok(deleted)
}

pub fn delete_member_picks(conn: &Connection, group_id: GroupId, user_id: UserId) -> Result<usize> {
    conn.execute(
        "DELETE FROM draft_picks WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
    )
    .context("failed to delete member picks")
}

/// `(group_id, user_id)` of every member, in any group, who drafted `team_id`.
pub fn pick_owners(conn: &Connection, team_id: TeamId) -> Result<Vec<(GroupId, UserId)>> {
    let mut stmt = conn
        .prepare("SELECT group_id, user_id FROM draft_picks WHERE team_id = ?1 ORDER BY id")
        .context("failed to prepare pick_owners query")?;
    let owners = stmt
        .query_map(params![team_id], |row| Ok((row.get(0)?, row.get(1)?)))
        .context("failed to query pick owners")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to map pick owner rows")?;
    Ok(owners)
}

// ---------------------------------------------------------------------------
// Game results
// ---------------------------------------------------------------------------

/// Whether `team_id` already has a recorded win in `round`.
pub fn has_advanced(
    conn: &Connection,
    tournament_id: TournamentId,
    round: u32,
    team_id: TeamId,
) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM game_results
                       WHERE tournament_id = ?1 AND round = ?2 AND winner_id = ?3)",
        params![tournament_id, round, team_id],
        |row| row.get(0),
    )
    .context("failed to check prior advancement")
}

pub fn insert_result(
    conn: &Connection,
    tournament_id: TournamentId,
    round: u32,
    winner_id: TeamId,
    loser_id: TeamId,
    created_at: DateTime<Utc>,
) -> rusqlite::Result<GameResult> {
    conn.execute(
        "INSERT INTO game_results (tournament_id, round, winner_id, loser_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![tournament_id, round, winner_id, loser_id, created_at],
    )?;
    Ok(GameResult {
        id: conn.last_insert_rowid(),
        tournament_id,
        round,
        winner_id,
        loser_id,
        created_at,
    })
}

pub fn load_result(conn: &Connection, result_id: GameResultId) -> Result<Option<GameResult>> {
    conn.query_row(
        &format!("SELECT {RESULT_COLUMNS} FROM game_results WHERE id = ?1"),
        params![result_id],
        result_from_row,
    )
    .optional()
    .context("failed to load game result")
}

/// A tournament's results by round, then recording order.
pub fn load_results(conn: &Connection, tournament_id: TournamentId) -> Result<Vec<GameResult>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {RESULT_COLUMNS} FROM game_results WHERE tournament_id = ?1
             ORDER BY round, created_at, id"
        ))
        .context("failed to prepare load_results query")?;
    let results = stmt
        .query_map(params![tournament_id], result_from_row)
        .context("failed to query game results")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to map game result rows")?;
    Ok(results)
}

pub fn delete_result(conn: &Connection, result_id: GameResultId) -> Result<()> {
    conn.execute("DELETE FROM game_results WHERE id = ?1", params![result_id])
        .context("failed to delete game result")?;
    Ok(())
}
