// SQLite persistence for tournaments, groups, draft picks, and game results.

pub mod queries;

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use tracing::debug;

use crate::error::{is_constraint_violation, ActionError, Conflict};
use crate::model::{
    Group, GroupId, Membership, MembershipRole, Region, Role, Team, Tournament, TournamentId,
    TournamentStatus, User, UserId,
};

/// Lowest and highest seed a team may carry.
pub const SEED_RANGE: std::ops::RangeInclusive<u8> = 1..=16;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id    INTEGER PRIMARY KEY AUTOINCREMENT,
        name  TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        role  TEXT NOT NULL DEFAULT 'PLAYER'
    );

    CREATE TABLE IF NOT EXISTS tournaments (
        id     INTEGER PRIMARY KEY AUTOINCREMENT,
        name   TEXT NOT NULL UNIQUE,
        year   INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'SETUP'
    );

    CREATE TABLE IF NOT EXISTS teams (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        tournament_id INTEGER NOT NULL REFERENCES tournaments(id) ON DELETE CASCADE,
        name          TEXT NOT NULL,
        seed          INTEGER NOT NULL CHECK (seed BETWEEN 1 AND 16),
        region        TEXT NOT NULL,
        eliminated    INTEGER NOT NULL DEFAULT 0,
        UNIQUE(tournament_id, name)
    );

    CREATE TABLE IF NOT EXISTS draft_groups (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        tournament_id INTEGER NOT NULL REFERENCES tournaments(id) ON DELETE CASCADE,
        name          TEXT NOT NULL,
        admin_user_id INTEGER REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS memberships (
        id                       INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id                 INTEGER NOT NULL REFERENCES draft_groups(id) ON DELETE CASCADE,
        user_id                  INTEGER NOT NULL REFERENCES users(id),
        role                     TEXT NOT NULL DEFAULT 'MEMBER',
        draft_position           INTEGER,
        score                    INTEGER NOT NULL DEFAULT 0,
        joined_at                TEXT NOT NULL,
        final_score_guess        INTEGER,
        nit_winner_guess         TEXT,
        UNIQUE(user_id, group_id)
    );

    CREATE TABLE IF NOT EXISTS draft_picks (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id    INTEGER NOT NULL REFERENCES draft_groups(id) ON DELETE CASCADE,
        user_id     INTEGER NOT NULL REFERENCES users(id),
        team_id     INTEGER NOT NULL REFERENCES teams(id),
        round       INTEGER NOT NULL CHECK (round >= 1),
        pick_number INTEGER NOT NULL CHECK (pick_number >= 1),
        created_at  TEXT NOT NULL,
        UNIQUE(group_id, team_id)
    );

    CREATE INDEX IF NOT EXISTS idx_draft_picks_group_id ON draft_picks(group_id);

    CREATE TABLE IF NOT EXISTS game_results (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        tournament_id INTEGER NOT NULL REFERENCES tournaments(id) ON DELETE CASCADE,
        round         INTEGER NOT NULL CHECK (round >= 1),
        winner_id     INTEGER NOT NULL REFERENCES teams(id),
        loser_id      INTEGER NOT NULL REFERENCES teams(id),
        created_at    TEXT NOT NULL,
        UNIQUE(tournament_id, round, winner_id)
    );

    CREATE INDEX IF NOT EXISTS idx_draft_picks_team_id ON draft_picks(team_id);
    CREATE INDEX IF NOT EXISTS idx_game_results_winner_id ON game_results(winner_id);
";

/// SQLite-backed store for every entity the engines read and write.
///
/// All mutations of scores, elimination flags, picks, and results go through
/// [`Database::unit_of_work`], which holds a write lock for the whole closure.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(SCHEMA)
            .context("failed to create database schema")?;

        debug!("database ready at {path}");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection. A poisoned lock is recovered: any
    /// transaction the panicking thread held was rolled back when it dropped.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `work` as one atomic unit.
    ///
    /// The transaction is opened with `BEGIN IMMEDIATE`, so the write lock is
    /// taken before the first read. Any other connection to the same file
    /// waits (up to the busy timeout) until this unit commits or rolls back,
    /// which makes read-validate-insert sequences serializable. Returning
    /// `Err` from `work` rolls everything back.
    pub fn unit_of_work<T>(
        &self,
        work: impl FnOnce(&Transaction<'_>) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin transaction")?;
        let value = work(&tx)?;
        tx.commit().context("failed to commit transaction")?;
        Ok(value)
    }

    /// Run a read-only query against the connection.
    pub fn read<T, E>(&self, query: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E> {
        let conn = self.conn();
        query(&conn)
    }

    // ------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------

    /// Register a user. Email addresses are unique.
    pub fn create_user(&self, name: &str, email: &str, role: Role) -> Result<User, ActionError> {
        let conn = self.conn();
        let id = insert_unique(
            &conn,
            "INSERT INTO users (name, email, role) VALUES (?1, ?2, ?3)",
            params![name, email, role],
            || format!("user with email {email}"),
        )?;
        Ok(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            role,
        })
    }

    /// Create a tournament in the SETUP state. Names are unique.
    pub fn create_tournament(&self, name: &str, year: i32) -> Result<Tournament, ActionError> {
        let conn = self.conn();
        let status = TournamentStatus::Setup;
        let id = insert_unique(
            &conn,
            "INSERT INTO tournaments (name, year, status) VALUES (?1, ?2, ?3)",
            params![name, year, status],
            || format!("tournament {name}"),
        )?;
        Ok(Tournament {
            id,
            name: name.to_string(),
            year,
            status,
        })
    }

    /// Move a tournament to another lifecycle state.
    pub fn set_tournament_status(
        &self,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> Result<(), ActionError> {
        let conn = self.conn();
        let changed = conn
            .execute(
                "UPDATE tournaments SET status = ?1 WHERE id = ?2",
                params![status, tournament_id],
            )
            .context("failed to update tournament status")?;
        if changed == 0 {
            return Err(ActionError::not_found(format!("tournament {tournament_id}")));
        }
        Ok(())
    }

    /// Add a team to a tournament's bracket.
    pub fn add_team(
        &self,
        tournament_id: TournamentId,
        name: &str,
        seed: u8,
        region: Region,
    ) -> Result<Team, ActionError> {
        if !SEED_RANGE.contains(&seed) {
            return Err(ActionError::invalid(
                "seed",
                format!("must be between 1 and 16, got {seed}"),
            ));
        }
        let conn = self.conn();
        if queries::load_tournament(&conn, tournament_id)?.is_none() {
            return Err(ActionError::not_found(format!("tournament {tournament_id}")));
        }
        let id = insert_unique(
            &conn,
            "INSERT INTO teams (tournament_id, name, seed, region) VALUES (?1, ?2, ?3, ?4)",
            params![tournament_id, name, seed, region],
            || format!("team {name}"),
        )?;
        Ok(Team {
            id,
            tournament_id,
            name: name.to_string(),
            seed,
            region,
            eliminated: false,
        })
    }

    /// Create a drafting group against a tournament.
    pub fn create_group(
        &self,
        tournament_id: TournamentId,
        name: &str,
        admin_user_id: Option<UserId>,
    ) -> Result<Group, ActionError> {
        let conn = self.conn();
        if queries::load_tournament(&conn, tournament_id)?.is_none() {
            return Err(ActionError::not_found(format!("tournament {tournament_id}")));
        }
        conn.execute(
            "INSERT INTO draft_groups (tournament_id, name, admin_user_id) VALUES (?1, ?2, ?3)",
            params![tournament_id, name, admin_user_id],
        )
        .context("failed to create group")?;
        Ok(Group {
            id: conn.last_insert_rowid(),
            tournament_id,
            name: name.to_string(),
            admin_user_id,
        })
    }

    /// Seat a user in a group. A user holds at most one seat per group.
    pub fn add_member(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role: MembershipRole,
        draft_position: Option<u32>,
    ) -> Result<Membership, ActionError> {
        let conn = self.conn();
        if queries::load_group(&conn, group_id)?.is_none() {
            return Err(ActionError::not_found(format!("group {group_id}")));
        }
        let user = queries::load_user(&conn, user_id)?
            .ok_or_else(|| ActionError::not_found(format!("user {user_id}")))?;
        let joined_at = Utc::now();
        let id = insert_unique(
            &conn,
            "INSERT INTO memberships (group_id, user_id, role, draft_position, joined_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![group_id, user_id, role, draft_position, joined_at],
            || format!("membership of user {user_id} in group {group_id}"),
        )?;
        Ok(Membership {
            id,
            group_id,
            user_id,
            user_name: user.name,
            role,
            draft_position,
            score: 0,
            joined_at,
            final_score_guess: None,
            nit_winner_guess: None,
        })
    }
}

/// Execute an INSERT and return the new row id, reporting a uniqueness
/// violation as a [`Conflict::Duplicate`].
fn insert_unique(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
    what: impl FnOnce() -> String,
) -> Result<i64, ActionError> {
    match conn.execute(sql, params) {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if is_constraint_violation(&e) => Err(Conflict::Duplicate { what: what() }.into()),
        Err(e) => Err(anyhow::Error::new(e).context("failed to insert row").into()),
    }
}
