// Persisted entities shared by the draft and scoring engines.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type UserId = i64;
pub type TournamentId = i64;
pub type TeamId = i64;
pub type GroupId = i64;
pub type PickId = i64;
pub type GameResultId = i64;

/// Failure to parse one of the upper-case text enums stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `Display`, `FromStr`, and SQLite text conversion for an enum whose
/// variants are stored under fixed string names.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Tournament lifecycle. Advanced only by an administrator, never by the
/// engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    Setup,
    Drafting,
    Live,
    Completed,
}

text_enum!(TournamentStatus, "tournament status", {
    Setup => "SETUP",
    Drafting => "DRAFTING",
    Live => "LIVE",
    Completed => "COMPLETED",
});

/// Bracket region a team is seeded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    East,
    West,
    South,
    Midwest,
}

text_enum!(Region, "region", {
    East => "East",
    West => "West",
    South => "South",
    Midwest => "Midwest",
});

/// A member's role inside one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipRole {
    Admin,
    Member,
}

text_enum!(MembershipRole, "membership role", {
    Admin => "ADMIN",
    Member => "MEMBER",
});

/// System-wide role resolved by the (external) authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Player,
    GroupAdmin,
    SuperAdmin,
}

text_enum!(Role, "role", {
    Player => "PLAYER",
    GroupAdmin => "GROUP_ADMIN",
    SuperAdmin => "SUPER_ADMIN",
});

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub year: i32,
    pub status: TournamentStatus,
}

/// A bracket entrant. `eliminated` is flipped only by recording or reverting
/// a game result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub tournament_id: TournamentId,
    pub name: String,
    /// 1 (strongest) through 16.
    pub seed: u8,
    pub region: Region,
    pub eliminated: bool,
}

/// A pool of players drafting against one tournament's teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub admin_user_id: Option<UserId>,
}

/// A player's seat in a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: i64,
    pub group_id: GroupId,
    pub user_id: UserId,
    /// Display name of the user, joined in for messages and standings.
    pub user_name: String,
    pub role: MembershipRole,
    /// 1-based draft slot. `None` sorts after every positioned member.
    pub draft_position: Option<u32>,
    /// Running total maintained by the scoring engine.
    pub score: i64,
    pub joined_at: DateTime<Utc>,
    /// Tie-breaker: predicted combined points in the championship game.
    pub final_score_guess: Option<u32>,
    /// Tie-breaker: predicted NIT champion.
    pub nit_winner_guess: Option<String>,
}

/// Immutable record that a member owns a team within one group's draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPick {
    pub id: PickId,
    pub group_id: GroupId,
    pub user_id: UserId,
    pub team_id: TeamId,
    /// 1-based draft round.
    pub round: u32,
    /// 1-based pick number within the round.
    pub pick_number: u32,
    pub created_at: DateTime<Utc>,
}

/// Immutable record that one team beat another in a tournament round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub id: GameResultId,
    pub tournament_id: TournamentId,
    pub round: u32,
    pub winner_id: TeamId,
    pub loser_id: TeamId,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Acting identity
// ---------------------------------------------------------------------------

/// The resolved identity behind a mutating call.
///
/// Authentication happens outside this crate; callers pass the user id, the
/// system-wide role, and whether that user administers the group being acted
/// on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    pub is_group_admin: bool,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role, is_group_admin: bool) -> Self {
        Self {
            user_id,
            role,
            is_group_admin,
        }
    }

    /// A plain player with no administrative rights.
    pub fn player(user_id: UserId) -> Self {
        Self::new(user_id, Role::Player, false)
    }

    pub fn super_admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::SuperAdmin, false)
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    /// Whether this actor may act for whoever is on the clock in `group`
    /// (pick on their behalf, undo picks, manage members).
    pub fn administers(&self, group: &Group) -> bool {
        self.is_group_admin
            || self.is_super_admin()
            || group.admin_user_id == Some(self.user_id)
    }

    /// Whether this actor may record or revert tournament results.
    pub fn can_report_results(&self) -> bool {
        matches!(self.role, Role::SuperAdmin | Role::GroupAdmin)
    }
}
