// Failure taxonomy for draft and scoring operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{TeamId, UserId};

/// A request that collides with existing state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("Team already taken")]
    TeamTaken { team_id: TeamId },

    #[error("{player} has already picked {limit} teams")]
    RosterFull {
        user_id: UserId,
        player: String,
        limit: usize,
    },

    #[error("This team has already advanced from round {round}")]
    AlreadyAdvanced { team_id: TeamId, round: u32 },

    #[error("Winner and loser cannot be the same team")]
    SameTeam,

    #[error("the draft changed while this pick was being made; try again")]
    DraftChanged,

    #[error("{what} already exists")]
    Duplicate { what: String },
}

/// Every way a mutating or reading operation can be refused.
///
/// All variants except [`ActionError::Storage`] are expected outcomes and
/// leave stored state untouched.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not your turn! Waiting for {expected}")]
    OutOfTurn {
        expected: String,
        expected_user_id: UserId,
    },

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

/// Serializable tag for [`ActionError`], for surfaces that render a specific
/// message per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    OutOfTurn,
    Conflict,
    NotFound,
    Validation,
    Storage,
}

impl ActionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActionError::Unauthorized(_) => ErrorKind::Unauthorized,
            ActionError::OutOfTurn { .. } => ErrorKind::OutOfTurn,
            ActionError::Conflict(_) => ErrorKind::Conflict,
            ActionError::NotFound { .. } => ErrorKind::NotFound,
            ActionError::Validation { .. } => ErrorKind::Validation,
            ActionError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// `false` only for unexpected storage failures.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Storage
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        ActionError::NotFound { what: what.into() }
    }

    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        ActionError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Whether a rusqlite error is a UNIQUE/CHECK/FOREIGN KEY violation.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_turn_message_names_expected_player() {
        let err = ActionError::OutOfTurn {
            expected: "Dana".into(),
            expected_user_id: 4,
        };
        assert_eq!(err.to_string(), "Not your turn! Waiting for Dana");
        assert_eq!(err.kind(), ErrorKind::OutOfTurn);
    }

    #[test]
    fn conflict_displays_transparently() {
        let err = ActionError::from(Conflict::TeamTaken { team_id: 3 });
        assert_eq!(err.to_string(), "Team already taken");
        assert!(err.is_recoverable());
    }

    #[test]
    fn storage_failures_are_not_recoverable() {
        let err = ActionError::from(anyhow::anyhow!("disk full"));
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_recoverable());
    }
}
