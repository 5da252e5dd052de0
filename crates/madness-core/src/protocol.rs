// Response envelope handed back to whatever surface invoked an operation.

use serde::{Deserialize, Serialize};

use crate::draft::{PickReceipt, ResetReport, ResetScope};
use crate::error::{ActionError, ErrorKind};
use crate::model::{DraftPick, UserId};
use crate::scoring::{round_label, ChangeKind, ScoreChange};

/// `{ success, message, applied_pick_owner_user_id?, error? }` for every
/// mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    /// Set on a successful pick: the member the pick was recorded for, which
    /// differs from the actor when an admin picks on someone's behalf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_pick_owner_user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            applied_pick_owner_user_id: None,
            error: None,
        }
    }

    pub fn failed(err: &ActionError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            applied_pick_owner_user_id: None,
            error: Some(err.kind()),
        }
    }
}

/// A successful operation's value, rendered into an [`ActionResponse`].
pub trait Outcome {
    fn message(&self) -> String;

    fn applied_pick_owner(&self) -> Option<UserId> {
        None
    }
}

impl Outcome for PickReceipt {
    fn message(&self) -> String {
        format!(
            "Pick successful! {} took pick {} (round {}, pick {})",
            self.owner_name, self.overall, self.pick.round, self.pick.pick_number
        )
    }

    fn applied_pick_owner(&self) -> Option<UserId> {
        Some(self.pick.user_id)
    }
}

impl Outcome for DraftPick {
    fn message(&self) -> String {
        format!(
            "Last pick undone! (round {}, pick {})",
            self.round, self.pick_number
        )
    }
}

impl Outcome for ResetReport {
    fn message(&self) -> String {
        let scope = match self.scope {
            ResetScope::All => "all groups".to_string(),
            ResetScope::Tournament(id) => format!("tournament {id}"),
            ResetScope::Group(id) => format!("group {id}"),
        };
        format!(
            "Draft has been reset for {scope}; {} picks deleted.",
            self.deleted_picks
        )
    }
}

impl Outcome for ScoreChange {
    fn message(&self) -> String {
        let round = round_label(self.result.round);
        match self.kind {
            ChangeKind::Recorded => format!(
                "Game result recorded and scores updated! {round}: {} points to {} members",
                self.award.total(),
                self.memberships_adjusted
            ),
            ChangeKind::Reverted => format!(
                "Game result reverted successfully. {round}: {} points removed from {} members",
                self.award.total(),
                self.memberships_adjusted
            ),
        }
    }
}

impl Outcome for () {
    fn message(&self) -> String {
        "Done.".to_string()
    }
}

impl<T: Outcome> From<Result<T, ActionError>> for ActionResponse {
    fn from(result: Result<T, ActionError>) -> Self {
        match result {
            Ok(value) => Self {
                applied_pick_owner_user_id: value.applied_pick_owner(),
                ..Self::ok(value.message())
            },
            Err(err) => Self::failed(&err),
        }
    }
}
