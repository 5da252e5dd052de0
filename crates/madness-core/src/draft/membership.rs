// Member management that affects the draft: slot order, removal, and the
// tie-breaker prediction recorded once a roster is complete.

use rusqlite::Connection;

use super::board::{acts_as_admin, require_group};
use super::order::ROSTER_SIZE;
use crate::db::queries;
use crate::error::ActionError;
use crate::model::{Actor, GroupId, Role, UserId};

/// Highest draft position an administrator may assign.
pub const MAX_DRAFT_POSITION: u32 = 64;

/// Assign `user_id` the 1-based draft slot `position` in `group_id`.
pub fn set_draft_position(
    conn: &Connection,
    actor: &Actor,
    group_id: GroupId,
    user_id: UserId,
    position: u32,
) -> Result<(), ActionError> {
    let group = require_group(conn, group_id)?;
    if actor.role != Role::GroupAdmin && !acts_as_admin(conn, actor, &group)? {
        return Err(ActionError::Unauthorized(
            "only admins can change draft order".into(),
        ));
    }
    if !(1..=MAX_DRAFT_POSITION).contains(&position) {
        return Err(ActionError::invalid(
            "draft_position",
            format!("must be between 1 and {MAX_DRAFT_POSITION}, got {position}"),
        ));
    }
    if !queries::set_draft_position(conn, group_id, user_id, position)? {
        return Err(ActionError::not_found(format!(
            "membership of user {user_id} in group {group_id}"
        )));
    }
    Ok(())
}

/// Remove a member from a group along with every pick they made there.
/// Returns the number of picks deleted. Scores of other members are not
/// touched.
pub fn remove_member(
    conn: &Connection,
    actor: &Actor,
    group_id: GroupId,
    user_id: UserId,
) -> Result<usize, ActionError> {
    let group = require_group(conn, group_id)?;
    if actor.role != Role::GroupAdmin && !acts_as_admin(conn, actor, &group)? {
        return Err(ActionError::Unauthorized(
            "only admins can remove members".into(),
        ));
    }
    let removed_picks = queries::delete_member_picks(conn, group_id, user_id)?;
    if !queries::delete_membership(conn, group_id, user_id)? {
        return Err(ActionError::not_found(format!(
            "membership of user {user_id} in group {group_id}"
        )));
    }
    Ok(removed_picks)
}

/// Save tie-breaker predictions: the combined points of the championship
/// game and the NIT champion.
///
/// Members save their own. Group admins (including members seated as ADMIN)
/// and super admins may save them for another member by passing
/// `target_user_id`. Only accepted once the member holds a full roster; a
/// later submission replaces the earlier one.
pub fn submit_tiebreaker(
    conn: &Connection,
    actor: &Actor,
    group_id: GroupId,
    target_user_id: Option<UserId>,
    final_score_guess: u32,
    nit_winner_guess: &str,
) -> Result<(), ActionError> {
    let group = require_group(conn, group_id)?;
    let target = target_user_id.unwrap_or(actor.user_id);

    let member = if target == actor.user_id {
        queries::load_membership(conn, group_id, target)?.ok_or_else(|| {
            ActionError::Unauthorized(format!("user {target} is not in group {group_id}"))
        })?
    } else {
        if !acts_as_admin(conn, actor, &group)? {
            return Err(ActionError::Unauthorized(
                "only admins can save tie-breakers for others".into(),
            ));
        }
        queries::load_membership(conn, group_id, target)?.ok_or_else(|| {
            ActionError::not_found(format!("membership of user {target} in group {group_id}"))
        })?
    };

    let held = queries::count_user_picks(conn, group_id, member.user_id)?;
    if held < ROSTER_SIZE {
        return Err(ActionError::invalid(
            "tiebreaker",
            format!("available after all {ROSTER_SIZE} picks are made ({held} so far)"),
        ));
    }
    queries::set_tiebreaker(
        conn,
        group_id,
        member.user_id,
        final_score_guess,
        nit_winner_guess.trim(),
    )?;
    Ok(())
}
