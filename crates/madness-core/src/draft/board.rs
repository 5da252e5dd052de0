// Read-side view of a group's draft: who is on the clock, what is left.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use super::order::{self, Slot};
use crate::db::queries;
use crate::error::ActionError;
use crate::model::{Actor, DraftPick, Group, GroupId, Membership, MembershipRole, Team};

/// The member who owns the next pick, and where that pick lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based overall pick number.
    pub overall: usize,
    pub slot: Slot,
    pub member: Membership,
}

/// Resolve who owns overall pick `picks_made + 1` given members already in
/// draft order. `None` only when `order` is empty.
pub fn turn_after(order: &[Membership], picks_made: usize) -> Option<Turn> {
    let overall = picks_made + 1;
    let index = order::picker_index(overall, order.len())?;
    let slot = order::slot_for_pick(overall, order.len())?;
    Some(Turn {
        overall,
        slot,
        member: order[index].clone(),
    })
}

pub(crate) fn require_group(conn: &Connection, group_id: GroupId) -> Result<Group, ActionError> {
    queries::load_group(conn, group_id)?
        .ok_or_else(|| ActionError::not_found(format!("group {group_id}")))
}

/// Whether `actor` may act as an administrator of `group`. On top of
/// [`Actor::administers`], a member seated with the ADMIN role counts.
pub(crate) fn acts_as_admin(
    conn: &Connection,
    actor: &Actor,
    group: &Group,
) -> Result<bool, ActionError> {
    if actor.administers(group) {
        return Ok(true);
    }
    Ok(queries::load_membership(conn, group.id, actor.user_id)?
        .is_some_and(|m| m.role == MembershipRole::Admin))
}

/// Members of a group in draft order.
pub fn draft_order(conn: &Connection, group_id: GroupId) -> Result<Vec<Membership>, ActionError> {
    require_group(conn, group_id)?;
    Ok(order::draft_order(queries::load_memberships(conn, group_id)?))
}

/// Who is on the clock. `None` once every roster is full or when the group
/// has no members.
pub fn current_picker(conn: &Connection, group_id: GroupId) -> Result<Option<Turn>, ActionError> {
    let members = draft_order(conn, group_id)?;
    let picks_made = queries::count_picks(conn, group_id)?;
    if picks_made >= order::total_picks(members.len()) {
        return Ok(None);
    }
    Ok(turn_after(&members, picks_made))
}

/// Teams of the group's tournament nobody in the group has drafted, strongest
/// seed first.
pub fn available_teams(conn: &Connection, group_id: GroupId) -> Result<Vec<Team>, ActionError> {
    let group = require_group(conn, group_id)?;
    Ok(queries::load_undrafted_teams(conn, &group)?)
}

/// Every pick made in the group so far, in draft order.
pub fn draft_log(conn: &Connection, group_id: GroupId) -> Result<Vec<DraftPick>, ActionError> {
    require_group(conn, group_id)?;
    Ok(queries::load_picks(conn, group_id)?)
}
