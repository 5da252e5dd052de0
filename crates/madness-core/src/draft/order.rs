// Snake-draft turn order.
//
// This is the only place turn order is computed. The pick protocol and the
// draft board read both call into it.

use serde::{Deserialize, Serialize};

use crate::model::Membership;

/// Number of teams every member drafts.
pub const ROSTER_SIZE: usize = 8;

/// Sort key for members without a draft position, placing them after
/// everyone who has one.
const UNPOSITIONED: u32 = u32::MAX;

/// Index into the sorted member list of whoever owns overall pick
/// `pick_number` (1-based).
///
/// Odd rounds run forward (0 to N-1), even rounds run backward (N-1 to 0).
/// Returns `None` when there are no players or `pick_number` is zero.
pub fn picker_index(pick_number: usize, total_players: usize) -> Option<usize> {
    if total_players == 0 || pick_number == 0 {
        return None;
    }
    let zero_based = pick_number - 1;
    let round_index = zero_based / total_players;
    let slot = zero_based % total_players;

    if round_index % 2 == 0 {
        Some(slot)
    } else {
        Some(total_players - 1 - slot)
    }
}

/// Where an overall pick lands: its 1-based round and 1-based position
/// within that round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub round: u32,
    pub pick_number: u32,
}

pub fn slot_for_pick(pick_number: usize, total_players: usize) -> Option<Slot> {
    if total_players == 0 || pick_number == 0 {
        return None;
    }
    let zero_based = pick_number - 1;
    Some(Slot {
        round: (zero_based / total_players + 1) as u32,
        pick_number: (zero_based % total_players + 1) as u32,
    })
}

/// Total number of picks in a group's draft.
pub fn total_picks(total_players: usize) -> usize {
    total_players * ROSTER_SIZE
}

/// Sort members into draft order: draft position ascending (missing or zero
/// positions last), then join time, then membership id.
pub fn sort_draft_order(members: &mut [Membership]) {
    members.sort_by_key(|m| {
        let position = m.draft_position.filter(|&p| p > 0).unwrap_or(UNPOSITIONED);
        (position, m.joined_at, m.id)
    });
}

/// Owned convenience wrapper around [`sort_draft_order`].
pub fn draft_order(mut members: Vec<Membership>) -> Vec<Membership> {
    sort_draft_order(&mut members);
    members
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MembershipRole;
    use chrono::{Duration, TimeZone, Utc};

    fn member(id: i64, position: Option<u32>, joined_offset_secs: i64) -> Membership {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        Membership {
            id,
            group_id: 1,
            user_id: id * 10,
            user_name: format!("Player {id}"),
            role: MembershipRole::Member,
            draft_position: position,
            score: 0,
            joined_at: base + Duration::seconds(joined_offset_secs),
            final_score_guess: None,
            nit_winner_guess: None,
        }
    }

    // ------------------------------------------------------------------
    // picker_index
    // ------------------------------------------------------------------

    #[test]
    fn four_players_snake_over_two_rounds() {
        let order: Vec<usize> = (1..=8).map(|p| picker_index(p, 4).unwrap()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 3, 2, 1, 0]);
    }

    #[test]
    fn snake_holds_for_any_group_size() {
        for n in 1..=12 {
            let got: Vec<usize> = (1..=2 * n).map(|p| picker_index(p, n).unwrap()).collect();
            let mut want: Vec<usize> = (0..n).collect();
            want.extend((0..n).rev());
            assert_eq!(got, want, "group size {n}");
        }
    }

    #[test]
    fn third_round_runs_forward_again() {
        assert_eq!(picker_index(9, 4), Some(0));
        assert_eq!(picker_index(12, 4), Some(3));
        assert_eq!(picker_index(13, 4), Some(3));
    }

    #[test]
    fn single_player_always_picks() {
        assert!((1..=8).all(|p| picker_index(p, 1) == Some(0)));
    }

    #[test]
    fn no_players_or_pick_zero_has_no_picker() {
        assert_eq!(picker_index(1, 0), None);
        assert_eq!(picker_index(0, 4), None);
    }

    // ------------------------------------------------------------------
    // slot_for_pick
    // ------------------------------------------------------------------

    #[test]
    fn slot_derivation_matches_round_and_position() {
        assert_eq!(
            slot_for_pick(5, 4),
            Some(Slot {
                round: 2,
                pick_number: 1
            })
        );
        assert_eq!(
            slot_for_pick(8, 4),
            Some(Slot {
                round: 2,
                pick_number: 4
            })
        );
        assert_eq!(
            slot_for_pick(1, 4),
            Some(Slot {
                round: 1,
                pick_number: 1
            })
        );
        assert_eq!(slot_for_pick(3, 0), None);
    }

    #[test]
    fn total_picks_is_full_rosters() {
        assert_eq!(total_picks(4), 32);
        assert_eq!(total_picks(0), 0);
    }

    // ------------------------------------------------------------------
    // sort_draft_order
    // ------------------------------------------------------------------

    #[test]
    fn positioned_members_sort_by_position() {
        let sorted = draft_order(vec![
            member(1, Some(3), 0),
            member(2, Some(1), 5),
            member(3, Some(2), 10),
        ]);
        let ids: Vec<i64> = sorted.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn missing_and_zero_positions_sort_last_by_join_time() {
        let sorted = draft_order(vec![
            member(1, None, 30),
            member(2, Some(0), 10),
            member(3, Some(2), 50),
            member(4, None, 20),
        ]);
        let ids: Vec<i64> = sorted.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn equal_positions_fall_back_to_join_time() {
        let sorted = draft_order(vec![member(1, Some(1), 9), member(2, Some(1), 3)]);
        assert_eq!(sorted[0].id, 2);
    }
}
