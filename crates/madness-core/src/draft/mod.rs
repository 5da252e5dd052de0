// Snake draft: turn order, pick protocol, and draft board reads.

pub mod board;
pub mod membership;
pub mod order;
pub mod pick;

pub use board::{available_teams, current_picker, draft_log, turn_after, Turn};
pub use membership::{remove_member, set_draft_position, submit_tiebreaker, MAX_DRAFT_POSITION};
pub use order::{picker_index, slot_for_pick, sort_draft_order, Slot, ROSTER_SIZE};
pub use pick::{reset_draft, submit_pick, undo_last_pick, PickReceipt, ResetReport, ResetScope};
