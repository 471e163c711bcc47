use crate::models::{MatchupRecord, MatchupStatus, UserId};

/// Pure capacity and eligibility predicates over a record.
///
/// Nothing here is cached: callers re-derive after every state change.
pub struct CapacityGuard;

/// What an actor may do with a record, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eligibility {
    pub is_full: bool,
    pub is_member: bool,
    pub can_join: bool,
    pub can_close: bool,
    pub seats_left: u32,
}

impl CapacityGuard {
    pub fn is_full(record: &MatchupRecord) -> bool {
        record.participants.len() >= record.max_participants as usize
    }

    pub fn seats_left(record: &MatchupRecord) -> u32 {
        let taken = u32::try_from(record.participants.len()).unwrap_or(u32::MAX);
        record.max_participants.saturating_sub(taken)
    }

    pub fn is_joinable(record: &MatchupRecord, actor: UserId) -> bool {
        record.status == MatchupStatus::Open
            && !Self::is_full(record)
            && !record.is_member(actor)
    }

    pub fn is_closeable(record: &MatchupRecord, actor: UserId) -> bool {
        record.status == MatchupStatus::Open && actor == record.creator_id
    }

    pub fn assess(record: &MatchupRecord, actor: UserId) -> Eligibility {
        Eligibility {
            is_full: Self::is_full(record),
            is_member: record.is_member(actor),
            can_join: Self::is_joinable(record, actor),
            can_close: Self::is_closeable(record, actor),
            seats_left: Self::seats_left(record),
        }
    }
}
