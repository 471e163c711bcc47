use crate::error::{MatchupError, Result};
use crate::models::{MatchupRecord, MatchupStatus, Participant, UserId};
use crate::services::CapacityGuard;

/// Lifecycle view of a record. `Full` is derived from `Open`, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Open,
    Full,
    Closed,
}

impl LifecycleState {
    pub fn of(record: &MatchupRecord) -> Self {
        match record.status {
            MatchupStatus::Closed => Self::Closed,
            MatchupStatus::Open if CapacityGuard::is_full(record) => Self::Full,
            MatchupStatus::Open => Self::Open,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Full => "full",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Join(Participant),
    Leave(UserId),
    Close { actor: UserId },
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Leave(_) => "leave",
            Self::Close { .. } => "close",
        }
    }
}

/// Exact reverse of an applied transition, captured at apply time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inverse {
    RemoveParticipant(UserId),
    ReinsertParticipant {
        participant: Participant,
        position: usize,
    },
    RestoreStatus(MatchupStatus),
}

impl Inverse {
    /// Undo only what the transition touched; other participants keep their order.
    pub fn undo(&self, record: &mut MatchupRecord) {
        match self {
            Inverse::RemoveParticipant(user) => record.participants.retain(|p| p.id != *user),
            Inverse::ReinsertParticipant {
                participant,
                position,
            } => {
                if !record.is_member(participant.id) {
                    let at = (*position).min(record.participants.len());
                    record.participants.insert(at, participant.clone());
                }
            }
            Inverse::RestoreStatus(status) => record.status = *status,
        }
    }
}

/// Governs legal transitions and who may trigger them.
pub struct LifecycleController;

impl LifecycleController {
    /// Validate a transition against the given state of a record.
    pub fn check(record: &MatchupRecord, transition: &Transition) -> Result<()> {
        if record.is_closed() {
            return Err(MatchupError::InvalidState(record.id));
        }

        match transition {
            Transition::Join(participant) => {
                if record.is_member(participant.id) {
                    return Err(MatchupError::AlreadyParticipant {
                        id: record.id,
                        actor: participant.id,
                    });
                }
                if CapacityGuard::is_full(record) {
                    return Err(MatchupError::CapacityExceeded(record.id));
                }
            }
            Transition::Leave(actor) => {
                if !record.is_member(*actor) {
                    return Err(MatchupError::NotParticipant {
                        id: record.id,
                        actor: *actor,
                    });
                }
            }
            Transition::Close { actor } => {
                if *actor != record.creator_id {
                    return Err(MatchupError::Permission {
                        id: record.id,
                        actor: *actor,
                    });
                }
            }
        }

        Ok(())
    }

    /// Compute the record after `transition`, together with its inverse.
    pub fn apply(record: &MatchupRecord, transition: &Transition) -> Result<(MatchupRecord, Inverse)> {
        Self::check(record, transition)?;

        let mut next = record.clone();
        let inverse = match transition {
            Transition::Join(participant) => {
                next.participants.push(participant.clone());
                Inverse::RemoveParticipant(participant.id)
            }
            Transition::Leave(actor) => {
                let position = next
                    .participants
                    .iter()
                    .position(|p| p.id == *actor)
                    .ok_or(MatchupError::NotParticipant {
                        id: record.id,
                        actor: *actor,
                    })?;
                let participant = next.participants.remove(position);
                Inverse::ReinsertParticipant {
                    participant,
                    position,
                }
            }
            Transition::Close { .. } => {
                next.status = MatchupStatus::Closed;
                Inverse::RestoreStatus(record.status)
            }
        };

        Ok((next, inverse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CREATOR, participant, record};

    #[test]
    fn test_join_moves_open_to_full_at_capacity() {
        let r = record(2, &[1]);
        assert_eq!(LifecycleState::of(&r), LifecycleState::Open);

        let (next, inverse) = LifecycleController::apply(&r, &Transition::Join(participant(2))).unwrap();
        assert_eq!(LifecycleState::of(&next), LifecycleState::Full);
        assert_eq!(inverse, Inverse::RemoveParticipant(UserId(2)));
    }

    #[test]
    fn test_join_on_full_record_is_capacity_exceeded() {
        let r = record(1, &[1]);
        let err = LifecycleController::check(&r, &Transition::Join(participant(2))).unwrap_err();
        assert_eq!(err, MatchupError::CapacityExceeded(r.id));
    }

    #[test]
    fn test_second_join_by_member_is_rejected() {
        let r = record(3, &[1]);
        let err = LifecycleController::check(&r, &Transition::Join(participant(1))).unwrap_err();
        assert!(matches!(err, MatchupError::AlreadyParticipant { .. }));
    }

    #[test]
    fn test_closed_is_terminal() {
        let r = record(3, &[1]);
        let (closed, _) =
            LifecycleController::apply(&r, &Transition::Close { actor: CREATOR }).unwrap();
        assert_eq!(LifecycleState::of(&closed), LifecycleState::Closed);

        for transition in [
            Transition::Join(participant(2)),
            Transition::Leave(UserId(1)),
            Transition::Close { actor: CREATOR },
        ] {
            let err = LifecycleController::check(&closed, &transition).unwrap_err();
            assert_eq!(err, MatchupError::InvalidState(closed.id));
        }
    }

    #[test]
    fn test_close_by_non_creator_is_permission_error() {
        let r = record(3, &[]);
        let err =
            LifecycleController::apply(&r, &Transition::Close { actor: UserId(5) }).unwrap_err();
        assert_eq!(
            err,
            MatchupError::Permission {
                id: r.id,
                actor: UserId(5)
            }
        );
    }

    #[test]
    fn test_full_record_can_be_closed() {
        let r = record(1, &[1]);
        assert_eq!(LifecycleState::of(&r), LifecycleState::Full);
        assert!(LifecycleController::check(&r, &Transition::Close { actor: CREATOR }).is_ok());
    }

    #[test]
    fn test_leave_from_full_reopens_and_inverse_restores_order() {
        let r = record(3, &[1, 2, 3]);
        let (next, inverse) = LifecycleController::apply(&r, &Transition::Leave(UserId(2))).unwrap();
        assert_eq!(LifecycleState::of(&next), LifecycleState::Open);

        let mut undone = next.clone();
        inverse.undo(&mut undone);
        assert_eq!(undone, r);
    }

    #[test]
    fn test_leave_by_non_member_is_rejected() {
        let r = record(3, &[1]);
        let err = LifecycleController::check(&r, &Transition::Leave(UserId(9))).unwrap_err();
        assert!(matches!(err, MatchupError::NotParticipant { .. }));
    }

    #[test]
    fn test_join_inverse_removes_only_the_joined_participant() {
        let r = record(4, &[1, 2]);
        let (mut next, inverse) =
            LifecycleController::apply(&r, &Transition::Join(participant(3))).unwrap();
        next.participants.insert(0, participant(7));
        inverse.undo(&mut next);
        let ids: Vec<i64> = next.participant_ids().map(|u| u.0).collect();
        assert_eq!(ids, vec![7, 1, 2]);
    }
}
