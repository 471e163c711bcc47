use thiserror::Error;

use crate::models::{MatchupId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchupError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Matchup {0} is already full")]
    CapacityExceeded(MatchupId),

    #[error("Matchup {0} is closed")]
    InvalidState(MatchupId),

    #[error("Only the creator may close matchup {id} (actor {actor})")]
    Permission { id: MatchupId, actor: UserId },

    #[error("User {actor} already participates in matchup {id}")]
    AlreadyParticipant { id: MatchupId, actor: UserId },

    #[error("User {actor} does not participate in matchup {id}")]
    NotParticipant { id: MatchupId, actor: UserId },

    #[error("Matchup {0} is not loaded")]
    NotFound(MatchupId),

    #[error("Malformed matchup payload: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, MatchupError>;

