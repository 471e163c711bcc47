use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Participant, SkillLevel, UserId};

/// Identifier assigned by the remote authority when a matchup is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchupId(pub i64);

impl std::fmt::Display for MatchupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored status. Fullness is never stored; see [`crate::services::CapacityGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchupStatus {
    Open,
    Closed,
}

impl MatchupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::fmt::Display for MatchupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled, capacity-limited group activity as last confirmed (or
/// speculated) by the client.
///
/// Records coming off the wire are built from a `MatchupPayload`, which rejects
/// payloads breaking the capacity or uniqueness invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchupRecord {
    pub id: MatchupId,
    pub title: String,
    pub sport: String,
    pub location: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub max_participants: u32,
    pub skill_level: SkillLevel,
    pub creator_id: UserId,
    pub participants: Vec<Participant>,
    pub status: MatchupStatus,
    pub contact_email: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl MatchupRecord {
    pub fn is_member(&self, user: UserId) -> bool {
        self.participants.iter().any(|p| p.id == user)
    }

    pub fn is_closed(&self) -> bool {
        self.status == MatchupStatus::Closed
    }

    pub fn participant_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.participants.iter().map(|p| p.id)
    }
}
