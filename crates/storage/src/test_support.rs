use chrono::{TimeZone, Utc};

use crate::models::{MatchupId, MatchupRecord, MatchupStatus, Participant, SkillLevel, UserId};

pub const CREATOR: UserId = UserId(100);

pub fn participant(id: i64) -> Participant {
    Participant::new(UserId(id), format!("User {}", id))
}

/// Open record with id 1 created by [`CREATOR`].
pub fn record(max: u32, members: &[i64]) -> MatchupRecord {
    record_with_id(1, max, members)
}

pub fn record_with_id(id: i64, max: u32, members: &[i64]) -> MatchupRecord {
    MatchupRecord {
        id: MatchupId(id),
        title: format!("Matchup {}", id),
        sport: "Football".to_string(),
        location: "Main field".to_string(),
        description: String::new(),
        event_date: Utc.with_ymd_and_hms(2030, 6, 1, 18, 0, 0).unwrap(),
        max_participants: max,
        skill_level: SkillLevel::Beginner,
        creator_id: CREATOR,
        participants: members.iter().map(|m| participant(*m)).collect(),
        status: MatchupStatus::Open,
        contact_email: None,
        created_at: None,
    }
}
