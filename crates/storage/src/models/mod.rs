mod matchup;
mod participant;
mod skill_level;

pub use matchup::{MatchupId, MatchupRecord, MatchupStatus};
pub use participant::{Participant, UserId};
pub use skill_level::SkillLevel;
