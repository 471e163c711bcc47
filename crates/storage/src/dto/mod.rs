pub mod matchup;

pub use matchup::{CreateMatchupRequest, MatchupDraft, MatchupPayload, ParticipantPayload, WireDate};
