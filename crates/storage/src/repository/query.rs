use crate::models::{MatchupRecord, MatchupStatus, UserId};
use crate::services::CapacityGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    All,
    /// Open and not full.
    Available,
    /// The actor is among the participants.
    Mine(UserId),
    Closed,
}

impl FilterMode {
    pub fn matches(&self, record: &MatchupRecord) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::Available => {
                record.status == MatchupStatus::Open && !CapacityGuard::is_full(record)
            }
            FilterMode::Mine(actor) => record.is_member(*actor),
            FilterMode::Closed => record.status == MatchupStatus::Closed,
        }
    }
}

/// Case-insensitive substring match over title, sport and location.
/// An empty query matches everything.
pub fn matches_search(record: &MatchupRecord, text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    let needle = text.to_lowercase();
    [&record.title, &record.sport, &record.location]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Search text combined with a filter mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchupQuery {
    pub search: String,
    pub filter: FilterMode,
}

impl MatchupQuery {
    pub fn new(search: impl Into<String>, filter: FilterMode) -> Self {
        Self {
            search: search.into(),
            filter,
        }
    }

    pub fn matches(&self, record: &MatchupRecord) -> bool {
        matches_search(record, &self.search) && self.filter.matches(record)
    }
}
