mod matchup;
mod query;

pub use matchup::{MatchupStore, Reconciliation, Speculation, Ticket};
pub use query::{FilterMode, MatchupQuery, matches_search};
