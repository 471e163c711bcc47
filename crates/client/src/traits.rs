use storage::dto::CreateMatchupRequest;
use storage::models::{MatchupId, MatchupRecord, UserId};

use crate::Result;

/// The remote authority for matchups. Every response is authoritative.
#[async_trait::async_trait]
pub trait MatchupApi: Send + Sync {
    /// `GET /matchups`
    async fn list(&self) -> Result<Vec<MatchupRecord>>;

    /// `GET /matchups/not-full`
    async fn list_not_full(&self) -> Result<Vec<MatchupRecord>>;

    /// `GET /matchups/{id}`
    async fn fetch(&self, id: MatchupId) -> Result<MatchupRecord>;

    /// `POST /matchups`
    async fn create(&self, request: &CreateMatchupRequest) -> Result<MatchupRecord>;

    /// `POST /matchups/{id}/participants/{user}`
    async fn join(&self, id: MatchupId, user: UserId) -> Result<MatchupRecord>;

    /// `POST /matchups/{id}/close`
    async fn close(&self, id: MatchupId) -> Result<MatchupRecord>;

    fn name(&self) -> &str;
}
