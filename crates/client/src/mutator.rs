use std::sync::{Arc, Weak};

use chrono::Utc;
use storage::MatchupStore;
use storage::dto::{CreateMatchupRequest, MatchupDraft};
use storage::models::{MatchupId, MatchupRecord};
use storage::repository::{FilterMode, Reconciliation, Speculation, Ticket};
use storage::services::{LifecycleController, Transition};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{ClientError, Result};
use crate::session::{Identity, SessionContext};
use crate::traits::MatchupApi;

/// How a remote result ended up in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T = MatchupRecord> {
    Applied(T),
    /// A newer write or a full refetch got there first.
    Superseded,
    /// The store was dropped while the call was in flight.
    Detached,
}

/// Which collection endpoint a full refresh uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope {
    All,
    NotFull,
}

impl RefreshScope {
    pub fn for_filter(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Available => RefreshScope::NotFull,
            FilterMode::All | FilterMode::Mine(_) | FilterMode::Closed => RefreshScope::All,
        }
    }
}

/// The only writer to a `MatchupStore` besides the bulk refetch path.
///
/// Every mutation is checked locally, applied speculatively, sent to the
/// server and then either reconciled with the authoritative record or undone.
/// The store is held weakly; once the owning view drops it, completions do
/// nothing.
pub struct OptimisticMutator {
    api: Arc<dyn MatchupApi>,
    session: Arc<dyn SessionContext>,
    store: Weak<MatchupStore>,
}

impl OptimisticMutator {
    pub fn new(
        api: Arc<dyn MatchupApi>,
        session: Arc<dyn SessionContext>,
        store: &Arc<MatchupStore>,
    ) -> Self {
        Self {
            api,
            session,
            store: Arc::downgrade(store),
        }
    }

    fn store(&self) -> Result<Arc<MatchupStore>> {
        self.store.upgrade().ok_or(ClientError::Detached)
    }

    fn identity(&self) -> Result<Identity> {
        self.session.identity().ok_or(ClientError::NoSession)
    }

    #[instrument(skip(self), fields(mutation_id = %Uuid::new_v4(), api = self.api.name()))]
    pub async fn join(&self, id: MatchupId) -> Result<Completion> {
        let identity = self.identity()?;
        let speculation = self
            .store()?
            .apply_speculative(id, &Transition::Join(identity.as_participant()))?;

        let outcome = self.api.join(id, identity.id).await;
        self.settle(speculation, outcome).await
    }

    #[instrument(skip(self), fields(mutation_id = %Uuid::new_v4(), api = self.api.name()))]
    pub async fn close(&self, id: MatchupId) -> Result<Completion> {
        let identity = self.identity()?;
        let speculation = self
            .store()?
            .apply_speculative(id, &Transition::Close { actor: identity.id })?;

        let outcome = self.api.close(id).await;
        self.settle(speculation, outcome).await
    }

    /// The server has no endpoint for leaving, so nothing is changed locally
    /// either. Local preconditions are still reported first.
    #[instrument(skip(self))]
    pub fn leave(&self, id: MatchupId) -> Result<Completion> {
        let identity = self.identity()?;
        let record = self
            .store()?
            .get(id)
            .ok_or(storage::MatchupError::NotFound(id))?;
        LifecycleController::check(&record, &Transition::Leave(identity.id))?;

        warn!(matchup = %id, "Leaving a matchup is not supported by the server");
        Err(ClientError::NotImplemented("leaving a matchup"))
    }

    #[instrument(skip(self, draft), fields(
        mutation_id = %Uuid::new_v4(),
        api = self.api.name(),
        title = %draft.title
    ))]
    pub async fn create(&self, draft: MatchupDraft) -> Result<MatchupRecord> {
        let identity = self.identity()?;
        let request = CreateMatchupRequest::from_draft(draft, identity.id);
        request.check(Utc::now())?;
        self.store()?;

        let record = self.api.create(&request).await?;
        match self.store.upgrade() {
            Some(store) => store.insert_created(record.clone()),
            None => debug!("Store dropped before creation completed"),
        }

        info!(matchup = %record.id, "Created matchup");
        Ok(record)
    }

    /// Replace the whole collection. Always wins over in-flight reconciliations.
    #[instrument(skip(self))]
    pub async fn refetch_all(&self, scope: RefreshScope) -> Result<Completion<usize>> {
        self.store()?;
        let records = match scope {
            RefreshScope::All => self.api.list().await?,
            RefreshScope::NotFull => self.api.list_not_full().await?,
        };

        let Some(store) = self.store.upgrade() else {
            debug!("Store dropped before refetch completed");
            return Ok(Completion::Detached);
        };
        let count = records.len();
        store.replace_all(records);
        info!(count, "Refreshed matchups");
        Ok(Completion::Applied(count))
    }

    /// Refresh using the scope implied by the store's active filter.
    pub async fn refresh_visible(&self) -> Result<Completion<usize>> {
        let scope = RefreshScope::for_filter(self.store()?.query().filter);
        self.refetch_all(scope).await
    }

    /// Refresh a single record outside any mutation.
    #[instrument(skip(self))]
    pub async fn refetch(&self, id: MatchupId) -> Result<Completion> {
        let ticket = self.store()?.issue_ticket(id);
        let record = self.api.fetch(id).await?;
        Ok(self.reconcile(&ticket, record))
    }

    async fn settle(
        &self,
        speculation: Speculation,
        outcome: Result<MatchupRecord>,
    ) -> Result<Completion> {
        match outcome {
            Ok(response) => {
                let Some(store) = self.store.upgrade() else {
                    debug!("Store dropped while the call was in flight");
                    return Ok(Completion::Detached);
                };
                // The follow-up read is newer than anything issued during the call.
                let renewed = store.renew_ticket(speculation.ticket());
                drop(store);

                match self.api.fetch(speculation.matchup()).await {
                    Ok(fresh) => Ok(self.reconcile(&renewed, fresh)),
                    Err(e) => {
                        debug!(error = %e, "Refetch after mutation failed, using response body");
                        Ok(self.reconcile(speculation.ticket(), response))
                    }
                }
            }
            Err(e) => {
                match self.store.upgrade() {
                    Some(store) if store.rollback(&speculation) => {
                        info!(matchup = %speculation.matchup(), "Rolled back speculative change");
                    }
                    Some(_) => {
                        debug!(matchup = %speculation.matchup(), "Record already replaced, nothing to roll back");
                    }
                    None => debug!("Store dropped while the call was in flight"),
                }
                warn!(error = %e, "Mutation failed");
                Err(e)
            }
        }
    }

    fn reconcile(&self, ticket: &Ticket, record: MatchupRecord) -> Completion {
        let Some(store) = self.store.upgrade() else {
            debug!("Store dropped while the call was in flight");
            return Completion::Detached;
        };
        match store.reconcile(ticket, record) {
            Reconciliation::Applied(record) => Completion::Applied(record),
            Reconciliation::Superseded => Completion::Superseded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_available_filter_refreshes_not_full_only() {
        assert_eq!(
            RefreshScope::for_filter(FilterMode::Available),
            RefreshScope::NotFull
        );
        assert_eq!(RefreshScope::for_filter(FilterMode::Closed), RefreshScope::All);
        assert_eq!(RefreshScope::for_filter(FilterMode::All), RefreshScope::All);
    }
}
