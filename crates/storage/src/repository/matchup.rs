use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use super::query::{FilterMode, MatchupQuery, matches_search};
use crate::error::{MatchupError, Result};
use crate::models::{MatchupId, MatchupRecord};
use crate::services::{Inverse, LifecycleController, Transition};

/// Taken when a request that will write a record back is issued.
///
/// A response is only applied if no later-issued write for the same record
/// landed first and no full reset happened in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    matchup: MatchupId,
    generation: u64,
    seq: u64,
}

impl Ticket {
    pub fn matchup(&self) -> MatchupId {
        self.matchup
    }
}

/// A speculative change currently visible in the store, with its exact inverse.
#[derive(Debug, Clone)]
pub struct Speculation {
    ticket: Ticket,
    base_stamp: u64,
    inverse: Inverse,
    before: MatchupRecord,
}

impl Speculation {
    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn matchup(&self) -> MatchupId {
        self.ticket.matchup
    }

    pub fn inverse(&self) -> &Inverse {
        &self.inverse
    }

    /// The record as it was just before the speculative change.
    pub fn before(&self) -> &MatchupRecord {
        &self.before
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    Applied(MatchupRecord),
    /// A newer write or a full reset already replaced this record.
    Superseded,
}

#[derive(Debug)]
struct Entry {
    record: MatchupRecord,
    /// Sequence number of the last authoritative write.
    stamp: u64,
}

#[derive(Debug, Default)]
struct StoreState {
    entries: Vec<Entry>,
    generation: u64,
    seq: u64,
    revision: u64,
    query: MatchupQuery,
    view: Vec<MatchupRecord>,
}

impl StoreState {
    fn position(&self, id: MatchupId) -> Option<usize> {
        self.entries.iter().position(|e| e.record.id == id)
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn upsert(&mut self, record: MatchupRecord, stamp: u64) {
        match self.position(record.id) {
            Some(idx) => self.entries[idx] = Entry { record, stamp },
            None => self.entries.push(Entry { record, stamp }),
        }
    }

    /// Every write ends here so the projection is never stale.
    fn changed(&mut self) {
        self.revision += 1;
        let query = &self.query;
        self.view = self
            .entries
            .iter()
            .filter(|e| query.matches(&e.record))
            .map(|e| e.record.clone())
            .collect();
    }
}

/// Client-held collection of matchups plus the projection the UI renders.
///
/// Writers are the bulk refetch path (`replace_all`) and the optimistic
/// mutation protocol (`apply_speculative`, `reconcile`, `rollback`).
#[derive(Debug, Default)]
pub struct MatchupStore {
    state: RwLock<StoreState>,
}

impl MatchupStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, id: MatchupId) -> Option<MatchupRecord> {
        let state = self.read();
        state.position(id).map(|idx| state.entries[idx].record.clone())
    }

    pub fn records(&self) -> Vec<MatchupRecord> {
        self.read().entries.iter().map(|e| e.record.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// Incremented on every write.
    pub fn revision(&self) -> u64 {
        self.read().revision
    }

    pub fn search(&self, text: &str) -> Vec<MatchupRecord> {
        self.read()
            .entries
            .iter()
            .filter(|e| matches_search(&e.record, text))
            .map(|e| e.record.clone())
            .collect()
    }

    pub fn filter(&self, mode: FilterMode) -> Vec<MatchupRecord> {
        self.read()
            .entries
            .iter()
            .filter(|e| mode.matches(&e.record))
            .map(|e| e.record.clone())
            .collect()
    }

    pub fn query(&self) -> MatchupQuery {
        self.read().query.clone()
    }

    pub fn set_query(&self, query: MatchupQuery) {
        let mut state = self.write();
        state.query = query;
        state.changed();
    }

    pub fn set_search(&self, text: impl Into<String>) {
        let mut state = self.write();
        state.query.search = text.into();
        state.changed();
    }

    pub fn set_filter(&self, mode: FilterMode) {
        let mut state = self.write();
        state.query.filter = mode;
        state.changed();
    }

    /// Records matching the active query, in collection order.
    pub fn visible(&self) -> Vec<MatchupRecord> {
        self.read().view.clone()
    }

    /// Full refetch: discard every record and all pending speculation.
    pub fn replace_all(&self, records: Vec<MatchupRecord>) {
        let mut state = self.write();
        state.generation += 1;
        state.entries.clear();
        for record in records {
            let stamp = state.next_seq();
            if state.position(record.id).is_some() {
                warn!(matchup = %record.id, "Duplicate matchup in collection, keeping the latest");
            }
            state.upsert(record, stamp);
        }
        state.changed();
        debug!(
            generation = state.generation,
            count = state.entries.len(),
            "Replaced matchup collection"
        );
    }

    /// Record a record the remote authority has just created.
    pub fn insert_created(&self, record: MatchupRecord) {
        let mut state = self.write();
        let stamp = state.next_seq();
        state.upsert(record, stamp);
        state.changed();
    }

    pub fn issue_ticket(&self, id: MatchupId) -> Ticket {
        let mut state = self.write();
        Ticket {
            matchup: id,
            generation: state.generation,
            seq: state.next_seq(),
        }
    }

    /// A later ticket for the same record and generation, taken when a
    /// follow-up read is issued on behalf of an in-flight mutation.
    pub fn renew_ticket(&self, ticket: &Ticket) -> Ticket {
        let mut state = self.write();
        Ticket {
            matchup: ticket.matchup,
            generation: ticket.generation,
            seq: state.next_seq(),
        }
    }

    /// Replace a record wholesale with the authoritative version, unless the
    /// ticket has been overtaken.
    pub fn reconcile(&self, ticket: &Ticket, record: MatchupRecord) -> Reconciliation {
        if record.id != ticket.matchup {
            warn!(
                expected = %ticket.matchup,
                received = %record.id,
                "Ignoring reconciliation for a different matchup"
            );
            return Reconciliation::Superseded;
        }

        let mut state = self.write();
        if state.generation != ticket.generation {
            debug!(matchup = %record.id, "Reconciliation superseded by full refetch");
            return Reconciliation::Superseded;
        }
        let newer = state
            .position(record.id)
            .is_some_and(|idx| state.entries[idx].stamp > ticket.seq);
        if newer {
            debug!(matchup = %record.id, "Reconciliation superseded by a newer response");
            return Reconciliation::Superseded;
        }

        state.upsert(record.clone(), ticket.seq);
        state.changed();
        Reconciliation::Applied(record)
    }

    /// Validate `transition` against the current record and, if legal, make
    /// its effect visible immediately.
    pub fn apply_speculative(&self, id: MatchupId, transition: &Transition) -> Result<Speculation> {
        let mut state = self.write();
        let idx = state.position(id).ok_or(MatchupError::NotFound(id))?;
        let before = state.entries[idx].record.clone();
        let (next, inverse) = LifecycleController::apply(&before, transition)?;

        let base_stamp = state.entries[idx].stamp;
        state.entries[idx].record = next;
        let ticket = Ticket {
            matchup: id,
            generation: state.generation,
            seq: state.next_seq(),
        };
        state.changed();

        debug!(matchup = %id, transition = transition.name(), "Applied speculative change");
        Ok(Speculation {
            ticket,
            base_stamp,
            inverse,
            before,
        })
    }

    /// Undo a speculative change. Returns false when an authoritative write
    /// has replaced the record since, in which case there is nothing to undo.
    pub fn rollback(&self, speculation: &Speculation) -> bool {
        let mut state = self.write();
        if state.generation != speculation.ticket.generation {
            return false;
        }
        let Some(idx) = state.position(speculation.matchup()) else {
            return false;
        };
        if state.entries[idx].stamp != speculation.base_stamp {
            return false;
        }

        speculation.inverse.undo(&mut state.entries[idx].record);
        state.changed();
        true
    }
}
