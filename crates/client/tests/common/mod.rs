#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use client::{ClientError, Identity, MatchupApi, OptimisticMutator, Result, StaticSession};
use storage::MatchupError;
use storage::MatchupStore;
use storage::dto::CreateMatchupRequest;
use storage::models::{
    MatchupId, MatchupRecord, MatchupStatus, Participant, SkillLevel, UserId,
};
use storage::services::CapacityGuard;
use tokio::sync::Notify;

pub const CREATOR: UserId = UserId(100);

pub fn participant(id: i64) -> Participant {
    Participant::new(UserId(id), format!("User {}", id))
}

pub fn record(id: i64, max: u32, members: &[i64]) -> MatchupRecord {
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

#[derive(Default)]
pub struct Calls {
    pub list: AtomicUsize,
    pub fetch: AtomicUsize,
    pub create: AtomicUsize,
    pub join: AtomicUsize,
    pub close: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// In-memory server enforcing the same rules as the real one.
///
/// With a gate installed, joins and closes wait for it before the server
/// state is touched. With per-call gates each write waits for its own
/// `release_call(n)`, so completions can be reordered.
#[derive(Default)]
pub struct FakeApi {
    pub server: Mutex<BTreeMap<MatchupId, MatchupRecord>>,
    pub calls: Calls,
    gate: Mutex<Option<Arc<Notify>>>,
    per_call: Mutex<Option<Vec<Arc<Notify>>>>,
    fail_next_write: Mutex<Option<ClientError>>,
    next_id: AtomicUsize,
}

impl FakeApi {
    pub fn with_records(records: Vec<MatchupRecord>) -> Arc<Self> {
        let api = Self::default();
        api.next_id.store(1000, Ordering::SeqCst);
        {
            let mut server = api.server.lock().unwrap();
            for record in records {
                server.insert(record.id, record);
            }
        }
        Arc::new(api)
    }

    pub fn server_record(&self, id: i64) -> MatchupRecord {
        self.server.lock().unwrap()[&MatchupId(id)].clone()
    }

    pub fn server_join(&self, id: i64, user: i64) {
        let mut server = self.server.lock().unwrap();
        if let Some(record) = server.get_mut(&MatchupId(id)) {
            record.participants.push(participant(user));
        }
    }

    pub fn install_gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn gate_each_call(&self) {
        *self.per_call.lock().unwrap() = Some(Vec::new());
    }

    /// Number of writes currently held by per-call gates, released or not.
    pub fn held_calls(&self) -> usize {
        self.per_call.lock().unwrap().as_ref().map_or(0, Vec::len)
    }

    pub fn release_call(&self, index: usize) {
        let per_call = self.per_call.lock().unwrap();
        per_call.as_ref().unwrap()[index].notify_one();
    }

    pub fn fail_next_write(&self, err: ClientError) {
        *self.fail_next_write.lock().unwrap() = Some(err);
    }

    async fn hold(&self) {
        let own = self.per_call.lock().unwrap().as_mut().map(|calls| {
            let gate = Arc::new(Notify::new());
            calls.push(gate.clone());
            gate
        });
        if let Some(own) = own {
            own.notified().await;
            return;
        }

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn injected(&self) -> Option<ClientError> {
        self.fail_next_write.lock().unwrap().take()
    }
}

#[async_trait::async_trait]
impl MatchupApi for FakeApi {
    async fn list(&self) -> Result<Vec<MatchupRecord>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        Ok(self.server.lock().unwrap().values().cloned().collect())
    }

    async fn list_not_full(&self) -> Result<Vec<MatchupRecord>> {
        self.calls.list.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .server
            .lock()
            .unwrap()
            .values()
            .filter(|r| !CapacityGuard::is_full(r))
            .cloned()
            .collect())
    }

    async fn fetch(&self, id: MatchupId) -> Result<MatchupRecord> {
        self.calls.fetch.fetch_add(1, Ordering::SeqCst);
        self.server
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("/matchups/{}", id)))
    }

    async fn create(&self, request: &CreateMatchupRequest) -> Result<MatchupRecord> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        let id = MatchupId(self.next_id.fetch_add(1, Ordering::SeqCst) as i64);
        let record = MatchupRecord {
            id,
            title: request.title.clone(),
            sport: request.sport.clone(),
            location: request.location.clone(),
            description: request.description.clone(),
            event_date: request.event_date,
            max_participants: request.max_participants,
            skill_level: request.skill_level,
            creator_id: request.creator_id,
            participants: Vec::new(),
            status: MatchupStatus::Open,
            contact_email: None,
            created_at: Some(Utc::now()),
        };
        self.server.lock().unwrap().insert(id, record.clone());
        Ok(record)
    }

    async fn join(&self, id: MatchupId, user: UserId) -> Result<MatchupRecord> {
        self.calls.join.fetch_add(1, Ordering::SeqCst);
        self.hold().await;
        if let Some(err) = self.injected() {
            return Err(err);
        }

        let mut server = self.server.lock().unwrap();
        let record = server
            .get_mut(&id)
            .ok_or_else(|| ClientError::NotFound(format!("/matchups/{}", id)))?;
        if record.is_closed() {
            return Err(MatchupError::InvalidState(id).into());
        }
        if record.is_member(user) || CapacityGuard::is_full(record) {
            return Err(ClientError::Conflict("join rejected".to_string()));
        }
        record.participants.push(participant(user.0));
        Ok(record.clone())
    }

    async fn close(&self, id: MatchupId) -> Result<MatchupRecord> {
        self.calls.close.fetch_add(1, Ordering::SeqCst);
        self.hold().await;
        if let Some(err) = self.injected() {
            return Err(err);
        }

        let mut server = self.server.lock().unwrap();
        let record = server
            .get_mut(&id)
            .ok_or_else(|| ClientError::NotFound(format!("/matchups/{}", id)))?;
        record.status = MatchupStatus::Closed;
        Ok(record.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub fn session(user: i64) -> Arc<StaticSession> {
    Arc::new(StaticSession::new(
        Identity::new(UserId(user), format!("User {}", user)),
        Some(format!("token-{}", user)),
    ))
}

pub fn mutator(api: &Arc<FakeApi>, user: i64, store: &Arc<MatchupStore>) -> OptimisticMutator {
    OptimisticMutator::new(api.clone(), session(user), store)
}

/// Store loaded with the client's current view of the given records.
pub fn store_with(records: Vec<MatchupRecord>) -> Arc<MatchupStore> {
    let store = Arc::new(MatchupStore::new());
    store.replace_all(records);
    store
}

/// Yield to spawned tasks until `condition` holds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached");
}
