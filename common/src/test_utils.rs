use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::domain::{
    ArticleGateway, ArticleId, ArticlePayload, ArticleRecord, GatewayError, SavedArticle,
};

/// One call observed by [`RecordingGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create(ArticlePayload),
    Update(ArticleId, ArticlePayload),
    Fetch(ArticleId),
}

/// In-memory gateway that records every call.
///
/// Public so that other crates can reuse it for their own tests.
/// Failures can be queued with `fail_next`, and `hold` keeps every response
/// pending until `release` is called.
#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    state: Arc<Mutex<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<GatewayCall>,
    next_id: i32,
    failures: VecDeque<GatewayError>,
    records: HashMap<ArticleId, ArticleRecord>,
    gate: Option<watch::Sender<bool>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::with_next_id(1)
    }

    /// The next `create` answers with this id
    pub fn with_next_id(next_id: i32) -> Self {
        let gateway = Self::default();
        gateway.lock().next_id = next_id;
        gateway
    }

    /// Seed a record for the edit flow
    pub fn with_record(self, record: ArticleRecord) -> Self {
        self.lock().records.insert(record.id, record);
        self
    }

    /// The next create or update call fails with `error`
    pub fn fail_next(&self, error: GatewayError) {
        self.lock().failures.push_back(error);
    }

    /// Keep responses pending until `release`
    pub fn hold(&self) {
        let (gate, _) = watch::channel(false);
        self.lock().gate = Some(gate);
    }

    pub fn release(&self) {
        if let Some(gate) = self.lock().gate.take() {
            gate.send_replace(true);
        }
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn creates(&self) -> usize {
        self.count(|call| matches!(call, GatewayCall::Create(_)))
    }

    pub fn updates(&self) -> usize {
        self.count(|call| matches!(call, GatewayCall::Update(..)))
    }

    pub fn record(&self, id: ArticleId) -> Option<ArticleRecord> {
        self.lock().records.get(&id).cloned()
    }

    fn count(&self, predicate: impl Fn(&GatewayCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    /// Register the call and wait for the gate, if any
    async fn enter(&self, call: GatewayCall) {
        let gate = {
            let mut state = self.lock();
            state.calls.push(call);
            state.gate.as_ref().map(|gate| gate.subscribe())
        };
        if let Some(mut gate) = gate {
            // a dropped sender means the gate was released
            let _ = gate.wait_for(|open| *open).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ArticleGateway for RecordingGateway {
    async fn create(&self, payload: ArticlePayload) -> Result<SavedArticle, GatewayError> {
        self.enter(GatewayCall::Create(payload.clone())).await;

        let mut state = self.lock();
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        let id = ArticleId::try_new(state.next_id)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        state.next_id += 1;

        let saved = SavedArticle::from_payload(Some(id), &payload);
        state.records.insert(id, ArticleRecord::from_payload(id, payload));
        Ok(saved)
    }

    async fn update(
        &self,
        id: ArticleId,
        payload: ArticlePayload,
    ) -> Result<SavedArticle, GatewayError> {
        self.enter(GatewayCall::Update(id, payload.clone())).await;

        let mut state = self.lock();
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        if !state.records.contains_key(&id) {
            return Err(GatewayError::NotFound);
        }

        let saved = SavedArticle::from_payload(None, &payload);
        state.records.insert(id, ArticleRecord::from_payload(id, payload));
        Ok(saved)
    }

    async fn fetch(&self, id: ArticleId) -> Result<ArticleRecord, GatewayError> {
        self.enter(GatewayCall::Fetch(id)).await;
        self.lock().records.get(&id).cloned().ok_or(GatewayError::NotFound)
    }
}
