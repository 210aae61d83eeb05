use std::sync::{Mutex, MutexGuard};

use folio_common::{
    ArticleGateway, ArticleId, ArticlePayload, ArticleStatus, FieldValue, GatewayError,
    RemoteIdentity, SharedFieldStore, is_eligible,
};
use tokio::sync::watch;

use crate::domain::autosave::status::ReconciliationStatus;

/// Result of one reconciliation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created(ArticleId),
    Updated(ArticleId),
    Skipped(SkipReason),
    Failed(GatewayError),
    /// the response arrived after the session was closed and was dropped
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Ineligible,
    /// another save for this article is still running
    InFlight,
    Closed,
}

#[derive(Debug, Default)]
struct ReconcilerState {
    identity: RemoteIdentity,
    closed: bool,
}

/// Decides create vs update, calls the gateway and tracks identity and status.
///
/// At most one gateway call is in flight at a time. A trigger arriving while a
/// save runs is dropped; the next debounce cycle picks up the current fields.
pub struct DraftReconciler<G: ArticleGateway> {
    gateway: G,
    state: Mutex<ReconcilerState>,
    status: watch::Sender<ReconciliationStatus>,
}

impl<G: ArticleGateway> DraftReconciler<G> {
    pub fn new(gateway: G, identity: RemoteIdentity) -> Self {
        let (status, _) = watch::channel(ReconciliationStatus::Idle);
        Self {
            gateway,
            state: Mutex::new(ReconcilerState {
                identity,
                closed: false,
            }),
            status,
        }
    }

    pub fn identity(&self) -> RemoteIdentity {
        self.lock().identity
    }

    pub fn status(&self) -> ReconciliationStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReconciliationStatus> {
        self.status.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// A field changed: a "saved" badge no longer holds
    pub fn mark_edited(&self) {
        let _state = self.lock();
        self.status.send_if_modified(|status| {
            if *status == ReconciliationStatus::Saved {
                *status = ReconciliationStatus::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Stop applying responses. Calls still in flight complete but are discarded.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Wait until no save is in flight
    pub async fn settled(&self) {
        let mut status = self.status.subscribe();
        let _ = status.wait_for(|status| !status.is_saving()).await;
    }

    pub async fn reconcile(&self, store: &SharedFieldStore) -> ReconcileOutcome {
        self.reconcile_as(store, None).await
    }

    /// Same as `reconcile`, but sends `status` instead of the draft's own.
    ///
    /// The store takes the new status only once the gateway accepted it, so a
    /// rejected publish leaves later autosaves sending the previous status.
    pub async fn reconcile_as(
        &self,
        store: &SharedFieldStore,
        status: Option<ArticleStatus>,
    ) -> ReconcileOutcome {
        let (snapshot, identity) = {
            let state = self.lock();
            // read under the lock so a status committed by the previous save is seen
            let snapshot = store.snapshot();
            if state.closed {
                return ReconcileOutcome::Skipped(SkipReason::Closed);
            }
            if self.status.borrow().is_saving() {
                tracing::debug!("save already in flight, skipping trigger");
                return ReconcileOutcome::Skipped(SkipReason::InFlight);
            }
            if !is_eligible(&snapshot.draft) {
                tracing::trace!("draft is not eligible for saving yet");
                return ReconcileOutcome::Skipped(SkipReason::Ineligible);
            }
            self.status.send_replace(ReconciliationStatus::Saving);
            (snapshot, state.identity)
        };

        let mut payload = ArticlePayload::from(&snapshot.draft);
        if let Some(status) = status {
            payload.status = status;
        }
        let result = match identity {
            RemoteIdentity::Unassigned => {
                tracing::debug!(revision = snapshot.revision, "creating article");
                self.gateway.create(payload).await.and_then(|saved| {
                    saved
                        .id
                        .map(ReconcileOutcome::Created)
                        .ok_or_else(|| GatewayError::Decode("create response has no id".into()))
                })
            }
            RemoteIdentity::Assigned(id) => {
                tracing::debug!(%id, revision = snapshot.revision, "updating article");
                self.gateway
                    .update(id, payload)
                    .await
                    .map(|_| ReconcileOutcome::Updated(id))
            }
        };

        let mut state = self.lock();
        if state.closed {
            tracing::debug!("session closed while saving, discarding response");
            return ReconcileOutcome::Discarded;
        }

        match result {
            Ok(outcome) => {
                if let ReconcileOutcome::Created(id) = outcome {
                    state.identity.assign(id);
                    tracing::info!(%id, "article created");
                }
                // edits made while the call was running are not saved yet
                let reconciled = if store.revision() == snapshot.revision {
                    ReconciliationStatus::Saved
                } else {
                    ReconciliationStatus::Idle
                };
                if let Some(status) = status.filter(|status| *status != snapshot.draft.status) {
                    store.set_field(FieldValue::Status(status));
                }
                self.status.send_replace(reconciled);
                outcome
            }
            Err(error) => {
                tracing::warn!("autosave failed: {}", error);
                self.status
                    .send_replace(ReconciliationStatus::Failed(error.to_string()));
                ReconcileOutcome::Failed(error)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReconcilerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
