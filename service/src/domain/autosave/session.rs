use std::fmt::{Display, Formatter};
use std::sync::Arc;

use folio_common::{
    ArticleDraft, ArticleGateway, ArticleId, ArticleStatus, FieldStore, FieldValue,
    GatewayError, RemoteIdentity, SharedFieldStore, is_eligible, missing_fields,
};
use tokio::sync::watch;

use crate::domain::autosave::{
    reconciler::{DraftReconciler, ReconcileOutcome, SkipReason},
    scheduler::{Debouncer, DelayPolicy},
    status::{ReconciliationStatus, SaveIndicator},
};

/// Failure of an explicit, user initiated save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    Ineligible(Vec<&'static str>),
    Gateway(GatewayError),
    Closed,
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Ineligible(missing) => {
                write!(f, "missing required fields: {}", missing.join(", "))
            }
            SaveError::Gateway(error) => write!(f, "{}", error),
            SaveError::Closed => write!(f, "authoring session is closed"),
        }
    }
}

impl std::error::Error for SaveError {}

/// Point in time view of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub draft: ArticleDraft,
    pub revision: u64,
    pub article_id: Option<ArticleId>,
    pub status: ReconciliationStatus,
}

impl SessionSnapshot {
    pub fn indicator(&self) -> SaveIndicator {
        SaveIndicator::from(&self.status)
    }
}

/// One article authoring view: field store, debounced autosave and explicit saves.
///
/// Dropping or closing the session cancels the pending autosave and makes
/// any response still in flight a no-op.
pub struct AuthoringSession<G: ArticleGateway> {
    store: SharedFieldStore,
    reconciler: Arc<DraftReconciler<G>>,
    debouncer: Debouncer,
    policy: DelayPolicy,
}

impl<G: ArticleGateway> AuthoringSession<G> {
    /// Create flow: empty draft without remote identity
    pub fn create(gateway: G, policy: DelayPolicy) -> Self {
        Self::new(gateway, policy, FieldStore::default(), RemoteIdentity::Unassigned)
    }

    /// Edit flow: hydrate the draft from the stored article
    pub async fn edit(gateway: G, policy: DelayPolicy, id: ArticleId) -> Result<Self, GatewayError> {
        let record = gateway.fetch(id).await?;
        let store = FieldStore::new(ArticleDraft::from(record));
        Ok(Self::new(gateway, policy, store, RemoteIdentity::Assigned(id)))
    }

    fn new(gateway: G, policy: DelayPolicy, store: FieldStore, identity: RemoteIdentity) -> Self {
        Self {
            store: SharedFieldStore::new(store),
            reconciler: Arc::new(DraftReconciler::new(gateway, identity)),
            debouncer: Debouncer::new(),
            policy,
        }
    }

    /// Apply one user edit and (re)arm the autosave
    pub fn set_field(&self, value: FieldValue) {
        tracing::trace!(field = value.name(), "field changed");
        self.store.set_field(value);
        self.reconciler.mark_edited();

        if !self.store.with_draft(is_eligible) {
            self.debouncer.cancel();
            return;
        }

        let delay = self.policy.delay_for(&self.reconciler.identity());
        let reconciler = Arc::clone(&self.reconciler);
        let store = self.store.clone();
        self.debouncer.schedule(delay, move || async move {
            reconciler.reconcile(&store).await;
        });
    }

    /// Explicit "save as draft"
    pub async fn save_draft(&self) -> Result<ArticleId, SaveError> {
        self.save_as(ArticleStatus::Draft).await
    }

    /// Explicit "publish"
    pub async fn publish(&self) -> Result<ArticleId, SaveError> {
        self.save_as(ArticleStatus::Published).await
    }

    async fn save_as(&self, status: ArticleStatus) -> Result<ArticleId, SaveError> {
        if self.reconciler.is_closed() {
            return Err(SaveError::Closed);
        }
        self.debouncer.cancel();

        loop {
            let missing = self.store.with_draft(missing_fields);
            if !missing.is_empty() {
                return Err(SaveError::Ineligible(missing));
            }

            self.reconciler.settled().await;

            match self.reconciler.reconcile_as(&self.store, Some(status)).await {
                ReconcileOutcome::Created(id) | ReconcileOutcome::Updated(id) => {
                    tracing::info!(%id, status = status.as_str(), "article saved");
                    return Ok(id);
                }
                ReconcileOutcome::Failed(error) => return Err(SaveError::Gateway(error)),
                // an autosave slipped in between settling and our attempt
                ReconcileOutcome::Skipped(SkipReason::InFlight) => continue,
                ReconcileOutcome::Skipped(SkipReason::Ineligible) => continue,
                ReconcileOutcome::Skipped(SkipReason::Closed) | ReconcileOutcome::Discarded => {
                    return Err(SaveError::Closed);
                }
            }
        }
    }

    /// Tear the session down
    pub fn close(&self) {
        self.debouncer.cancel();
        self.reconciler.close();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let draft = self.store.snapshot();
        SessionSnapshot {
            draft: draft.draft,
            revision: draft.revision,
            article_id: self.reconciler.identity().id(),
            status: self.reconciler.status(),
        }
    }

    pub fn identity(&self) -> RemoteIdentity {
        self.reconciler.identity()
    }

    pub fn status(&self) -> ReconciliationStatus {
        self.reconciler.status()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReconciliationStatus> {
        self.reconciler.subscribe()
    }

    pub fn autosave_pending(&self) -> bool {
        self.debouncer.is_armed()
    }

    /// An autosave is armed or a save is running
    pub fn is_busy(&self) -> bool {
        self.autosave_pending() || self.status().is_saving()
    }
}

impl<G: ArticleGateway> Drop for AuthoringSession<G> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use folio_common::test_utils::{GatewayCall, RecordingGateway};
    use folio_common::{ArticlePayload, ArticleRecord, ArticleType};

    use super::*;

    fn id(value: i32) -> ArticleId {
        ArticleId::try_new(value).unwrap()
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    async fn idle(duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn fill_required(session: &AuthoringSession<RecordingGateway>) {
        session.set_field(FieldValue::Title("Hello".into()));
        session.set_field(FieldValue::Content("<p>World</p>".into()));
        session.set_field(FieldValue::CategoryId(Some(3)));
    }

    fn expected_payload() -> ArticlePayload {
        ArticlePayload {
            title: "Hello".into(),
            subtitle: String::new(),
            excerpt: String::new(),
            content: "<p>World</p>".into(),
            article_type: ArticleType::BlogPost,
            status: ArticleStatus::Draft,
            featured_image: String::new(),
            tags: Vec::new(),
            allow_comments: true,
            is_featured: false,
            meta_title: String::new(),
            meta_description: String::new(),
            category_id: Some(3),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_article_is_created_after_quiet_period() {
        let gateway = RecordingGateway::with_next_id(42);
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());

        fill_required(&session);
        assert!(session.autosave_pending());

        idle(ms(2999)).await;
        assert!(gateway.calls().is_empty());

        idle(ms(2)).await;
        assert_eq!(gateway.calls(), vec![GatewayCall::Create(expected_payload())]);
        assert_eq!(session.identity(), RemoteIdentity::Assigned(id(42)));
        assert_eq!(session.status(), ReconciliationStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_article_is_updated_with_short_delay() {
        let gateway = RecordingGateway::with_next_id(42);
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);
        idle(ms(3001)).await;

        session.set_field(FieldValue::Subtitle("Sub".into()));
        assert_eq!(session.status(), ReconciliationStatus::Idle);

        idle(ms(1499)).await;
        assert_eq!(gateway.calls().len(), 1);

        idle(ms(2)).await;
        let expected = ArticlePayload {
            subtitle: "Sub".into(),
            ..expected_payload()
        };
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::Create(expected_payload()),
                GatewayCall::Update(id(42), expected),
            ]
        );
        assert_eq!(gateway.creates(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_draft_without_category_is_never_saved() {
        let gateway = RecordingGateway::new();
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());

        session.set_field(FieldValue::Title("Hello".into()));
        session.set_field(FieldValue::Content("<p>World</p>".into()));
        assert!(!session.autosave_pending());

        idle(Duration::from_secs(600)).await;
        assert!(gateway.calls().is_empty());
        assert_eq!(session.status(), ReconciliationStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_saves_latest_values_once() {
        let gateway = RecordingGateway::new();
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        for title in ["H", "He", "Hel", "Hell", "Hello world"] {
            idle(ms(500)).await;
            session.set_field(FieldValue::Title(title.into()));
        }
        idle(ms(3001)).await;

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(&calls[0], GatewayCall::Create(p) if p.title == "Hello world"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_keeps_edits_and_retries_on_next_cycle() {
        let gateway = RecordingGateway::new();
        gateway.hold();
        gateway.fail_next(GatewayError::Rejected {
            status: 500,
            message: "boom".into(),
        });
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        idle(ms(3001)).await;
        assert_eq!(session.status(), ReconciliationStatus::Saving);
        let before = session.snapshot().draft;

        session.set_field(FieldValue::Excerpt("typed while saving".into()));
        gateway.release();
        let _ = session.subscribe().wait_for(|s| !s.is_saving()).await;

        assert!(matches!(session.status(), ReconciliationStatus::Failed(_)));
        assert!(session.snapshot().indicator().failed);
        let after = session.snapshot().draft;
        assert_eq!(
            after,
            ArticleDraft {
                excerpt: "typed while saving".into(),
                ..before
            }
        );
        assert_eq!(session.identity(), RemoteIdentity::Unassigned);

        // the excerpt edit armed a fresh cycle, which retries as a create
        idle(ms(3001)).await;
        assert_eq!(gateway.creates(), 2);
        assert_eq!(session.identity(), RemoteIdentity::Assigned(id(1)));
        assert_eq!(session.status(), ReconciliationStatus::Saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_during_save_does_not_issue_second_call() {
        let gateway = RecordingGateway::with_next_id(42);
        gateway.hold();
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        idle(ms(3001)).await;
        assert_eq!(gateway.calls().len(), 1);

        session.set_field(FieldValue::Subtitle("Sub".into()));
        idle(ms(3001)).await;
        assert_eq!(gateway.calls().len(), 1);

        gateway.release();
        let _ = session.subscribe().wait_for(|s| !s.is_saving()).await;
        assert_eq!(session.identity(), RemoteIdentity::Assigned(id(42)));
        assert_eq!(session.status(), ReconciliationStatus::Idle);

        session.set_field(FieldValue::Excerpt("Ex".into()));
        idle(ms(1501)).await;
        assert_eq!(gateway.creates(), 1);
        assert!(matches!(
            &gateway.calls()[1],
            GatewayCall::Update(article, p) if *article == id(42) && p.subtitle == "Sub"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_flow_hydrates_and_only_updates() {
        let record = ArticleRecord::from_payload(id(7), expected_payload());
        let gateway = RecordingGateway::new().with_record(record);

        let session = AuthoringSession::edit(gateway.clone(), DelayPolicy::default(), id(7))
            .await
            .unwrap();
        assert_eq!(session.snapshot().draft.title, "Hello");
        assert_eq!(session.snapshot().article_id, Some(id(7)));

        session.set_field(FieldValue::Tags(vec!["essay".into()]));
        idle(ms(1501)).await;

        assert_eq!(gateway.creates(), 0);
        assert_eq!(gateway.updates(), 1);
        assert_eq!(gateway.record(id(7)).unwrap().tags, vec!["essay".to_string()]);
    }

    #[tokio::test]
    async fn test_edit_flow_for_missing_article_fails() {
        let gateway = RecordingGateway::new();
        let result = AuthoringSession::edit(gateway, DelayPolicy::default(), id(7)).await;
        assert!(matches!(result, Err(GatewayError::NotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_autosave() {
        let gateway = RecordingGateway::new();
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        session.close();
        idle(Duration::from_secs(10)).await;
        assert!(gateway.calls().is_empty());

        assert_eq!(session.save_draft().await, Err(SaveError::Closed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_session_cancels_pending_autosave() {
        let gateway = RecordingGateway::new();
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        drop(session);
        idle(Duration::from_secs(10)).await;
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_save_reports_missing_fields() {
        let gateway = RecordingGateway::new();
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        session.set_field(FieldValue::Title("Hello".into()));

        assert_eq!(
            session.save_draft().await,
            Err(SaveError::Ineligible(vec!["content", "categoryId"]))
        );
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_saves_immediately_and_cancels_autosave() {
        let gateway = RecordingGateway::with_next_id(42);
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        assert_eq!(session.publish().await, Ok(id(42)));
        assert!(!session.autosave_pending());

        idle(Duration::from_secs(10)).await;
        let expected = ArticlePayload {
            status: ArticleStatus::Published,
            ..expected_payload()
        };
        assert_eq!(gateway.calls(), vec![GatewayCall::Create(expected)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_published_status_sticks_for_later_autosaves() {
        let gateway = RecordingGateway::with_next_id(42);
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        assert_eq!(session.publish().await, Ok(id(42)));
        assert_eq!(session.snapshot().draft.status, ArticleStatus::Published);

        session.set_field(FieldValue::Subtitle("Sub".into()));
        idle(ms(1501)).await;
        assert!(matches!(
            &gateway.calls()[1],
            GatewayCall::Update(_, p) if p.status == ArticleStatus::Published
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_of_incomplete_draft_does_not_publish_later_autosave() {
        let gateway = RecordingGateway::new();
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        session.set_field(FieldValue::Title("Hello".into()));
        session.set_field(FieldValue::Content("<p>World</p>".into()));

        assert_eq!(
            session.publish().await,
            Err(SaveError::Ineligible(vec!["categoryId"]))
        );
        assert_eq!(session.snapshot().draft.status, ArticleStatus::Draft);

        session.set_field(FieldValue::CategoryId(Some(3)));
        idle(ms(3001)).await;

        assert_eq!(gateway.calls(), vec![GatewayCall::Create(expected_payload())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_publish_does_not_publish_later_autosave() {
        let gateway = RecordingGateway::new();
        gateway.fail_next(GatewayError::Transport("offline".into()));
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        assert_eq!(
            session.publish().await,
            Err(SaveError::Gateway(GatewayError::Transport("offline".into())))
        );
        assert_eq!(session.snapshot().draft.status, ArticleStatus::Draft);

        session.set_field(FieldValue::Excerpt("Ex".into()));
        idle(ms(3001)).await;

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], GatewayCall::Create(p) if p.status == ArticleStatus::Published));
        assert!(matches!(
            &calls[1],
            GatewayCall::Create(p) if p.status == ArticleStatus::Draft && p.excerpt == "Ex"
        ));
        assert_eq!(session.identity(), RemoteIdentity::Assigned(id(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_save_surfaces_gateway_error() {
        let gateway = RecordingGateway::new();
        gateway.fail_next(GatewayError::Transport("offline".into()));
        let session = AuthoringSession::create(gateway.clone(), DelayPolicy::default());
        fill_required(&session);

        assert_eq!(
            session.save_draft().await,
            Err(SaveError::Gateway(GatewayError::Transport("offline".into())))
        );
        assert_eq!(session.snapshot().draft.title, "Hello");
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_save_waits_for_running_autosave() {
        let gateway = RecordingGateway::with_next_id(42);
        gateway.hold();
        let session = Arc::new(AuthoringSession::create(
            gateway.clone(),
            DelayPolicy::default(),
        ));
        fill_required(&session);
        idle(ms(3001)).await;
        assert_eq!(session.status(), ReconciliationStatus::Saving);

        let publish = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.publish().await }
        });
        tokio::task::yield_now().await;
        assert_eq!(gateway.calls().len(), 1);

        gateway.release();
        assert_eq!(publish.await.unwrap(), Ok(id(42)));
        assert_eq!(gateway.creates(), 1);
        assert!(matches!(
            &gateway.calls()[1],
            GatewayCall::Update(_, p) if p.status == ArticleStatus::Published
        ));
    }
}
