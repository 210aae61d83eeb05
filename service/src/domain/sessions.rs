use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use folio_common::{ArticleGateway, ArticleId, GatewayError};
use tokio::task::AbortHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::domain::autosave::{AuthoringSession, DelayPolicy};

/// Wrapper to prevent ID confusion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl TryFrom<&str> for SessionId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let uuid = Uuid::parse_str(value)?;
        Ok(Self(uuid))
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct OpenSession<G: ArticleGateway> {
    session: Arc<AuthoringSession<G>>,
    last_seen: Instant,
}

/// Open authoring sessions, one per article form the admin has on screen.
///
/// A client that goes away without closing its session is treated as having
/// navigated away once the session has been untouched for `idle_timeout`.
pub struct SessionRegistry<G: ArticleGateway> {
    gateway: G,
    policy: DelayPolicy,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<SessionId, OpenSession<G>>>,
    sweeper: Mutex<Option<AbortHandle>>,
}

impl<G: ArticleGateway> SessionRegistry<G> {
    pub fn new(gateway: G, policy: DelayPolicy, idle_timeout: Duration) -> Self {
        Self {
            gateway,
            policy,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
            sweeper: Mutex::new(None),
        }
    }

    /// Start authoring a new article
    pub fn open_new(&self) -> (SessionId, Arc<AuthoringSession<G>>) {
        let session = AuthoringSession::create(self.gateway.clone(), self.policy);
        self.insert(session)
    }

    /// Start editing a stored article
    pub async fn open_existing(
        &self,
        id: ArticleId,
    ) -> Result<(SessionId, Arc<AuthoringSession<G>>), GatewayError> {
        let session = AuthoringSession::edit(self.gateway.clone(), self.policy, id).await?;
        Ok(self.insert(session))
    }

    /// Look a session up and mark it as seen
    pub fn get(&self, id: &SessionId) -> Option<Arc<AuthoringSession<G>>> {
        let mut sessions = self.write();
        let open = sessions.get_mut(id)?;
        open.last_seen = Instant::now();
        Some(Arc::clone(&open.session))
    }

    /// Remove and tear down a session. Returns false if it was not open.
    pub fn close(&self, id: &SessionId) -> bool {
        let removed = self.write().remove(id);
        match removed {
            Some(open) => {
                open.session.close();
                tracing::debug!(session = %id, "authoring session closed");
                true
            }
            None => false,
        }
    }

    /// Close every session untouched for longer than the idle timeout.
    /// Sessions with an autosave armed or running are kept until it is done.
    pub fn close_idle(&self) -> usize {
        let now = Instant::now();
        let mut closed = 0;

        self.write().retain(|id, open| {
            let expired = now.duration_since(open.last_seen) >= self.idle_timeout
                && !open.session.is_busy();
            if expired {
                open.session.close();
                tracing::info!(session = %id, "closing idle authoring session");
                closed += 1;
            }
            !expired
        });

        closed
    }

    /// Run `close_idle` every `interval` until the registry is dropped
    pub fn start_idle_sweep(self: &Arc<Self>, interval: Duration) {
        let mut sweeper = self.sweeper.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = sweeper.take() {
            existing.abort();
        }

        let registry = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let closed = registry.close_idle();
                if closed > 0 {
                    tracing::debug!(closed, open = registry.len(), "idle session sweep");
                }
            }
        })
        .abort_handle();

        *sweeper = Some(handle);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn insert(&self, session: AuthoringSession<G>) -> (SessionId, Arc<AuthoringSession<G>>) {
        let id = SessionId::generate();
        let session = Arc::new(session);
        self.write().insert(
            id,
            OpenSession {
                session: Arc::clone(&session),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!(session = %id, article = ?session.identity().id(), "authoring session opened");
        (id, session)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, OpenSession<G>>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, OpenSession<G>>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl<G: ArticleGateway> Drop for SessionRegistry<G> {
    fn drop(&mut self) {
        let sweeper = self.sweeper.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = sweeper.take() {
            handle.abort();
        }
    }
}
