use std::sync::Arc;

use folio_common::ArticleGateway;

use crate::domain::AppState;
use crate::domain::sessions::SessionRegistry;

pub mod gateway;
pub mod http;
pub mod settings;

pub struct AppStateImpl<G: ArticleGateway> {
    sessions: Arc<SessionRegistry<G>>,
}

impl<G: ArticleGateway> AppStateImpl<G> {
    pub fn new(sessions: Arc<SessionRegistry<G>>) -> Self {
        Self { sessions }
    }
}

impl<G: ArticleGateway> Clone for AppStateImpl<G> {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<G: ArticleGateway> AppState for AppStateImpl<G> {
    type G = G;

    fn sessions(&self) -> &SessionRegistry<Self::G> {
        &self.sessions
    }
}
