use crate::domain::sessions::SessionRegistry;
use folio_common::ArticleGateway;

pub mod autosave;
pub mod sessions;

/// The global application state shared between all request handlers.
pub trait AppState: Clone + Send + Sync + 'static {
    type G: ArticleGateway;
    fn sessions(&self) -> &SessionRegistry<Self::G>;
}
