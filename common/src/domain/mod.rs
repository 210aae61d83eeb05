use std::fmt::{Display, Formatter};

pub mod draft;
pub mod identity;
pub mod payload;

pub use draft::{
    ArticleDraft, ArticleStatus, ArticleType, DraftSnapshot, FieldStore, FieldValue,
    SharedFieldStore, is_eligible, missing_fields,
};
pub use identity::{ArticleId, RemoteIdentity};
pub use payload::{ArticlePayload, ArticleRecord, SavedArticle};

/// Remote store for articles, consumed by the autosave machinery as a black box.
/// Implementations: postgres, http, and the recording fake in `test_utils`.
pub trait ArticleGateway: Clone + Send + Sync + 'static {
    /// create a new article, the response must carry the assigned id
    fn create(
        &self,
        payload: ArticlePayload,
    ) -> impl Future<Output = Result<SavedArticle, GatewayError>> + Send;

    /// overwrite an existing article
    fn update(
        &self,
        id: ArticleId,
        payload: ArticlePayload,
    ) -> impl Future<Output = Result<SavedArticle, GatewayError>> + Send;

    /// load an existing article to hydrate the edit flow
    fn fetch(
        &self,
        id: ArticleId,
    ) -> impl Future<Output = Result<ArticleRecord, GatewayError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// network or driver level failure
    Transport(String),
    /// the remote side answered with a non-success status
    Rejected { status: u16, message: String },
    NotFound,
    /// the remote side answered with something we could not read
    Decode(String),
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::Transport(cause) => write!(f, "request failed: {}", cause),
            GatewayError::Rejected { status, message } => {
                write!(f, "request rejected with status {}: {}", status, message)
            }
            GatewayError::NotFound => write!(f, "article not found"),
            GatewayError::Decode(cause) => write!(f, "failed to decode response: {}", cause),
        }
    }
}

impl std::error::Error for GatewayError {}
