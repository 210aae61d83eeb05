use folio_common::{ArticleDraft, ArticleId, ArticleStatus};
use serde::{Deserialize, Serialize};

use crate::domain::autosave::{SaveIndicator, SessionSnapshot};
use crate::domain::sessions::SessionId;

/// Request for open session route, without article id a new article is authored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub article_id: Option<i32>,
}

/// Response for every session route
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    session_id: String,
    article_id: Option<i32>,
    revision: u64,
    indicator: SaveIndicator,
    draft: ArticleDraft,
}

impl From<(SessionId, SessionSnapshot)> for SessionResponse {
    fn from((session_id, snapshot): (SessionId, SessionSnapshot)) -> Self {
        Self {
            session_id: session_id.to_string(),
            article_id: snapshot.article_id.map(ArticleId::into_inner),
            revision: snapshot.revision,
            indicator: snapshot.indicator(),
            draft: snapshot.draft,
        }
    }
}

/// Response for explicit save routes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArticleResponse {
    article_id: i32,
    status: ArticleStatus,
}

impl SavedArticleResponse {
    pub fn new(article_id: ArticleId, status: ArticleStatus) -> Self {
        Self {
            article_id: article_id.into_inner(),
            status,
        }
    }
}
