use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::draft::{ArticleDraft, ArticleStatus, ArticleType};
use crate::domain::identity::ArticleId;

/// Body sent on both create and update.
/// Absent optional fields are normalized to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePayload {
    pub title: String,
    pub subtitle: String,
    pub excerpt: String,
    pub content: String,
    #[serde(rename = "type")]
    pub article_type: ArticleType,
    pub status: ArticleStatus,
    pub featured_image: String,
    pub tags: Vec<String>,
    pub allow_comments: bool,
    pub is_featured: bool,
    pub meta_title: String,
    pub meta_description: String,
    pub category_id: Option<i32>,
}

impl From<&ArticleDraft> for ArticlePayload {
    fn from(draft: &ArticleDraft) -> Self {
        Self {
            title: draft.title.clone(),
            subtitle: draft.subtitle.clone(),
            excerpt: draft.excerpt.clone(),
            content: draft.content.clone(),
            article_type: draft.article_type,
            status: draft.status,
            featured_image: draft.featured_image.clone().unwrap_or_default(),
            tags: draft.tags.clone(),
            allow_comments: draft.allow_comments,
            is_featured: draft.is_featured,
            meta_title: draft.meta_title.clone(),
            meta_description: draft.meta_description.clone(),
            category_id: draft.category_id.filter(|id| *id != 0),
        }
    }
}

/// What the gateway answers after create or update.
/// Create responses must carry `id`, update responses may omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedArticle {
    #[serde(default)]
    pub id: Option<ArticleId>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl SavedArticle {
    /// Echo of the stored payload, used by gateways that do not get a body back
    pub fn from_payload(id: Option<ArticleId>, payload: &ArticlePayload) -> Self {
        let rest = match serde_json::to_value(payload) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self { id, rest }
    }
}

fn default_true() -> bool {
    true
}

/// A persisted article as returned by `fetch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: ArticleId,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default)]
    pub article_type: ArticleType,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_comments: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl ArticleRecord {
    pub fn from_payload(id: ArticleId, payload: ArticlePayload) -> Self {
        Self {
            id,
            title: payload.title,
            subtitle: payload.subtitle,
            excerpt: payload.excerpt,
            content: payload.content,
            article_type: payload.article_type,
            status: payload.status,
            featured_image: Some(payload.featured_image).filter(|url| !url.is_empty()),
            tags: payload.tags,
            allow_comments: payload.allow_comments,
            is_featured: payload.is_featured,
            meta_title: payload.meta_title,
            meta_description: payload.meta_description,
            category_id: payload.category_id,
            created_at: None,
            updated_at: None,
            published_at: None,
        }
    }
}

impl From<ArticleRecord> for ArticleDraft {
    fn from(record: ArticleRecord) -> Self {
        Self {
            title: record.title,
            subtitle: record.subtitle,
            excerpt: record.excerpt,
            content: record.content,
            article_type: record.article_type,
            status: record.status,
            category_id: record.category_id,
            featured_image: record.featured_image.filter(|url| !url.is_empty()),
            tags: record.tags,
            allow_comments: record.allow_comments,
            is_featured: record.is_featured,
            meta_title: record.meta_title,
            meta_description: record.meta_description,
        }
    }
}
