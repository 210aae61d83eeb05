use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
            ArticleStatus::Archived => "archived",
        }
    }
}

impl TryFrom<&str> for ArticleStatus {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            "archived" => Ok(ArticleStatus::Archived),
            other => Err(anyhow!("unknown article status '{}'", other)),
        }
    }
}

/// Kind of content the portfolio publishes, the authoring screens only produce blog posts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleType {
    #[default]
    BlogPost,
    BookChapter,
    Paper,
    Media,
    Creative,
}

impl ArticleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleType::BlogPost => "blog_post",
            ArticleType::BookChapter => "book_chapter",
            ArticleType::Paper => "paper",
            ArticleType::Media => "media",
            ArticleType::Creative => "creative",
        }
    }
}

impl TryFrom<&str> for ArticleType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "blog_post" => Ok(ArticleType::BlogPost),
            "book_chapter" => Ok(ArticleType::BookChapter),
            "paper" => Ok(ArticleType::Paper),
            "media" => Ok(ArticleType::Media),
            "creative" => Ok(ArticleType::Creative),
            other => Err(anyhow!("unknown article type '{}'", other)),
        }
    }
}

/// The article as it is being authored.
/// `content` holds the rich text editor output serialized as HTML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDraft {
    pub title: String,
    pub subtitle: String,
    pub excerpt: String,
    pub content: String,
    #[serde(rename = "type")]
    pub article_type: ArticleType,
    pub status: ArticleStatus,
    pub category_id: Option<i32>,
    pub featured_image: Option<String>,
    pub tags: Vec<String>,
    pub allow_comments: bool,
    pub is_featured: bool,
    pub meta_title: String,
    pub meta_description: String,
}

impl Default for ArticleDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            subtitle: String::new(),
            excerpt: String::new(),
            content: String::new(),
            article_type: ArticleType::default(),
            status: ArticleStatus::default(),
            category_id: None,
            featured_image: None,
            tags: Vec::new(),
            allow_comments: true,
            is_featured: false,
            meta_title: String::new(),
            meta_description: String::new(),
        }
    }
}

/// One field assignment coming from the authoring form.
/// JSON form: `{"field": "categoryId", "value": 3}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    Title(String),
    Subtitle(String),
    Excerpt(String),
    Content(String),
    Status(ArticleStatus),
    CategoryId(Option<i32>),
    FeaturedImage(Option<String>),
    Tags(Vec<String>),
    AllowComments(bool),
    IsFeatured(bool),
    MetaTitle(String),
    MetaDescription(String),
}

impl FieldValue {
    pub fn name(&self) -> &'static str {
        match self {
            FieldValue::Title(_) => "title",
            FieldValue::Subtitle(_) => "subtitle",
            FieldValue::Excerpt(_) => "excerpt",
            FieldValue::Content(_) => "content",
            FieldValue::Status(_) => "status",
            FieldValue::CategoryId(_) => "categoryId",
            FieldValue::FeaturedImage(_) => "featuredImage",
            FieldValue::Tags(_) => "tags",
            FieldValue::AllowComments(_) => "allowComments",
            FieldValue::IsFeatured(_) => "isFeatured",
            FieldValue::MetaTitle(_) => "metaTitle",
            FieldValue::MetaDescription(_) => "metaDescription",
        }
    }
}

/// In-memory article state of one authoring view. Never performs I/O.
#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    draft: ArticleDraft,
    revision: u64,
}

/// Copy of the draft together with the store revision it was taken at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftSnapshot {
    pub draft: ArticleDraft,
    pub revision: u64,
}

impl FieldStore {
    pub fn new(draft: ArticleDraft) -> Self {
        Self { draft, revision: 0 }
    }

    pub fn draft(&self) -> &ArticleDraft {
        &self.draft
    }

    /// Bumped on every `set_field`, also when the value did not change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace one field. Composite values (tags) are replaced wholesale.
    pub fn set_field(&mut self, value: FieldValue) {
        let draft = &mut self.draft;
        match value {
            FieldValue::Title(v) => draft.title = v,
            FieldValue::Subtitle(v) => draft.subtitle = v,
            FieldValue::Excerpt(v) => draft.excerpt = v,
            FieldValue::Content(v) => draft.content = v,
            FieldValue::Status(v) => draft.status = v,
            FieldValue::CategoryId(v) => draft.category_id = v,
            FieldValue::FeaturedImage(v) => draft.featured_image = v,
            FieldValue::Tags(v) => draft.tags = v,
            FieldValue::AllowComments(v) => draft.allow_comments = v,
            FieldValue::IsFeatured(v) => draft.is_featured = v,
            FieldValue::MetaTitle(v) => draft.meta_title = v,
            FieldValue::MetaDescription(v) => draft.meta_description = v,
        }
        self.revision += 1;
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        DraftSnapshot {
            draft: self.draft.clone(),
            revision: self.revision,
        }
    }
}

/// Handle to the field store owned by one authoring session.
/// All mutation goes through `set_field`.
#[derive(Debug, Clone, Default)]
pub struct SharedFieldStore {
    inner: Arc<Mutex<FieldStore>>,
}

impl SharedFieldStore {
    pub fn new(store: FieldStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub fn set_field(&self, value: FieldValue) {
        self.lock().set_field(value);
    }

    pub fn snapshot(&self) -> DraftSnapshot {
        self.lock().snapshot()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }

    /// Run `f` against the current draft without cloning it
    pub fn with_draft<R>(&self, f: impl FnOnce(&ArticleDraft) -> R) -> R {
        f(self.lock().draft())
    }

    fn lock(&self) -> MutexGuard<'_, FieldStore> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Minimum viable draft: title, content and category must all be present.
/// Evaluated fresh on every call.
pub fn is_eligible(draft: &ArticleDraft) -> bool {
    missing_fields(draft).is_empty()
}

/// Names of the required fields the draft is still missing
pub fn missing_fields(draft: &ArticleDraft) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if draft.title.is_empty() {
        missing.push("title");
    }
    if draft.content.is_empty() {
        missing.push("content");
    }
    // zero is what an unselected category dropdown yields
    if !draft.category_id.is_some_and(|id| id != 0) {
        missing.push("categoryId");
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with(title: bool, content: bool, category: bool) -> ArticleDraft {
        ArticleDraft {
            title: if title { "Hello".into() } else { String::new() },
            content: if content { "<p>World</p>".into() } else { String::new() },
            category_id: if category { Some(3) } else { None },
            ..ArticleDraft::default()
        }
    }

    #[test]
    fn test_eligibility_requires_title_content_and_category() {
        for mask in 0..8u8 {
            let (title, content, category) = (mask & 1 != 0, mask & 2 != 0, mask & 4 != 0);
            let draft = draft_with(title, content, category);
            assert_eq!(
                is_eligible(&draft),
                title && content && category,
                "title={title} content={content} category={category}"
            );
        }
    }

    #[test]
    fn test_zero_category_counts_as_absent() {
        let mut draft = draft_with(true, true, true);
        draft.category_id = Some(0);

        assert!(!is_eligible(&draft));
        assert_eq!(missing_fields(&draft), vec!["categoryId"]);
    }

    #[test]
    fn test_missing_fields_lists_all_unmet_requirements() {
        let draft = ArticleDraft::default();
        assert_eq!(missing_fields(&draft), vec!["title", "content", "categoryId"]);
    }

    #[test]
    fn test_set_field_replaces_tags_and_bumps_revision() {
        let mut store = FieldStore::default();
        store.set_field(FieldValue::Tags(vec!["rust".into(), "essay".into()]));
        store.set_field(FieldValue::Tags(vec!["poetry".into()]));

        assert_eq!(store.draft().tags, vec!["poetry".to_string()]);
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn test_shared_store_snapshot_tracks_revision() {
        let store = SharedFieldStore::default();
        store.set_field(FieldValue::Title("Hello".into()));
        let snapshot = store.snapshot();
        store.set_field(FieldValue::Subtitle("Sub".into()));

        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.draft.subtitle, "");
        assert_eq!(store.revision(), 2);
        assert_eq!(store.with_draft(|d| d.subtitle.clone()), "Sub");
    }

    #[test]
    fn test_field_value_json_form() {
        let value: FieldValue =
            serde_json::from_str(r#"{"field":"categoryId","value":3}"#).unwrap();
        assert_eq!(value, FieldValue::CategoryId(Some(3)));
        assert_eq!(value.name(), "categoryId");

        let value: FieldValue =
            serde_json::from_str(r#"{"field":"status","value":"published"}"#).unwrap();
        assert_eq!(value, FieldValue::Status(ArticleStatus::Published));

        let unknown = serde_json::from_str::<FieldValue>(r#"{"field":"author","value":"x"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_new_draft_allows_comments() {
        let draft = ArticleDraft::default();
        assert!(draft.allow_comments);
        assert!(!draft.is_featured);
        assert_eq!(draft.status, ArticleStatus::Draft);
        assert_eq!(draft.article_type, ArticleType::BlogPost);
    }
}
