use chrono::{DateTime, Utc};
use folio_common::{
    ARTICLES_TABLE_NAME, ArticleGateway, ArticleId, ArticlePayload, ArticleRecord,
    ArticleStatus, ArticleType, GatewayError, SavedArticle, database::Database,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use sqlx::types::Json;

/// Persists drafts directly into the `articles` table
#[derive(Clone, Debug)]
pub struct PostgresGateway {
    database: &'static Database,
}

const ARTICLE_COLUMNS: &str = "id, title, subtitle, excerpt, content, \"type\", status, \
    featured_image, tags, allow_comments, is_featured, meta_title, meta_description, \
    category_id, created_at, updated_at, published_at";

impl PostgresGateway {
    pub fn new(database: &'static Database) -> Self {
        Self { database }
    }

    fn table(&self) -> String {
        format!(
            "\"{}\".\"{}\"",
            self.database.database_schema(),
            ARTICLES_TABLE_NAME
        )
    }
}

/// Set on the first save with status published, kept afterwards
fn published_at(payload: &ArticlePayload) -> Option<DateTime<Utc>> {
    (payload.status == ArticleStatus::Published).then(Utc::now)
}

fn database_error(e: sqlx::Error) -> GatewayError {
    match e {
        sqlx::Error::RowNotFound => GatewayError::NotFound,
        other => GatewayError::Transport(other.to_string()),
    }
}

fn decode_error(column: &str, e: impl std::fmt::Display) -> GatewayError {
    GatewayError::Decode(format!("failed to parse {}: {}", column, e))
}

impl ArticleGateway for PostgresGateway {
    async fn create(&self, payload: ArticlePayload) -> Result<SavedArticle, GatewayError> {
        let sql = format!(
            "INSERT INTO {} (title, subtitle, excerpt, content, \"type\", status, featured_image, \
             tags, allow_comments, is_featured, meta_title, meta_description, category_id, \
             published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING id",
            self.table()
        );

        let id = sqlx::query_scalar::<_, i32>(&sql)
            .bind(&payload.title)
            .bind(&payload.subtitle)
            .bind(&payload.excerpt)
            .bind(&payload.content)
            .bind(payload.article_type.as_str())
            .bind(payload.status.as_str())
            .bind(&payload.featured_image)
            .bind(Json(payload.tags.clone()))
            .bind(payload.allow_comments)
            .bind(payload.is_featured)
            .bind(&payload.meta_title)
            .bind(&payload.meta_description)
            .bind(payload.category_id)
            .bind(published_at(&payload))
            .fetch_one(self.database.database_pool())
            .await
            .map_err(database_error)?;

        let id = ArticleId::try_new(id).map_err(|e| decode_error("id", e))?;
        Ok(SavedArticle::from_payload(Some(id), &payload))
    }

    async fn update(
        &self,
        id: ArticleId,
        payload: ArticlePayload,
    ) -> Result<SavedArticle, GatewayError> {
        let sql = format!(
            "UPDATE {} SET title = $1, subtitle = $2, excerpt = $3, content = $4, \"type\" = $5, \
             status = $6, featured_image = $7, tags = $8, allow_comments = $9, is_featured = $10, \
             meta_title = $11, meta_description = $12, category_id = $13, \
             published_at = COALESCE(published_at, $14), updated_at = now() \
             WHERE id = $15",
            self.table()
        );

        let result = sqlx::query(&sql)
            .bind(&payload.title)
            .bind(&payload.subtitle)
            .bind(&payload.excerpt)
            .bind(&payload.content)
            .bind(payload.article_type.as_str())
            .bind(payload.status.as_str())
            .bind(&payload.featured_image)
            .bind(Json(payload.tags.clone()))
            .bind(payload.allow_comments)
            .bind(payload.is_featured)
            .bind(&payload.meta_title)
            .bind(&payload.meta_description)
            .bind(payload.category_id)
            .bind(published_at(&payload))
            .bind(id.into_inner())
            .execute(self.database.database_pool())
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound);
        }

        Ok(SavedArticle::from_payload(Some(id), &payload))
    }

    async fn fetch(&self, id: ArticleId) -> Result<ArticleRecord, GatewayError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", ARTICLE_COLUMNS, self.table());

        let row = sqlx::query(&sql)
            .bind(id.into_inner())
            .fetch_optional(self.database.database_pool())
            .await
            .map_err(database_error)?
            .ok_or(GatewayError::NotFound)?;

        row_to_record(id, &row)
    }
}

fn row_to_record(id: ArticleId, row: &PgRow) -> Result<ArticleRecord, GatewayError> {
    let text = |column: &str| -> Result<String, GatewayError> {
        row.try_get::<String, _>(column)
            .map_err(|e| decode_error(column, e))
    };
    let flag = |column: &str| -> Result<bool, GatewayError> {
        row.try_get::<bool, _>(column)
            .map_err(|e| decode_error(column, e))
    };
    let timestamp = |column: &str| -> Result<Option<DateTime<Utc>>, GatewayError> {
        row.try_get::<Option<DateTime<Utc>>, _>(column)
            .map_err(|e| decode_error(column, e))
    };

    let article_type = ArticleType::try_from(text("type")?.as_str())
        .map_err(|e| decode_error("type", e))?;
    let status = ArticleStatus::try_from(text("status")?.as_str())
        .map_err(|e| decode_error("status", e))?;
    let Json(tags) = row
        .try_get::<Json<Vec<String>>, _>("tags")
        .map_err(|e| decode_error("tags", e))?;
    let category_id = row
        .try_get::<Option<i32>, _>("category_id")
        .map_err(|e| decode_error("category_id", e))?;

    Ok(ArticleRecord {
        id,
        title: text("title")?,
        subtitle: text("subtitle")?,
        excerpt: text("excerpt")?,
        content: text("content")?,
        article_type,
        status,
        featured_image: Some(text("featured_image")?).filter(|url| !url.is_empty()),
        tags,
        allow_comments: flag("allow_comments")?,
        is_featured: flag("is_featured")?,
        meta_title: text("meta_title")?,
        meta_description: text("meta_description")?,
        category_id,
        created_at: timestamp("created_at")?,
        updated_at: timestamp("updated_at")?,
        published_at: timestamp("published_at")?,
    })
}
