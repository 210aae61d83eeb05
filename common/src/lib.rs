pub mod database;
pub mod domain;
pub mod test_utils;

// Persisted article table and field names

pub const ARTICLES_TABLE_NAME: &str = "articles";

pub const ID_FIELD_NAME: &str = "id";
pub const TYPE_FIELD_NAME: &str = "type";
pub const CATEGORY_ID_FIELD_NAME: &str = "category_id";
pub const TAGS_FIELD_NAME: &str = "tags";

pub const CREATED_FIELD_NAME: &str = "created_at";
pub const UPDATED_FIELD_NAME: &str = "updated_at";
pub const PUBLISHED_FIELD_NAME: &str = "published_at";

// expose domain module

pub use domain::*;

// expose database module

pub use database::connect as connect_to_database;
