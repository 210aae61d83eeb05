use folio_common::{
    ARTICLES_TABLE_NAME, CATEGORY_ID_FIELD_NAME, CREATED_FIELD_NAME, ID_FIELD_NAME,
    PUBLISHED_FIELD_NAME, TAGS_FIELD_NAME, TYPE_FIELD_NAME, UPDATED_FIELD_NAME,
};

/// Represents table in a database, used for ddl generation
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

/// Represents one column in the database table
pub struct Column {
    pub name: String,
    pub column_type: String,
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

/// Represents an index in the database table
pub struct Index {
    pub table_name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Table {
    pub fn new(name: String, columns: Vec<Column>, indexes: Vec<Index>) -> Self {
        Self {
            name,
            columns,
            indexes,
        }
    }
}

impl Column {
    pub fn new<T: Into<String>>(
        name: T,
        column_type: T,
        not_null: bool,
        unique: bool,
        default_value: Option<T>,
    ) -> Self {
        let primary_key = false;
        Self {
            name: name.into(),
            column_type: column_type.into(),
            not_null,
            unique,
            primary_key,
            default_value: default_value.map(T::into),
        }
    }

    pub fn primary_key<T: Into<String>>(name: T, column_type: T) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            not_null: false,
            unique: false,
            primary_key: true,
            default_value: None,
        }
    }

    /// NOT NULL text column defaulting to the empty string
    fn text<T: Into<String>>(name: T) -> Self {
        Self::new(name.into(), "TEXT".into(), true, false, Some("''".into()))
    }
}

impl Index {
    pub fn new<T: Into<String>>(table_name: T, columns: Vec<T>, unique: bool) -> Self {
        Self {
            table_name: table_name.into(),
            columns: columns.into_iter().map(T::into).collect(),
            unique,
        }
    }
}

/// Every table the service writes to
pub fn required_tables() -> Vec<Table> {
    vec![articles_table()]
}

fn articles_table() -> Table {
    let columns = vec![
        Column::primary_key(ID_FIELD_NAME, "SERIAL"),
        Column::new("title", "TEXT", true, false, None),
        Column::text("subtitle"),
        Column::text("excerpt"),
        Column::text("content"),
        Column::new(TYPE_FIELD_NAME, "VARCHAR(32)", true, false, Some("'blog_post'")),
        Column::new("status", "VARCHAR(16)", true, false, Some("'draft'")),
        Column::text("featured_image"),
        Column::new(TAGS_FIELD_NAME, "JSONB", true, false, Some("'[]'::jsonb")),
        Column::new("allow_comments", "BOOLEAN", true, false, Some("true")),
        Column::new("is_featured", "BOOLEAN", true, false, Some("false")),
        Column::text("meta_title"),
        Column::text("meta_description"),
        Column::new(CATEGORY_ID_FIELD_NAME, "INTEGER", false, false, None),
        Column::new(CREATED_FIELD_NAME, "TIMESTAMPTZ", true, false, Some("now()")),
        Column::new(UPDATED_FIELD_NAME, "TIMESTAMPTZ", true, false, Some("now()")),
        Column::new(PUBLISHED_FIELD_NAME, "TIMESTAMPTZ", false, false, None),
    ];

    let indexes = vec![
        Index::new(ARTICLES_TABLE_NAME, vec!["status"], false),
        Index::new(ARTICLES_TABLE_NAME, vec![CATEGORY_ID_FIELD_NAME], false),
    ];

    Table::new(ARTICLES_TABLE_NAME.to_string(), columns, indexes)
}
