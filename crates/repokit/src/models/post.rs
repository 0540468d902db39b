use repokit_core::{Column, JoinClause, JoinRegistry, Record, Result, Row, Value};
use serde::Serialize;

use crate::controller::Controller;
use crate::repository::Repository;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    /// Filled only when the `author` join is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

impl Record for Post {
    const TABLE: &'static str = "posts";
    const NAME: &'static str = "Post";
    const COLUMNS: &'static [&'static str] = &["id", "user_id", "title", "updated_at"];

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            author_name: row.get_optional("author_name")?,
        })
    }

    fn primary_key_value(&self) -> Value {
        Value::Integer(self.id)
    }

    fn register_joins(joins: &mut JoinRegistry<Self>) {
        joins.register("author", |query| {
            query
                .join_clause(JoinClause::left(
                    "users",
                    Column::new("users", "id").eq_column(&Self::column("user_id")),
                ))
                .add_columns([Column::new("users", "name").label("author_name")])
        });
    }
}

pub type PostRepository = Repository<Post>;
pub type PostController = Controller<Post>;
