use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use repokit_core::{Error, QueryOptions, Record, Result, Row, Value};
use serde::Serialize;

use crate::controller::Controller;
use crate::repository::Repository;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const NAME: &'static str = "User";
    const COLUMNS: &'static [&'static str] = &["id", "name", "email", "created_at", "updated_at"];

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn primary_key_value(&self) -> Value {
        Value::Integer(self.id)
    }
}

pub type UserRepository = Repository<User>;
pub type UserController = Controller<User>;

impl Controller<User> {
    /// The user called `name`, or a not-found error.
    pub async fn get_by_name(&self, name: &str, joins: BTreeSet<String>) -> Result<User> {
        let options = QueryOptions::new().joins(joins);
        self.repository()
            .first_by("name", name, options)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User with name: {name} does not exist")))
    }
}
