//! Rendering descriptors into SQLite statements.

mod mutation;
pub mod routing;
mod select;
mod writer;

pub use mutation::{delete, insert, update, upsert, upsert_many};
pub use routing::{route, EngineType, StatementKind};
pub use writer::{quote_ident, SqlWriter};

use crate::value::Value;

/// Rendered SQL with `?` placeholders and the values bound to them, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    pub kind: StatementKind,
}

impl Statement {
    /// A parameterless statement, classified from its text.
    pub fn raw(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let kind = StatementKind::classify(&sql);
        Self {
            sql,
            params: Vec::new(),
            kind,
        }
    }

    /// Raw SQL with bound parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            params,
            ..Self::raw(sql)
        }
    }
}
