use crate::query::Column;
use crate::value::Value;

use super::{Statement, StatementKind};

/// Quotes an SQL identifier, doubling any embedded double quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Accumulates SQL text and its positional parameters in lockstep.
///
/// Every value goes through [`SqlWriter::push_param`] so that rendered SQL
/// never contains literal user data.
#[derive(Debug, Default)]
pub struct SqlWriter {
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub fn push_ident(&mut self, ident: &str) -> &mut Self {
        self.sql.push_str(&quote_ident(ident));
        self
    }

    /// Writes `"table"."column"`, or just `"column"` when unqualified.
    pub fn push_column(&mut self, column: &Column) -> &mut Self {
        if let Some(table) = column.table() {
            self.push_ident(table).push(".");
        }
        self.push_ident(column.name())
    }

    pub fn push_param(&mut self, value: Value) -> &mut Self {
        self.sql.push('?');
        self.params.push(value);
        self
    }

    /// Writes `items` separated by `separator`, rendering each with `render`.
    pub fn push_list<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        separator: &str,
        mut render: impl FnMut(&mut Self, T),
    ) -> &mut Self {
        for (index, item) in items.into_iter().enumerate() {
            if index > 0 {
                self.push(separator);
            }
            render(self, item);
        }
        self
    }

    pub fn finish(self, kind: StatementKind) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
            kind,
        }
    }
}
