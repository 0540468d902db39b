use crate::query::{render_where, Column, Query};

use super::{SqlWriter, Statement, StatementKind};

impl Query {
    /// `SELECT` for this descriptor.
    pub fn to_select(&self) -> Statement {
        let mut writer = SqlWriter::new();
        self.render_select(&mut writer);
        writer.finish(StatementKind::Select)
    }

    /// `SELECT COUNT(*)` over this descriptor as a subquery.
    pub fn to_count(&self) -> Statement {
        let mut writer = SqlWriter::new();
        writer.push("SELECT COUNT(*) FROM (");
        self.render_select(&mut writer);
        writer.push(") AS ").push_ident("anon_1");
        writer.finish(StatementKind::Select)
    }

    /// `SELECT EXISTS (...)` over this descriptor limited to one row.
    pub fn to_exists(&self) -> Statement {
        let mut writer = SqlWriter::new();
        writer.push("SELECT EXISTS (");
        self.clone().limit(Some(1)).render_select(&mut writer);
        writer.push(") AS ").push_ident("exists");
        writer.finish(StatementKind::Select)
    }

    fn render_select(&self, writer: &mut SqlWriter) {
        writer.push("SELECT ");
        if self.fields().is_empty() {
            writer.push_ident(self.table()).push(".*");
        } else {
            writer.push_list(self.fields(), ", ", |w, column| {
                w.push_column(column);
            });
        }
        for item in self.extra_columns() {
            writer.push(", ");
            item.render(writer);
        }

        writer.push(" FROM ").push_ident(self.table());
        for join in self.joins() {
            join.render(writer);
        }

        render_where(writer, self.predicates());

        let grouping = self.grouping();
        if !grouping.is_empty() {
            writer.push(" GROUP BY ").push_list(grouping, ", ", |w, column| {
                w.push_column(column);
            });
        }

        if !self.ordering().is_empty() {
            writer
                .push(" ORDER BY ")
                .push_list(self.ordering(), ", ", |w, order| {
                    w.push_column(&order.column)
                        .push(" ")
                        .push(order.direction.as_sql());
                });
        }

        match (self.limit_value(), self.offset_value()) {
            (Some(limit), _) => {
                writer.push(&format!(" LIMIT {limit}"));
            }
            // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
            (None, Some(_)) => {
                writer.push(" LIMIT -1");
            }
            (None, None) => {}
        }
        if let Some(offset) = self.offset_value() {
            writer.push(&format!(" OFFSET {offset}"));
        }
    }

    /// Distinct columns first, then explicit group-by columns, deduplicated.
    fn grouping(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = Vec::new();
        for column in self.distinct_columns().iter().chain(self.group_by_columns()) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }
}
