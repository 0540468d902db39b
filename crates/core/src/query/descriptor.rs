use std::collections::BTreeSet;

use crate::record::{JoinRegistry, Record};
use crate::statement::SqlWriter;
use crate::Result;

use super::{Column, Expr, OrderBy, OrderSpec, SelectItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// One `JOIN` clause of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub table: String,
    pub alias: Option<String>,
    pub on: Expr,
}

impl JoinClause {
    pub fn inner(table: impl Into<String>, on: Expr) -> Self {
        Self {
            kind: JoinKind::Inner,
            table: table.into(),
            alias: None,
            on,
        }
    }

    pub fn left(table: impl Into<String>, on: Expr) -> Self {
        Self {
            kind: JoinKind::Left,
            table: table.into(),
            alias: None,
            on,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name this join is known by in the rest of the query.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    pub(crate) fn render(&self, writer: &mut SqlWriter) {
        writer.push(match self.kind {
            JoinKind::Inner => " INNER JOIN ",
            JoinKind::Left => " LEFT OUTER JOIN ",
        });
        writer.push_ident(&self.table);
        if let Some(alias) = &self.alias {
            writer.push(" AS ").push_ident(alias);
        }
        writer.push(" ON ");
        self.on.render(writer);
    }
}

/// An immutable description of a `SELECT` over one base table.
///
/// Every builder method takes the descriptor by value and hands back the
/// extended one, so a partially built query can be cloned and branched
/// without the branches affecting each other.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    fields: Vec<Column>,
    extra: Vec<SelectItem>,
    distinct: Vec<Column>,
    predicates: Vec<Expr>,
    joins: Vec<JoinClause>,
    order: Vec<OrderBy>,
    offset: Option<u64>,
    limit: Option<u64>,
    group_by: Vec<Column>,
    applied_joins: BTreeSet<String>,
}

impl Query {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            extra: Vec::new(),
            distinct: Vec::new(),
            predicates: Vec::new(),
            joins: Vec::new(),
            order: Vec::new(),
            offset: None,
            limit: None,
            group_by: Vec::new(),
            applied_joins: BTreeSet::new(),
        }
    }

    /// A query over the table of `R`.
    pub fn of<R: Record>() -> Self {
        Self::new(R::TABLE)
    }

    /// Projects `fields`; an empty list selects every column of the table.
    pub fn select(mut self, fields: Vec<Column>) -> Self {
        self.fields = fields;
        self
    }

    /// Appends predicates. All predicates are AND-combined.
    pub fn filter(mut self, predicates: impl IntoIterator<Item = Expr>) -> Self {
        self.predicates.extend(predicates);
        self
    }

    pub fn distinct(mut self, columns: Vec<Column>) -> Self {
        self.distinct = columns;
        self
    }

    pub fn offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn group_by(mut self, columns: Vec<Column>) -> Self {
        self.group_by = columns;
        self
    }

    /// Adds a join clause unless one with the same key is already present.
    pub fn join_clause(mut self, clause: JoinClause) -> Self {
        if !self.joins.iter().any(|join| join.key() == clause.key()) {
            self.joins.push(clause);
        }
        self
    }

    /// Extra projected columns, typically contributed by a join resolver.
    pub fn add_columns(mut self, columns: impl IntoIterator<Item = SelectItem>) -> Self {
        for column in columns {
            if !self.extra.contains(&column) {
                self.extra.push(column);
            }
        }
        self
    }

    pub fn order_by(mut self, order: impl IntoIterator<Item = OrderBy>) -> Self {
        self.order.extend(order);
        self
    }

    /// Resolves `spec` against this query's base table and appends the result.
    pub fn order(self, spec: &OrderSpec, base_columns: &[&str]) -> Result<Self> {
        let order = spec.resolve(&self.table, base_columns)?;
        Ok(self.order_by(order))
    }

    /// Applies each named join from `registry`, in name order.
    ///
    /// Names that were already applied to this query are skipped, so joining
    /// the same name twice is a no-op.
    pub fn join<R: Record>(
        self,
        names: &BTreeSet<String>,
        registry: &JoinRegistry<R>,
    ) -> Result<Self> {
        names.iter().try_fold(self, |query, name| {
            if query.applied_joins.contains(name) {
                return Ok(query);
            }
            let resolver = registry.resolve(name)?;
            let mut query = resolver(query);
            query.applied_joins.insert(name.clone());
            Ok(query)
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[Column] {
        &self.fields
    }

    pub fn extra_columns(&self) -> &[SelectItem] {
        &self.extra
    }

    pub fn distinct_columns(&self) -> &[Column] {
        &self.distinct
    }

    pub fn predicates(&self) -> &[Expr] {
        &self.predicates
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn ordering(&self) -> &[OrderBy] {
        &self.order
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn group_by_columns(&self) -> &[Column] {
        &self.group_by
    }

    pub fn applied_joins(&self) -> &BTreeSet<String> {
        &self.applied_joins
    }
}
