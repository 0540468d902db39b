use std::collections::BTreeSet;

use crate::record::{JoinRegistry, Record};
use crate::Result;

use super::{Column, Expr, OrderSpec, Query};

/// Everything a caller may ask of a read: pagination, projection, distinct
/// columns, named joins, ordering, predicates and grouping.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
    pub fields: Vec<Column>,
    pub distinct: Vec<Column>,
    pub joins: BTreeSet<String>,
    pub order: Option<OrderSpec>,
    pub predicates: Vec<Expr>,
    pub group_by: Vec<Column>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn fields(mut self, fields: Vec<Column>) -> Self {
        self.fields = fields;
        self
    }

    pub fn distinct(mut self, columns: Vec<Column>) -> Self {
        self.distinct = columns;
        self
    }

    pub fn join(mut self, name: impl Into<String>) -> Self {
        self.joins.insert(name.into());
        self
    }

    pub fn joins(mut self, names: BTreeSet<String>) -> Self {
        self.joins = names;
        self
    }

    pub fn order(mut self, spec: OrderSpec) -> Self {
        self.order = Some(spec);
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(mut self, predicates: Vec<Expr>) -> Self {
        self.predicates = predicates;
        self
    }

    pub fn group_by(mut self, columns: Vec<Column>) -> Self {
        self.group_by = columns;
        self
    }
}

/// Builds a [`Query`] over `R` from [`QueryOptions`].
pub struct QueryBuilder<'a, R: Record> {
    registry: &'a JoinRegistry<R>,
}

impl<'a, R: Record> QueryBuilder<'a, R> {
    pub fn new(registry: &'a JoinRegistry<R>) -> Self {
        Self { registry }
    }

    /// Applies the options in a fixed order: projection, predicates,
    /// distinct, offset, limit, joins, order, group-by.
    pub fn build(&self, options: &QueryOptions) -> Result<Query> {
        let query = Query::of::<R>()
            .select(options.fields.clone())
            .filter(options.predicates.iter().cloned())
            .distinct(options.distinct.clone())
            .offset(options.skip)
            .limit(options.limit)
            .join(&options.joins, self.registry)?;

        let query = match &options.order {
            Some(spec) => query.order(spec, R::COLUMNS)?,
            None => query,
        };

        Ok(query.group_by(options.group_by.clone()))
    }
}
