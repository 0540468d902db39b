//! CRUD verbs over a [`Repository`], with transaction demarcation.

use std::collections::BTreeSet;
use std::sync::Arc;

use repokit_core::{Attributes, Error, Expr, OrderSpec, QueryOptions, Record, Result, Value};

use crate::db::{transactional, SessionKeeper};
use crate::repository::{Repository, SynchronizeSession};

pub struct Controller<R: Record> {
    repository: Repository<R>,
    keeper: Arc<SessionKeeper>,
}

impl<R: Record> Controller<R> {
    pub fn new(repository: Repository<R>, keeper: Arc<SessionKeeper>) -> Self {
        Self { repository, keeper }
    }

    pub fn repository(&self) -> &Repository<R> {
        &self.repository
    }

    /// The record with primary key `id`, or a not-found error naming it.
    pub async fn get_by_id(&self, id: impl Into<Value>, joins: BTreeSet<String>) -> Result<R> {
        let id = id.into();
        let options = QueryOptions::new().joins(joins);
        self.repository
            .first_by(R::PRIMARY_KEY, id.clone(), options)
            .await?
            .ok_or_else(|| Error::not_found(R::NAME, id))
    }

    pub async fn get_many(&self, options: &QueryOptions) -> Result<Vec<R>> {
        self.repository.get_many(options).await
    }

    pub async fn get_all(
        &self,
        joins: BTreeSet<String>,
        order: Option<OrderSpec>,
        predicates: Vec<Expr>,
    ) -> Result<Vec<R>> {
        self.repository.get_all(joins, order, predicates).await
    }

    pub async fn count(&self, predicates: Vec<Expr>) -> Result<i64> {
        self.repository
            .count(predicates, Vec::new(), Vec::new())
            .await
    }

    pub async fn create(&self, attributes: Attributes) -> Result<R> {
        transactional(&self.keeper, self.repository.create(attributes, false)).await
    }

    pub async fn create_many(&self, rows: Vec<Attributes>) -> Result<Vec<R>> {
        transactional(&self.keeper, self.repository.create_many(rows, false)).await
    }

    pub async fn upsert(
        &self,
        conflict_keys: &[&str],
        attributes: Attributes,
        eager: &BTreeSet<String>,
    ) -> Result<Option<R>> {
        transactional(
            &self.keeper,
            self.repository.upsert(conflict_keys, attributes, false, eager),
        )
        .await
    }

    pub async fn upsert_many(
        &self,
        conflict_keys: &[&str],
        rows: Vec<Attributes>,
    ) -> Result<Vec<R>> {
        transactional(
            &self.keeper,
            self.repository.upsert_many(conflict_keys, rows, false),
        )
        .await
    }

    pub async fn delete_record(&self, record: &R) -> Result<bool> {
        transactional(&self.keeper, self.repository.delete_record(record)).await
    }

    pub async fn delete_many(
        &self,
        predicates: Vec<Expr>,
        synchronize: SynchronizeSession,
    ) -> Result<Vec<R>> {
        transactional(
            &self.keeper,
            self.repository.delete(predicates, synchronize),
        )
        .await
    }
}
