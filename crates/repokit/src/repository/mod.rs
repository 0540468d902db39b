//! Generic repository over any [`Record`].
//!
//! Each operation renders a statement through `repokit_core` and runs it on
//! the repository's session. Operations are wrapped in a safeguard that logs
//! system failures before handing them back; validation, configuration and
//! not-found errors pass through quietly.

mod types;

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use repokit_core::statement::{delete, insert, update, upsert, upsert_many};
use repokit_core::{
    Attributes, Column, Error, Expr, FromValue, JoinRegistry, OrderSpec, Query, QueryBuilder,
    QueryOptions, Record, Result, Row, Statement, Value,
};

use crate::db::Session;

pub use types::SynchronizeSession;

/// Column stamped with `CURRENT_TIMESTAMP` on every upsert, when present.
const UPDATED_AT: &str = "updated_at";

pub struct Repository<R: Record> {
    session: Arc<Session>,
    joins: JoinRegistry<R>,
}

impl<R: Record> Repository<R> {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            joins: JoinRegistry::for_record(),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn joins(&self) -> &JoinRegistry<R> {
        &self.joins
    }

    /// Number of rows matching `predicates`, optionally projected and
    /// collapsed over `distinct` columns.
    pub async fn count(
        &self,
        predicates: Vec<Expr>,
        fields: Vec<Column>,
        distinct: Vec<Column>,
    ) -> Result<i64> {
        self.safeguard("count", async {
            let statement = Query::of::<R>()
                .select(fields)
                .filter(predicates)
                .distinct(distinct)
                .to_count();
            let rows = self.session.execute(&statement).await?;
            scalar(&rows)
        })
        .await
    }

    /// Inserts one record and returns it as stored.
    pub async fn create(&self, attributes: Attributes, commit: bool) -> Result<R> {
        self.safeguard("create", async {
            ensure_columns::<R>(attributes.keys())?;
            let statement = insert(R::TABLE, std::slice::from_ref(&attributes))?;
            let record = self
                .fetch(&statement)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::system(format!("insert into {} returned no row", R::TABLE)))?;
            self.maybe_commit(commit).await?;
            Ok(record)
        })
        .await
    }

    /// Inserts several records with one statement. Every row must carry the
    /// same columns.
    pub async fn create_many(&self, rows: Vec<Attributes>, commit: bool) -> Result<Vec<R>> {
        self.safeguard("create_many", async {
            if rows.is_empty() {
                return Ok(Vec::new());
            }
            for row in &rows {
                ensure_columns::<R>(row.keys())?;
            }
            let records = self.fetch(&insert(R::TABLE, &rows)?).await?;
            self.maybe_commit(commit).await?;
            Ok(records)
        })
        .await
    }

    /// Updates the rows matching `predicates` and returns the first one.
    pub async fn update(
        &self,
        predicates: Vec<Expr>,
        attributes: Attributes,
        commit: bool,
    ) -> Result<Option<R>> {
        self.safeguard("update", async {
            ensure_columns::<R>(attributes.keys())?;
            let statement = update(R::TABLE, &predicates, &attributes)?;
            let record = self.fetch(&statement).await?.into_iter().next();
            self.maybe_commit(commit).await?;
            Ok(record)
        })
        .await
    }

    /// Inserts or, on a conflict over `conflict_keys`, overwrites every given
    /// attribute.
    ///
    /// Attributes that are not columns are dropped. `updated_at` is stamped
    /// when the record has it. When `eager` names joins, the stored row is
    /// reloaded with those joins applied; `None` when that reload finds no
    /// row.
    pub async fn upsert(
        &self,
        conflict_keys: &[&str],
        attributes: Attributes,
        commit: bool,
        eager: &BTreeSet<String>,
    ) -> Result<Option<R>> {
        self.safeguard("upsert", async {
            ensure_columns::<R>(conflict_keys.iter().copied())?;
            let attributes = known_columns::<R>(attributes);
            let statement = upsert(R::TABLE, conflict_keys, &attributes, touch_column::<R>())?;
            let record = self
                .fetch(&statement)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| Error::system(format!("upsert into {} returned no row", R::TABLE)))?;
            self.maybe_commit(commit).await?;

            if eager.is_empty() {
                return Ok(Some(record));
            }
            let options = QueryOptions::new().joins(eager.clone());
            self.first_by(R::PRIMARY_KEY, record.primary_key_value(), options)
                .await
        })
        .await
    }

    /// Batched upsert; conflicting rows take the offered row's values.
    pub async fn upsert_many(
        &self,
        conflict_keys: &[&str],
        rows: Vec<Attributes>,
        commit: bool,
    ) -> Result<Vec<R>> {
        self.safeguard("upsert_many", async {
            if rows.is_empty() {
                return Ok(Vec::new());
            }
            ensure_columns::<R>(conflict_keys.iter().copied())?;
            let rows: Vec<Attributes> = rows.into_iter().map(known_columns::<R>).collect();
            let statement = upsert_many(R::TABLE, conflict_keys, &rows, touch_column::<R>())?;
            let records = self.fetch(&statement).await?;
            self.maybe_commit(commit).await?;
            Ok(records)
        })
        .await
    }

    pub async fn get_many(&self, options: &QueryOptions) -> Result<Vec<R>> {
        self.safeguard("get_many", async {
            let statement = self.build(options)?.to_select();
            self.fetch(&statement).await
        })
        .await
    }

    /// Like [`Repository::get_many`] but returns raw rows, for projections
    /// that do not decode into `R`.
    pub async fn get_rows(&self, options: &QueryOptions) -> Result<Vec<Row>> {
        self.safeguard("get_rows", async {
            let statement = self.build(options)?.to_select();
            self.session.execute(&statement).await
        })
        .await
    }

    /// Every matching record, unpaginated.
    pub async fn get_all(
        &self,
        joins: BTreeSet<String>,
        order: Option<OrderSpec>,
        predicates: Vec<Expr>,
    ) -> Result<Vec<R>> {
        let options = QueryOptions {
            joins,
            order,
            predicates,
            ..QueryOptions::default()
        };
        self.get_many(&options).await
    }

    /// Records whose `field` equals `value`.
    pub async fn get_by(
        &self,
        field: &str,
        value: impl Into<Value>,
        skip: Option<u64>,
        limit: Option<u64>,
        joins: BTreeSet<String>,
    ) -> Result<Vec<R>> {
        ensure_columns::<R>([field])?;
        let options = QueryOptions {
            skip,
            limit,
            joins,
            predicates: vec![R::column(field).eq(value)],
            ..QueryOptions::default()
        };
        self.get_many(&options).await
    }

    pub async fn first(&self, options: &QueryOptions) -> Result<Option<R>> {
        let options = QueryOptions {
            limit: Some(1),
            ..options.clone()
        };
        Ok(self.get_many(&options).await?.into_iter().next())
    }

    pub async fn first_by(
        &self,
        field: &str,
        value: impl Into<Value>,
        options: QueryOptions,
    ) -> Result<Option<R>> {
        ensure_columns::<R>([field])?;
        let options = options.filter(R::column(field).eq(value));
        self.first(&options).await
    }

    /// Whether any row matches `predicates` (any row at all when empty).
    pub async fn exists(&self, predicates: Vec<Expr>) -> Result<bool> {
        self.safeguard("exists", async {
            let statement = Query::of::<R>().filter(predicates).to_exists();
            let rows = self.session.execute(&statement).await?;
            Ok(scalar(&rows)? != 0)
        })
        .await
    }

    /// Deletes the rows matching `predicates` and returns them.
    pub async fn delete(
        &self,
        predicates: Vec<Expr>,
        synchronize: SynchronizeSession,
    ) -> Result<Vec<R>> {
        self.safeguard("delete", async {
            match synchronize {
                SynchronizeSession::Fetch => {
                    self.fetch(&delete(R::TABLE, &predicates, true)).await
                }
                SynchronizeSession::False => {
                    // Snapshot under the write lock so the delete sees the same rows.
                    self.session.begin_write().await?;
                    let snapshot = Query::of::<R>().filter(predicates.clone()).to_select();
                    let victims = self.fetch(&snapshot).await?;
                    self.session
                        .execute(&delete(R::TABLE, &predicates, false))
                        .await?;
                    Ok(victims)
                }
                SynchronizeSession::Evaluate => {
                    self.session.begin_write().await?;
                    let snapshot = Query::of::<R>().filter(predicates).to_select();
                    let victims = self.fetch(&snapshot).await?;
                    if victims.is_empty() {
                        return Ok(victims);
                    }
                    let keys = victims.iter().map(R::primary_key_value);
                    let by_key = [R::column(R::PRIMARY_KEY).is_in(keys)];
                    self.session
                        .execute(&delete(R::TABLE, &by_key, false))
                        .await?;
                    Ok(victims)
                }
            }
        })
        .await
    }

    /// Deletes one record by primary key. Returns whether a row was removed.
    pub async fn delete_record(&self, record: &R) -> Result<bool> {
        let by_key = vec![R::column(R::PRIMARY_KEY).eq(record.primary_key_value())];
        let removed = self.delete(by_key, SynchronizeSession::Fetch).await?;
        Ok(!removed.is_empty())
    }

    pub async fn commit(&self) -> Result<()> {
        self.safeguard("commit", self.session.commit()).await
    }

    pub async fn rollback(&self) -> Result<()> {
        self.safeguard("rollback", self.session.rollback()).await
    }

    fn build(&self, options: &QueryOptions) -> Result<Query> {
        QueryBuilder::new(&self.joins).build(options)
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<R>> {
        self.session
            .execute(statement)
            .await?
            .iter()
            .map(R::from_row)
            .collect()
    }

    async fn maybe_commit(&self, commit: bool) -> Result<()> {
        if commit {
            self.session.commit().await?;
        }
        Ok(())
    }

    async fn safeguard<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        fut.await.inspect_err(|e| {
            if e.is_system() {
                tracing::error!(
                    record = R::NAME,
                    operation,
                    session = %self.session.id(),
                    error = %e,
                    "Repository operation failed"
                );
            }
        })
    }
}

impl<R: Record> std::fmt::Debug for Repository<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("record", &R::NAME)
            .field("session", &self.session.id())
            .field("joins", &self.joins)
            .finish()
    }
}

/// The single integer a `COUNT(*)` or `EXISTS` statement produces.
fn scalar(rows: &[Row]) -> Result<i64> {
    let value = rows
        .first()
        .and_then(|row| row.values().first())
        .ok_or_else(|| Error::system("scalar query returned no value"))?;
    i64::from_value(value)
        .map_err(|reason| Error::system(format!("cannot decode scalar: {reason}")))
}

fn ensure_columns<R: Record>(names: impl IntoIterator<Item = impl AsRef<str>>) -> Result<()> {
    for name in names {
        let name = name.as_ref();
        if !R::has_column(name) {
            return Err(Error::validation(format!(
                "Unknown column '{name}' on '{}'",
                R::TABLE
            )));
        }
    }
    Ok(())
}

fn known_columns<R: Record>(attributes: Attributes) -> Attributes {
    attributes
        .into_iter()
        .filter(|(name, _)| R::has_column(name))
        .collect()
}

fn touch_column<R: Record>() -> Option<&'static str> {
    R::has_column(UPDATED_AT).then_some(UPDATED_AT)
}

#[cfg(test)]
mod tests;
