//! A routing session: one logical unit of work over the engine pair.
//!
//! Writes open a transaction on the writer pool lazily; reads go to the
//! reader pool until that happens and to the open transaction afterwards, so
//! a session always reads its own uncommitted writes.
//!
//! The writer transaction starts with `BEGIN IMMEDIATE`: it holds the
//! database write lock from its first statement, so rows read inside it
//! cannot change under it before it commits.

use std::sync::Arc;

use repokit_core::{route, EngineType, Error, Result, Row, Statement};
use sqlx::{Sqlite, Transaction};
use tokio::sync::Mutex;

use super::context::SessionId;
use super::conversions::{bind_all, decode_row};
use super::engine::EnginePair;
use super::error::driver_error;

#[derive(Default)]
struct SessionState {
    writer: Option<Transaction<'static, Sqlite>>,
    closed: bool,
}

pub struct Session {
    id: SessionId,
    engines: Arc<EnginePair>,
    echo: bool,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(id: SessionId, engines: Arc<EnginePair>, echo: bool) -> Self {
        Self {
            id,
            engines,
            echo,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Whether a writer transaction is open.
    pub async fn has_pending_writes(&self) -> bool {
        self.state.lock().await.writer.is_some()
    }

    /// Opens the writer transaction now, so the statements that follow
    /// (reads included) run under the write lock.
    pub async fn begin_write(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(Error::system(format!("session {} is closed", self.id)));
        }
        Self::writer_transaction(&mut state, &self.engines).await?;
        Ok(())
    }

    /// Runs `statement` on the engine chosen by [`route`] and returns every
    /// row it produced.
    pub async fn execute(&self, statement: &Statement) -> Result<Vec<Row>> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(Error::system(format!("session {} is closed", self.id)));
        }

        let engine = route(statement.kind, state.writer.is_some());
        if self.echo {
            tracing::debug!(
                session = %self.id,
                %engine,
                sql = %statement.sql,
                params = ?statement.params,
                "Executing statement"
            );
        }

        let query = bind_all(&statement.sql, &statement.params);
        let rows = match engine {
            EngineType::Reader => query
                .fetch_all(self.engines.reader())
                .await
                .map_err(driver_error)?,
            EngineType::Writer => {
                let tx = Self::writer_transaction(&mut state, &self.engines).await?;
                query.fetch_all(&mut **tx).await.map_err(driver_error)?
            }
        };

        rows.iter().map(decode_row).collect()
    }

    /// Runs a parameterless statement (or several, separated by `;`) on the
    /// writer, inside the session's transaction.
    pub async fn execute_script(&self, sql: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(Error::system(format!("session {} is closed", self.id)));
        }
        if self.echo {
            tracing::debug!(session = %self.id, sql, "Executing script");
        }
        let tx = Self::writer_transaction(&mut state, &self.engines).await?;
        sqlx::raw_sql(sql)
            .execute(&mut **tx)
            .await
            .map_err(driver_error)?;
        Ok(())
    }

    /// Commits the writer transaction, if one is open.
    pub async fn commit(&self) -> Result<()> {
        let tx = self.state.lock().await.writer.take();
        if let Some(tx) = tx {
            tx.commit().await.map_err(driver_error)?;
            tracing::debug!(session = %self.id, "Committed session");
        }
        Ok(())
    }

    /// Rolls back the writer transaction, if one is open.
    pub async fn rollback(&self) -> Result<()> {
        let tx = self.state.lock().await.writer.take();
        if let Some(tx) = tx {
            tx.rollback().await.map_err(driver_error)?;
            tracing::debug!(session = %self.id, "Rolled back session");
        }
        Ok(())
    }

    /// Rolls back uncommitted work and refuses further statements.
    pub async fn close(&self) -> Result<()> {
        let tx = {
            let mut state = self.state.lock().await;
            state.closed = true;
            state.writer.take()
        };
        if let Some(tx) = tx {
            tracing::debug!(session = %self.id, "Closing session with uncommitted writes");
            tx.rollback().await.map_err(driver_error)?;
        }
        Ok(())
    }

    async fn writer_transaction<'s>(
        state: &'s mut SessionState,
        engines: &EnginePair,
    ) -> Result<&'s mut Transaction<'static, Sqlite>> {
        if state.writer.is_none() {
            let tx = engines
                .writer()
                .begin_with("BEGIN IMMEDIATE")
                .await
                .map_err(driver_error)?;
            state.writer = Some(tx);
        }
        state
            .writer
            .as_mut()
            .ok_or_else(|| Error::system("writer transaction missing after begin"))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("echo", &self.echo)
            .finish_non_exhaustive()
    }
}
