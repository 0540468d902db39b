use std::str::FromStr;
use std::time::Duration;

use repokit_core::{EngineType, Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::config::Settings;

/// The writer and reader pools, built once and shared by every session.
#[derive(Debug, Clone)]
pub struct EnginePair {
    writer: SqlitePool,
    reader: SqlitePool,
}

impl EnginePair {
    /// Builds both pools from `settings`.
    ///
    /// Pools connect lazily, so a bad path only surfaces on first use; a
    /// malformed URL fails here.
    pub fn new(settings: &Settings) -> Result<Self> {
        let writer = build_pool(&settings.database_url, settings)?;
        let reader = build_pool(&settings.reader_url, settings)?;

        tracing::info!(
            writer = %settings.database_url,
            reader = %settings.reader_url,
            testing = settings.testing,
            "Created engine pair"
        );

        Ok(Self { writer, reader })
    }

    pub fn get(&self, engine: EngineType) -> &SqlitePool {
        match engine {
            EngineType::Writer => &self.writer,
            EngineType::Reader => &self.reader,
        }
    }

    pub fn writer(&self) -> &SqlitePool {
        &self.writer
    }

    pub fn reader(&self) -> &SqlitePool {
        &self.reader
    }

    /// Closes both pools, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

fn build_pool(url: &str, settings: &Settings) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| Error::configuration(format!("invalid database URL '{url}': {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool_options = if settings.testing {
        // Connections are discarded after every use.
        SqlitePoolOptions::new()
            .max_connections(settings.max_connections.max(2))
            .min_connections(0)
            .max_lifetime(Some(Duration::ZERO))
    } else {
        SqlitePoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .max_lifetime(Some(settings.pool_recycle()))
            .test_before_acquire(true)
    };

    Ok(pool_options.connect_lazy_with(options))
}
