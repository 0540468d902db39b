//! Throw-away SQLite databases for tests.

use std::sync::Arc;

use repokit_core::{Attributes, Error, Value};
use tempfile::TempDir;

use crate::config::Settings;
use crate::db::{session_scope, SessionKeeper};
use crate::models::schema::CREATE_TABLES;

/// A keeper over a fresh database file with the demo schema. The file lives
/// in a temporary directory removed on drop.
pub struct TestDatabase {
    pub keeper: Arc<SessionKeeper>,
    _dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Self {
        Self::with(|_| {}).await
    }

    /// Like [`TestDatabase::new`], adjusting the settings first.
    pub async fn with(adjust: impl FnOnce(&mut Settings)) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("repokit.db");
        let mut settings = Settings::for_database(format!("sqlite://{}", path.display()));
        settings.testing = false;
        settings.unit_testing = false;
        settings.echo = true;
        adjust(&mut settings);

        let keeper = Arc::new(SessionKeeper::new(&settings).expect("test keeper"));
        session_scope(&keeper, |session| async move {
            session.execute_script(CREATE_TABLES).await?;
            session.commit().await?;
            Ok::<_, Error>(())
        })
        .await
        .expect("create schema");

        Self { keeper, _dir: dir }
    }
}

/// Attributes from literal pairs.
pub fn attrs<const N: usize>(pairs: [(&str, Value); N]) -> Attributes {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}
