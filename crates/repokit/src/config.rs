use std::{env, time::Duration};

/// Database and runtime settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Writer database URL (default: "sqlite://repokit.db")
    pub database_url: String,
    /// Reader database URL (default: the writer URL)
    pub reader_url: String,
    /// Seconds after which a pooled connection is recycled (default: 3600)
    pub pool_recycle_seconds: u64,
    /// Upper bound on connections per pool (default: 10)
    pub max_connections: u32,
    /// Log every executed statement at debug level (default: false)
    pub echo: bool,
    /// Test runs: one connection per pool, never reused (default: false)
    pub testing: bool,
    /// Unit tests: transactional work is neither committed nor rolled back (default: false)
    pub unit_testing: bool,
    /// Fallback log filter when `RUST_LOG` is unset (default: "info")
    pub log_level: String,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Environment variables:
    /// - `DATABASE_URL` - writer database URL (default: "sqlite://repokit.db")
    /// - `DATABASE_READER_URL` - reader database URL (default: `DATABASE_URL`)
    /// - `DATABASE_POOL_RECYCLE_SECONDS` - connection max lifetime (default: 3600)
    /// - `DATABASE_MAX_CONNECTIONS` - pool size (default: 10)
    /// - `DATABASE_ECHO` - statement echo (default: false)
    /// - `REPOKIT_TESTING` - test pools (default: false)
    /// - `REPOKIT_UNIT_TESTING` - bare transactional wrapper (default: false)
    /// - `LOG_LEVEL` - log filter fallback (default: "info")
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://repokit.db".to_string());
        Self {
            reader_url: env::var("DATABASE_READER_URL").unwrap_or_else(|_| database_url.clone()),
            database_url,
            pool_recycle_seconds: env::var("DATABASE_POOL_RECYCLE_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            echo: flag("DATABASE_ECHO"),
            testing: flag("REPOKIT_TESTING"),
            unit_testing: flag("REPOKIT_UNIT_TESTING"),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// Settings for a single database used as both writer and reader.
    pub fn for_database(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            reader_url: url.clone(),
            database_url: url,
            ..Self::from_env()
        }
    }

    /// Get the pool recycle interval as a Duration.
    pub fn pool_recycle(&self) -> Duration {
        Duration::from_secs(self.pool_recycle_seconds)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
