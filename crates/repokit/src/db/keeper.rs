use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use repokit_core::Result;

use super::context::{SessionContext, SessionId};
use super::engine::EnginePair;
use super::session::Session;
use crate::config::Settings;

/// Hands out one [`Session`] per active session context id.
///
/// A keeper owns its engine pair. Several keepers (one per database) may be
/// used side by side; they share the task-local context id, so a scope opened
/// on one keeper addresses the matching session on every other keeper too.
pub struct SessionKeeper {
    engines: Arc<EnginePair>,
    sessions: Mutex<HashMap<SessionId, Arc<Session>>>,
    echo: bool,
    unit_testing: bool,
}

impl SessionKeeper {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            engines: Arc::new(EnginePair::new(settings)?),
            sessions: Mutex::new(HashMap::new()),
            echo: settings.echo,
            unit_testing: settings.unit_testing,
        })
    }

    /// The session bound to the current context id, created on first use.
    ///
    /// Fails with a configuration error when no session context is active.
    pub fn session(&self) -> Result<Arc<Session>> {
        let id = SessionContext::get()?;
        let mut sessions = self.lock();
        let session = sessions.entry(id).or_insert_with(|| {
            tracing::debug!(session = %id, "Opening session");
            Arc::new(Session::new(id, Arc::clone(&self.engines), self.echo))
        });
        Ok(Arc::clone(session))
    }

    /// Removes the current context's session and closes it, rolling back
    /// anything left uncommitted.
    pub async fn remove(&self) -> Result<()> {
        let id = SessionContext::get()?;
        let session = self.lock().remove(&id);
        if let Some(session) = session {
            tracing::debug!(session = %id, "Releasing session");
            session.close().await?;
        }
        Ok(())
    }

    /// Forgets a session without awaiting anything. Dropping the last handle
    /// rolls back its open transaction.
    pub fn discard(&self, id: SessionId) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn unit_testing(&self) -> bool {
        self.unit_testing
    }

    pub fn engines(&self) -> &EnginePair {
        &self.engines
    }

    /// Number of sessions currently held.
    pub fn active_sessions(&self) -> usize {
        self.lock().len()
    }

    /// Closes every held session, then both pools.
    pub async fn shutdown(&self) {
        let sessions: Vec<Arc<Session>> = self.lock().drain().map(|(_, s)| s).collect();
        for session in sessions {
            if let Err(e) = session.close().await {
                tracing::warn!(session = %session.id(), error = %e, "Failed to close session");
            }
        }
        self.engines.close().await;
        tracing::info!("Session keeper shut down");
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SessionKeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeeper")
            .field("sessions", &self.active_sessions())
            .field("echo", &self.echo)
            .field("unit_testing", &self.unit_testing)
            .finish()
    }
}
