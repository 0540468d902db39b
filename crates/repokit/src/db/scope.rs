use std::future::Future;
use std::sync::Arc;

use repokit_core::Error;

use super::context::{ContextToken, SessionContext, SessionId};
use super::keeper::SessionKeeper;
use super::session::Session;

/// Runs `f` with a session that lives exactly as long as the scope.
///
/// A fresh session id is pushed onto the context, so anything inside `f` that
/// asks the keeper for "the current session" gets this one. On every exit
/// path the session is removed from the keeper and the context restored:
///
/// - `Ok`: uncommitted work is rolled back when the session closes.
/// - `Err`: the session is rolled back first, then released.
/// - cancellation: dropping the future drops the guard, which discards the
///   session (its open transaction rolls back on drop).
pub async fn session_scope<F, Fut, T, E>(keeper: &SessionKeeper, f: F) -> Result<T, E>
where
    F: FnOnce(Arc<Session>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<Error>,
{
    SessionContext::scope(async move {
        let id = SessionId::new();
        let token = SessionContext::set(id)?;
        let guard = ScopeGuard {
            keeper,
            id,
            token: Some(token),
        };

        let session = keeper.session()?;
        let result = f(Arc::clone(&session)).await;

        if result.is_err() {
            if let Err(e) = session.rollback().await {
                tracing::warn!(session = %id, error = %e, "Rollback after failed scope failed");
            }
        }
        drop(session);

        let released = keeper.remove().await;
        guard.release()?;

        let value = result?;
        released?;
        Ok::<T, E>(value)
    })
    .await
}

/// Undoes the scope's context and keeper changes if the scope is dropped
/// before it finishes.
struct ScopeGuard<'a> {
    keeper: &'a SessionKeeper,
    id: SessionId,
    token: Option<ContextToken>,
}

impl ScopeGuard<'_> {
    fn release(mut self) -> repokit_core::Result<()> {
        match self.token.take() {
            Some(token) => SessionContext::reset(token),
            None => Ok(()),
        }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            if self.keeper.discard(self.id) {
                tracing::debug!(session = %self.id, "Discarded session of cancelled scope");
            }
            // The frame may already be gone if the task is being torn down.
            let _ = SessionContext::reset(token);
        }
    }
}
