//! Task-local session context.
//!
//! Each tokio task running inside [`SessionContext::scope`] gets its own stack
//! of session ids. Spawned tasks never inherit their parent's frame, so two
//! concurrent requests can never observe each other's session.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;

use repokit_core::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

tokio::task_local! {
    static CONTEXT: RefCell<Vec<SessionId>>;
}

/// Identifies one logical unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Restores the context to its state before the matching [`SessionContext::set`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a context token must be handed back to SessionContext::reset"]
pub struct ContextToken {
    depth: usize,
    id: SessionId,
}

impl ContextToken {
    pub fn id(&self) -> SessionId {
        self.id
    }
}

pub struct SessionContext;

impl SessionContext {
    /// Runs `fut` inside a context frame.
    ///
    /// When the current task already has a frame, `fut` runs in it unchanged.
    pub async fn scope<F: Future>(fut: F) -> F::Output {
        if Self::is_active() {
            fut.await
        } else {
            CONTEXT.scope(RefCell::new(Vec::new()), fut).await
        }
    }

    pub fn is_active() -> bool {
        CONTEXT.try_with(|_| ()).is_ok()
    }

    pub fn set(id: SessionId) -> Result<ContextToken> {
        CONTEXT
            .try_with(|stack| {
                let mut stack = stack.borrow_mut();
                let depth = stack.len();
                stack.push(id);
                ContextToken { depth, id }
            })
            .map_err(|_| no_context())
    }

    /// The innermost active session id.
    pub fn get() -> Result<SessionId> {
        CONTEXT
            .try_with(|stack| stack.borrow().last().copied())
            .ok()
            .flatten()
            .ok_or_else(no_context)
    }

    pub fn reset(token: ContextToken) -> Result<()> {
        CONTEXT
            .try_with(|stack| {
                let mut stack = stack.borrow_mut();
                if stack.get(token.depth) != Some(&token.id) {
                    return Err(Error::configuration(format!(
                        "session context token for {} does not belong to this context",
                        token.id
                    )));
                }
                stack.truncate(token.depth);
                Ok(())
            })
            .map_err(|_| no_context())?
    }

    /// Number of ids on the current task's stack.
    pub fn depth() -> usize {
        CONTEXT.try_with(|stack| stack.borrow().len()).unwrap_or(0)
    }
}

fn no_context() -> Error {
    Error::configuration("no session context is active")
}
