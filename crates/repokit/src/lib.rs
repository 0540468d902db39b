//! Imperative shell of repokit: configuration, sessions over SQLite pools,
//! the generic repository and controller, and the demo records.

pub mod config;
pub mod controller;
pub mod db;
pub mod models;
pub mod repository;

#[cfg(test)]
mod testing;

pub use config::Settings;
pub use controller::Controller;
pub use db::{session_scope, transactional, Session, SessionContext, SessionId, SessionKeeper};
pub use repository::{Repository, SynchronizeSession};
