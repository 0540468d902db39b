//! Session machinery: engines, routing sessions, the task-local session
//! context, the keeper that maps context ids to sessions, and the scoped and
//! transactional wrappers built on top.

pub mod context;
mod conversions;
pub mod engine;
pub mod error;
pub mod keeper;
pub mod scope;
pub mod session;
pub mod transactional;

pub use context::{ContextToken, SessionContext, SessionId};
pub use engine::EnginePair;
pub use keeper::SessionKeeper;
pub use scope::session_scope;
pub use session::Session;
pub use transactional::{transactional, with_transaction};
