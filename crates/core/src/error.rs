use std::fmt::Display;

use thiserror::Error;

/// Errors surfaced by the data-access layer.
///
/// Driver failures never leak through this type: they are flattened into
/// [`Error::System`] at the repository boundary so callers do not depend on
/// the database driver's error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A lookup by identifier found no matching row.
    #[error("{0}")]
    NotFound(String),
    /// Malformed query description (programmer error, not a data error).
    #[error("Validation error: {0}")]
    Validation(String),
    /// Missing join resolver, missing session context, bad database URL.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Any underlying database failure: connection loss, constraint violation, timeout.
    #[error("System error: {0}")]
    System(String),
}

impl Error {
    /// Builds the canonical "not found" error for a record lookup by id.
    pub fn not_found(record_name: &str, id: impl Display) -> Self {
        Self::NotFound(format!("{record_name} with id: {id} does not exist"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::System(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }
}

/// Result type for data-access operations.
pub type Result<T> = std::result::Result<T, Error>;
