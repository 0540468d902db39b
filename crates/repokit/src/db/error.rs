//! sqlx error mapping.
//!
//! Flattens `sqlx::Error` into `Error::System` from `repokit_core` so that no
//! driver type crosses the repository boundary.

use repokit_core::Error;

/// Maps a sqlx error to a system error.
///
/// # Error Mapping
///
/// - Pool exhaustion, pool closed, I/O and TLS failures → `"connection pool: ..."`
/// - Database errors (constraints, locks, syntax) → `"query failed: ..."`
/// - Column lookups and decoding → `"decode failed: ..."`
/// - All other errors → `"database error: ..."`
pub fn driver_error(err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => Error::system(format!("connection pool: {err}")),

        sqlx::Error::Database(db_err) => {
            Error::system(format!("query failed: {}", db_err.message()))
        }

        sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_) => Error::system(format!("decode failed: {err}")),

        _ => Error::system(format!("database error: {err}")),
    }
}
