//! Functional core of repokit.
//!
//! Everything in this crate is pure: record capabilities, values, predicate
//! expressions, query descriptors and their rendering into SQLite statements,
//! the read/write routing decision and the error taxonomy. Executing
//! statements is left to the `repokit` crate.

mod error;
mod http_mapping;
pub mod query;
pub mod record;
pub mod statement;
pub mod value;

pub use error::{Error, Result};
pub use http_mapping::error_to_status_code;
pub use query::{
    Column, Direction, Expr, JoinClause, JoinKind, OrderBy, OrderEntry, OrderSpec, Query,
    QueryBuilder, QueryOptions, SelectItem,
};
pub use record::{JoinRegistry, Record};
pub use statement::{route, EngineType, Statement, StatementKind};
pub use value::{parse_datetime, Attributes, FromValue, Row, Value};
