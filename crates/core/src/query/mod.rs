//! Query descriptors and the pieces they are built from.

mod builder;
mod descriptor;
mod expr;
mod order;

pub use builder::{QueryBuilder, QueryOptions};
pub use descriptor::{JoinClause, JoinKind, Query};
pub use expr::{Column, CompareOp, Expr, Operand, SelectItem};
pub use order::{Direction, OrderBy, OrderEntry, OrderSpec};

pub(crate) use expr::render_where;
