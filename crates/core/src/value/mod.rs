mod datetime;
mod row;
mod types;

pub use datetime::parse_datetime;
pub use row::Row;
pub use types::{Attributes, FromValue, Value};
