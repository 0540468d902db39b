use crate::query::Column;
use crate::value::{Row, Value};
use crate::Result;

use super::JoinRegistry;

/// Capability of a table-backed record type.
///
/// Implementors describe their table, columns and primary key, decode
/// themselves from a result [`Row`], and may register named join resolvers
/// that the query builder applies on request.
pub trait Record: Sized + Send + Sync + 'static {
    /// Table name.
    const TABLE: &'static str;
    /// Human-readable type name, used in error messages.
    const NAME: &'static str;
    /// Every column of the table.
    const COLUMNS: &'static [&'static str];
    const PRIMARY_KEY: &'static str = "id";

    fn from_row(row: &Row) -> Result<Self>;

    fn primary_key_value(&self) -> Value;

    /// Registers the joins this record supports, keyed by name.
    fn register_joins(_joins: &mut JoinRegistry<Self>) {}

    fn has_column(name: &str) -> bool {
        Self::COLUMNS.contains(&name)
    }

    /// A column of this record's table.
    fn column(name: &str) -> Column {
        Column::new(Self::TABLE, name)
    }
}
