//! Ordering specifications.
//!
//! An [`OrderSpec`] is the loosely typed form callers hand in (often straight
//! from request parameters); [`OrderSpec::resolve`] turns it into concrete
//! [`OrderBy`] clauses against a base table.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

use super::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// One resolved `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }
}

/// An entry in an order list: a bare field on the base record, or a field on
/// another (joined) table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderEntry {
    Field(String),
    Related {
        #[serde(default)]
        field: Option<String>,
        #[serde(default, rename = "type", alias = "table")]
        table: Option<String>,
    },
}

impl OrderEntry {
    pub fn field(name: impl Into<String>) -> Self {
        OrderEntry::Field(name.into())
    }

    pub fn related(table: impl Into<String>, field: impl Into<String>) -> Self {
        OrderEntry::Related {
            field: Some(field.into()),
            table: Some(table.into()),
        }
    }
}

/// `{"asc": [...]}` or `{"desc": [...]}`.
///
/// Only one direction is honored per spec: `asc` when present, otherwise
/// `desc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asc: Option<Vec<OrderEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<Vec<OrderEntry>>,
}

impl OrderSpec {
    pub fn asc<I, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<OrderEntry>,
    {
        Self {
            asc: Some(entries.into_iter().map(Into::into).collect()),
            desc: None,
        }
    }

    pub fn desc<I, E>(entries: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<OrderEntry>,
    {
        Self {
            asc: None,
            desc: Some(entries.into_iter().map(Into::into).collect()),
        }
    }

    /// Parses a spec from JSON, rejecting entries that are neither a string
    /// nor an object.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value)
            .map_err(|e| Error::validation(format!("Order params must be string or dict: {e}")))
    }

    /// The honored direction and its entries, if any.
    pub fn direction(&self) -> Option<(Direction, &[OrderEntry])> {
        match (&self.asc, &self.desc) {
            (Some(entries), _) => Some((Direction::Asc, entries.as_slice())),
            (None, Some(entries)) => Some((Direction::Desc, entries.as_slice())),
            (None, None) => None,
        }
    }

    /// Resolves every honored entry against `base_table`.
    ///
    /// Bare fields must be one of `base_columns`; related entries must name a
    /// field and default to the base table when no table is given.
    pub fn resolve(&self, base_table: &str, base_columns: &[&str]) -> Result<Vec<OrderBy>> {
        let Some((direction, entries)) = self.direction() else {
            return Ok(Vec::new());
        };

        entries
            .iter()
            .map(|entry| {
                let column = match entry {
                    OrderEntry::Field(field) => {
                        ensure_known(base_table, base_columns, field)?;
                        Column::new(base_table, field.as_str())
                    }
                    OrderEntry::Related { field, table } => {
                        let field = field
                            .as_deref()
                            .ok_or_else(|| Error::validation("Missing field in order"))?;
                        match table.as_deref() {
                            None => {
                                ensure_known(base_table, base_columns, field)?;
                                Column::new(base_table, field)
                            }
                            Some(table) if table == base_table => {
                                ensure_known(base_table, base_columns, field)?;
                                Column::new(table, field)
                            }
                            Some(table) => Column::new(table, field),
                        }
                    }
                };
                Ok(OrderBy { column, direction })
            })
            .collect()
    }
}

impl From<&str> for OrderEntry {
    fn from(field: &str) -> Self {
        OrderEntry::Field(field.to_string())
    }
}

impl From<String> for OrderEntry {
    fn from(field: String) -> Self {
        OrderEntry::Field(field)
    }
}

fn ensure_known(table: &str, columns: &[&str], field: &str) -> Result<()> {
    if columns.contains(&field) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "Unknown column '{field}' on '{table}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const COLUMNS: &[&str] = &["id", "name", "updated_at"];

    #[test]
    fn test_bare_fields_resolve_against_base_table() {
        let spec = OrderSpec::desc(["name", "id"]);
        let order = spec.resolve("users", COLUMNS).unwrap();
        assert_eq!(
            order,
            vec![
                OrderBy::desc(Column::new("users", "name")),
                OrderBy::desc(Column::new("users", "id")),
            ]
        );
    }

    #[test]
    fn test_asc_wins_when_both_present() {
        let spec = OrderSpec {
            asc: Some(vec!["id".into()]),
            desc: Some(vec!["name".into()]),
        };
        let order = spec.resolve("users", COLUMNS).unwrap();
        assert_eq!(order, vec![OrderBy::asc(Column::new("users", "id"))]);
    }

    #[test]
    fn test_related_entry_targets_other_table() {
        let spec = OrderSpec::asc([OrderEntry::related("posts", "title")]);
        let order = spec.resolve("users", COLUMNS).unwrap();
        assert_eq!(order, vec![OrderBy::asc(Column::new("posts", "title"))]);
    }

    #[test]
    fn test_related_entry_without_field_is_rejected() {
        let spec = OrderSpec::from_json(&json!({"asc": [{"type": "posts"}]})).unwrap();
        let err = spec.resolve("users", COLUMNS).unwrap_err();
        assert_eq!(err, Error::validation("Missing field in order"));
    }

    #[test]
    fn test_related_entry_without_table_uses_base() {
        let spec = OrderSpec::from_json(&json!({"desc": [{"field": "name"}]})).unwrap();
        let order = spec.resolve("users", COLUMNS).unwrap();
        assert_eq!(order, vec![OrderBy::desc(Column::new("users", "name"))]);
    }

    #[test]
    fn test_unknown_bare_field_is_rejected() {
        let err = OrderSpec::asc(["age"]).resolve("users", COLUMNS).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_non_string_entry_is_rejected() {
        let err = OrderSpec::from_json(&json!({"asc": [42]})).unwrap_err();
        assert!(err
            .to_string()
            .contains("Order params must be string or dict"));
    }

    #[test]
    fn test_from_json_accepts_mixed_entries() {
        let spec =
            OrderSpec::from_json(&json!({"asc": ["name", {"field": "title", "type": "posts"}]}))
                .unwrap();
        assert_eq!(
            spec.asc,
            Some(vec![
                OrderEntry::field("name"),
                OrderEntry::related("posts", "title")
            ])
        );
    }

    #[test]
    fn test_empty_spec_orders_nothing() {
        assert!(OrderSpec::default().resolve("users", COLUMNS).unwrap().is_empty());
    }
}
