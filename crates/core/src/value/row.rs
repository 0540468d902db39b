use serde_json::Map;

use crate::{Error, Result};

use super::{FromValue, Value};

/// One result row: column labels in select order, paired with their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from parallel label and value lists.
    ///
    /// Extra values without a label (or labels without a value) are dropped.
    pub fn new(mut columns: Vec<String>, mut values: Vec<Value>) -> Self {
        let len = columns.len().min(values.len());
        columns.truncate(len);
        values.truncate(len);
        Self { columns, values }
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let (columns, values) = pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Raw value for a label. The first matching label wins.
    pub fn value(&self, label: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|column| column == label)
            .and_then(|index| self.values.get(index))
    }

    /// Typed value for a label; a missing label is an error.
    pub fn get<T: FromValue>(&self, label: &str) -> Result<T> {
        let value = self
            .value(label)
            .ok_or_else(|| Error::system(format!("column '{label}' missing from result row")))?;
        T::from_value(value)
            .map_err(|reason| Error::system(format!("cannot decode column '{label}': {reason}")))
    }

    /// Typed value for a label that may be absent from the projection,
    /// such as columns contributed by an optional join.
    pub fn get_optional<T: FromValue>(&self, label: &str) -> Result<Option<T>> {
        match self.value(label) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get(label).map(Some),
        }
    }

    /// JSON object keyed by column label.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = Map::with_capacity(self.len());
        for (column, value) in self.columns.iter().zip(&self.values) {
            let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
            map.insert(column.clone(), json);
        }
        serde_json::Value::Object(map)
    }
}
