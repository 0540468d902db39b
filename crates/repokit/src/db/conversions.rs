//! Moving values between `repokit_core` and sqlx.

use repokit_core::{Error, Result, Row, Value};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column as _, Row as _, TypeInfo as _, ValueRef as _};

use super::error::driver_error;

/// Builds a sqlx query for `sql` with `params` bound in order.
pub fn bind_all<'q>(sql: &'q str, params: &'q [Value]) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    params
        .iter()
        .fold(sqlx::query(sql), |query, value| match value {
            Value::Null => query.bind(None::<i64>),
            Value::Integer(v) => query.bind(*v),
            Value::Real(v) => query.bind(*v),
            Value::Text(v) => query.bind(v.as_str()),
            Value::Blob(v) => query.bind(v.as_slice()),
        })
}

/// Decodes a sqlx row by the storage class of each value.
pub fn decode_row(row: &SqliteRow) -> Result<Row> {
    let columns: Vec<String> = row
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    let values = (0..columns.len())
        .map(|index| decode_value(row, index))
        .collect::<Result<Vec<_>>>()?;

    Ok(Row::new(columns, values))
}

fn decode_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index).map_err(driver_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" | "BOOLEAN" => {
            Value::Integer(row.try_get_unchecked::<i64, _>(index).map_err(driver_error)?)
        }
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
            Value::Real(row.try_get_unchecked::<f64, _>(index).map_err(driver_error)?)
        }
        "BLOB" => Value::Blob(
            row.try_get_unchecked::<Vec<u8>, _>(index)
                .map_err(driver_error)?,
        ),
        "TEXT" | "DATETIME" | "DATE" | "TIME" => {
            Value::Text(row.try_get_unchecked::<String, _>(index).map_err(driver_error)?)
        }
        other => {
            return Err(Error::system(format!(
                "cannot decode column {index} of type {other}"
            )))
        }
    };
    Ok(value)
}
