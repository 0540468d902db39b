//! `INSERT`, `UPDATE`, upsert and `DELETE` rendering.
//!
//! Every statement returns the affected rows (`RETURNING *`) so callers can
//! hand back the records as stored, defaults included.

use std::collections::BTreeSet;

use crate::query::{render_where, Expr};
use crate::value::{Attributes, Value};
use crate::{Error, Result};

use super::{SqlWriter, Statement, StatementKind};

/// Multi-row `INSERT ... RETURNING *`.
///
/// Every row must carry the same column set. A single row without columns
/// renders `DEFAULT VALUES`.
pub fn insert(table: &str, rows: &[Attributes]) -> Result<Statement> {
    let columns = shared_columns(rows)?;

    let mut writer = SqlWriter::new();
    writer.push("INSERT INTO ").push_ident(table);

    if columns.is_empty() {
        if rows.len() > 1 {
            return Err(Error::validation(
                "cannot insert several rows without any column",
            ));
        }
        writer.push(" DEFAULT VALUES RETURNING *");
        return Ok(writer.finish(StatementKind::Insert));
    }

    push_column_list(&mut writer, &columns, None);
    push_values(&mut writer, rows, &columns, None);
    writer.push(" RETURNING *");
    Ok(writer.finish(StatementKind::Insert))
}

/// `UPDATE ... SET ... WHERE ... RETURNING *`.
pub fn update(table: &str, predicates: &[Expr], attributes: &Attributes) -> Result<Statement> {
    if attributes.is_empty() {
        return Err(Error::validation("no attributes to update"));
    }

    let mut writer = SqlWriter::new();
    writer
        .push("UPDATE ")
        .push_ident(table)
        .push(" SET ")
        .push_list(attributes, ", ", |w, (column, value)| {
            w.push_ident(column).push(" = ").push_param(value.clone());
        });
    render_where(&mut writer, predicates);
    writer.push(" RETURNING *");
    Ok(writer.finish(StatementKind::Update))
}

/// Single-row upsert: on conflict every given attribute is overwritten with
/// the value just offered.
///
/// `touch` names a column to stamp with `CURRENT_TIMESTAMP` on both the
/// insert and the update path.
pub fn upsert(
    table: &str,
    conflict_keys: &[&str],
    attributes: &Attributes,
    touch: Option<&str>,
) -> Result<Statement> {
    let (attributes, touch) = split_touch(attributes, touch);
    let columns: Vec<&str> = attributes.keys().map(String::as_str).collect();
    ensure_upsertable(conflict_keys, &columns, touch)?;

    let mut writer = SqlWriter::new();
    writer.push("INSERT INTO ").push_ident(table);
    push_column_list(&mut writer, &columns, touch);
    push_values(&mut writer, std::slice::from_ref(&attributes), &columns, touch);
    push_conflict_target(&mut writer, conflict_keys);

    writer.push_list(&attributes, ", ", |w, (column, value)| {
        w.push_ident(column).push(" = ").push_param(value.clone());
    });
    push_touch_assignment(&mut writer, !attributes.is_empty(), touch);

    writer.push(" RETURNING *");
    Ok(writer.finish(StatementKind::Insert))
}

/// Batched upsert: on conflict the columns of the rows are overwritten from
/// the offered row (`excluded`).
pub fn upsert_many(
    table: &str,
    conflict_keys: &[&str],
    rows: &[Attributes],
    touch: Option<&str>,
) -> Result<Statement> {
    let split: Vec<Attributes> = rows
        .iter()
        .map(|row| split_touch(row, touch).0)
        .collect();
    let columns = shared_columns(&split)?;
    ensure_upsertable(conflict_keys, &columns, touch)?;

    let mut writer = SqlWriter::new();
    writer.push("INSERT INTO ").push_ident(table);
    push_column_list(&mut writer, &columns, touch);
    push_values(&mut writer, &split, &columns, touch);
    push_conflict_target(&mut writer, conflict_keys);

    writer.push_list(&columns, ", ", |w, column| {
        w.push_ident(column).push(" = excluded.").push_ident(column);
    });
    push_touch_assignment(&mut writer, !columns.is_empty(), touch);

    writer.push(" RETURNING *");
    Ok(writer.finish(StatementKind::Insert))
}

/// `DELETE FROM ... WHERE ...`, optionally reporting the deleted rows.
pub fn delete(table: &str, predicates: &[Expr], returning: bool) -> Statement {
    let mut writer = SqlWriter::new();
    writer.push("DELETE FROM ").push_ident(table);
    render_where(&mut writer, predicates);
    if returning {
        writer.push(" RETURNING *");
    }
    writer.finish(StatementKind::Delete)
}

/// The column set every row shares, in key order.
fn shared_columns(rows: &[Attributes]) -> Result<Vec<&str>> {
    let Some(first) = rows.first() else {
        return Err(Error::validation("no rows to write"));
    };
    let expected: BTreeSet<&str> = first.keys().map(String::as_str).collect();
    for (index, row) in rows.iter().enumerate().skip(1) {
        let keys: BTreeSet<&str> = row.keys().map(String::as_str).collect();
        if keys != expected {
            return Err(Error::validation(format!(
                "row {index} does not carry the same columns as the first row"
            )));
        }
    }
    Ok(expected.into_iter().collect())
}

/// Removes the touched column from the attributes; it is rendered as
/// `CURRENT_TIMESTAMP` instead of a bound value.
fn split_touch<'a>(
    attributes: &Attributes,
    touch: Option<&'a str>,
) -> (Attributes, Option<&'a str>) {
    let mut attributes = attributes.clone();
    if let Some(column) = touch {
        attributes.remove(column);
    }
    (attributes, touch)
}

fn ensure_upsertable(conflict_keys: &[&str], columns: &[&str], touch: Option<&str>) -> Result<()> {
    if conflict_keys.is_empty() {
        return Err(Error::validation("upsert needs at least one conflict key"));
    }
    if columns.is_empty() && touch.is_none() {
        return Err(Error::validation("upsert needs at least one attribute"));
    }
    Ok(())
}

fn push_column_list(writer: &mut SqlWriter, columns: &[&str], touch: Option<&str>) {
    writer
        .push(" (")
        .push_list(columns.iter().copied().chain(touch), ", ", |w, column| {
            w.push_ident(column);
        })
        .push(")");
}

fn push_values(writer: &mut SqlWriter, rows: &[Attributes], columns: &[&str], touch: Option<&str>) {
    writer.push(" VALUES ").push_list(rows, ", ", |w, row| {
        w.push("(").push_list(columns, ", ", |w, column| {
            let value = row.get(*column).cloned().unwrap_or(Value::Null);
            w.push_param(value);
        });
        if touch.is_some() {
            if !columns.is_empty() {
                w.push(", ");
            }
            w.push("CURRENT_TIMESTAMP");
        }
        w.push(")");
    });
}

fn push_conflict_target(writer: &mut SqlWriter, conflict_keys: &[&str]) {
    writer
        .push(" ON CONFLICT (")
        .push_list(conflict_keys, ", ", |w, key| {
            w.push_ident(key);
        })
        .push(") DO UPDATE SET ");
}

fn push_touch_assignment(writer: &mut SqlWriter, after_other: bool, touch: Option<&str>) {
    if let Some(column) = touch {
        if after_other {
            writer.push(", ");
        }
        writer.push_ident(column).push(" = CURRENT_TIMESTAMP");
    }
}
