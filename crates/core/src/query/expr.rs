//! Column references and predicate expressions.

use crate::statement::SqlWriter;
use crate::value::Value;

/// A column reference, optionally qualified by its table (or join alias).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    table: Option<String>,
    name: String,
}

impl Column {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// An unqualified column, e.g. a label produced by a subquery.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Projects this column under a different label.
    pub fn label(self, alias: impl Into<String>) -> SelectItem {
        SelectItem {
            column: self,
            alias: Some(alias.into()),
        }
    }

    fn compare(&self, op: CompareOp, value: impl Into<Value>) -> Expr {
        Expr::Compare {
            left: self.clone(),
            op,
            right: Operand::Value(value.into()),
        }
    }

    pub fn eq(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Eq, value)
    }

    pub fn ne(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Ne, value)
    }

    pub fn lt(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Lt, value)
    }

    pub fn le(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Le, value)
    }

    pub fn gt(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Gt, value)
    }

    pub fn ge(&self, value: impl Into<Value>) -> Expr {
        self.compare(CompareOp::Ge, value)
    }

    pub fn like(&self, pattern: impl Into<String>) -> Expr {
        self.compare(CompareOp::Like, pattern.into())
    }

    pub fn not_like(&self, pattern: impl Into<String>) -> Expr {
        self.compare(CompareOp::NotLike, pattern.into())
    }

    /// Column-to-column equality, the usual join condition.
    pub fn eq_column(&self, other: &Column) -> Expr {
        Expr::Compare {
            left: self.clone(),
            op: CompareOp::Eq,
            right: Operand::Column(other.clone()),
        }
    }

    pub fn is_in<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::InList {
            column: self.clone(),
            values: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    pub fn not_in<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Expr {
        Expr::InList {
            column: self.clone(),
            values: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    pub fn is_null(&self) -> Expr {
        Expr::Null {
            column: self.clone(),
            negated: false,
        }
    }

    pub fn is_not_null(&self) -> Expr {
        Expr::Null {
            column: self.clone(),
            negated: true,
        }
    }
}

/// A projected column with an optional label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub column: Column,
    pub alias: Option<String>,
}

impl From<Column> for SelectItem {
    fn from(column: Column) -> Self {
        Self {
            column,
            alias: None,
        }
    }
}

impl SelectItem {
    pub(crate) fn render(&self, writer: &mut SqlWriter) {
        writer.push_column(&self.column);
        if let Some(alias) = &self.alias {
            writer.push(" AS ").push_ident(alias);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::NotLike => "NOT LIKE",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    Column(Column),
}

/// A boolean predicate over columns.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare {
        left: Column,
        op: CompareOp,
        right: Operand,
    },
    InList {
        column: Column,
        values: Vec<Value>,
        negated: bool,
    },
    Null {
        column: Column,
        negated: bool,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    pub fn and(self, other: Expr) -> Expr {
        match self {
            Expr::And(mut items) => {
                items.push(other);
                Expr::And(items)
            }
            first => Expr::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Expr) -> Expr {
        match self {
            Expr::Or(mut items) => {
                items.push(other);
                Expr::Or(items)
            }
            first => Expr::Or(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Expr {
        Expr::Not(Box::new(self))
    }

    fn is_compound(&self) -> bool {
        matches!(self, Expr::And(_) | Expr::Or(_))
    }

    pub(crate) fn render(&self, writer: &mut SqlWriter) {
        match self {
            // `= NULL` never matches in SQL; compare with IS instead.
            Expr::Compare {
                left,
                op: op @ (CompareOp::Eq | CompareOp::Ne),
                right: Operand::Value(Value::Null),
            } => {
                writer.push_column(left);
                writer.push(if *op == CompareOp::Eq {
                    " IS NULL"
                } else {
                    " IS NOT NULL"
                });
            }
            Expr::Compare { left, op, right } => {
                writer.push_column(left).push(" ").push(op.as_sql()).push(" ");
                match right {
                    Operand::Value(value) => writer.push_param(value.clone()),
                    Operand::Column(column) => writer.push_column(column),
                };
            }
            Expr::InList {
                values, negated, ..
            } if values.is_empty() => {
                writer.push(if *negated { "1 = 1" } else { "1 = 0" });
            }
            Expr::InList {
                column,
                values,
                negated,
            } => {
                writer
                    .push_column(column)
                    .push(if *negated { " NOT IN (" } else { " IN (" })
                    .push_list(values, ", ", |w, value| {
                        w.push_param(value.clone());
                    })
                    .push(")");
            }
            Expr::Null { column, negated } => {
                writer
                    .push_column(column)
                    .push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Expr::And(items) => render_group(writer, items, " AND ", "1 = 1"),
            Expr::Or(items) => render_group(writer, items, " OR ", "1 = 0"),
            Expr::Not(inner) => {
                writer.push("NOT ");
                if inner.is_compound() {
                    inner.render(writer);
                } else {
                    writer.push("(");
                    inner.render(writer);
                    writer.push(")");
                }
            }
        }
    }
}

fn render_group(writer: &mut SqlWriter, items: &[Expr], separator: &str, identity: &str) {
    if items.is_empty() {
        writer.push(identity);
        return;
    }
    writer
        .push("(")
        .push_list(items, separator, |w, item| item.render(w))
        .push(")");
}

/// Renders a conjunctive predicate list; empty lists render nothing.
pub(crate) fn render_where(writer: &mut SqlWriter, predicates: &[Expr]) {
    if predicates.is_empty() {
        return;
    }
    writer
        .push(" WHERE ")
        .push_list(predicates, " AND ", |w, predicate| predicate.render(w));
}
