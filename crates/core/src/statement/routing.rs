//! Which engine a statement runs on.
//!
//! Reads go to the reader engine unless the session already holds writes it
//! has not committed; everything else goes to the writer.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL, pragmas with assignments, transaction control and anything else
    /// that is not recognisably a read.
    Other,
}

impl StatementKind {
    /// Classifies raw SQL by its leading keyword.
    ///
    /// A `WITH` prefix is skipped: the statement is classified by the keyword
    /// that follows its common table expressions, so `WITH .. DELETE` is a
    /// delete.
    pub fn classify(sql: &str) -> Self {
        let trimmed = sql.trim_start();
        let keyword = leading_keyword(trimmed);

        match keyword.as_str() {
            "WITH" => Self::classify_with(trimmed),
            "SELECT" | "EXPLAIN" | "VALUES" => StatementKind::Select,
            // `PRAGMA name` reads, `PRAGMA name = value` writes.
            "PRAGMA" if !trimmed.contains('=') => StatementKind::Select,
            "INSERT" | "REPLACE" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }

    pub fn is_read(self) -> bool {
        self == StatementKind::Select
    }

    /// The first statement keyword outside parentheses and quotes decides.
    fn classify_with(sql: &str) -> Self {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut word = String::new();

        for c in sql.chars().chain(std::iter::once(' ')) {
            if let Some(close) = quote {
                if c == close {
                    quote = None;
                }
                continue;
            }
            if depth == 0 && (c.is_ascii_alphanumeric() || c == '_') {
                word.push(c.to_ascii_uppercase());
                continue;
            }
            match word.as_str() {
                "SELECT" | "VALUES" => return StatementKind::Select,
                "INSERT" | "REPLACE" => return StatementKind::Insert,
                "UPDATE" => return StatementKind::Update,
                "DELETE" => return StatementKind::Delete,
                _ => word.clear(),
            }
            match c {
                '(' => depth += 1,
                ')' => depth = depth.saturating_sub(1),
                '\'' | '"' | '`' => quote = Some(c),
                '[' => quote = Some(']'),
                _ => {}
            }
        }
        StatementKind::Other
    }
}

fn leading_keyword(sql: &str) -> String {
    sql.chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineType {
    Writer,
    Reader,
}

impl fmt::Display for EngineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineType::Writer => write!(f, "writer"),
            EngineType::Reader => write!(f, "reader"),
        }
    }
}

/// Picks the engine for a statement of `kind`.
pub fn route(kind: StatementKind, pending_writes: bool) -> EngineType {
    if kind.is_read() && !pending_writes {
        EngineType::Reader
    } else {
        EngineType::Writer
    }
}
