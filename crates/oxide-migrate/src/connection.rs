//! The connection seam.
//!
//! The engine never talks to a driver directly. A [`Connection`] opens a
//! session, runs parameterized statements and exposes the transaction
//! primitives; everything above it is backend independent.

use async_trait::async_trait;
use oxide_dialect::SqlValue;

use crate::error::Result;

/// A result row: ordered `(column, value)` pairs.
///
/// Lookups by name are case-insensitive, since backends disagree on the
/// case they report unquoted aliases in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: SqlValue) -> Self {
        self.push(name, value);
        self
    }

    /// Appends a column.
    pub fn push(&mut self, name: impl Into<String>, value: SqlValue) {
        self.columns.push((name.into(), value));
    }

    /// Returns the value of column `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Returns column `name` as an integer.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(SqlValue::as_i64)
    }

    /// Returns column `name` as text.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(SqlValue::as_str)
    }

    /// Returns column `name` as a boolean.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(SqlValue::as_bool)
    }

    /// Returns the columns in order.
    #[must_use]
    pub fn columns(&self) -> &[(String, SqlValue)] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A database session.
///
/// `execute` runs in autocommit mode unless `begin` has been called.
/// Placeholders in `sql` follow the dialect's placeholder style.
#[async_trait]
pub trait Connection: Send {
    /// Opens the session. Opening an open session is a no-op.
    async fn open(&mut self) -> Result<()>;

    /// Closes the session. Closing a closed session is a no-op.
    async fn close(&mut self) -> Result<()>;

    /// Runs a statement and returns its rows (empty for DDL and DML).
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>>;

    /// Starts a transaction.
    async fn begin(&mut self) -> Result<()>;

    /// Commits the current transaction.
    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the current transaction.
    async fn rollback(&mut self) -> Result<()>;
}
