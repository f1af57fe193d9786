#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use oxide_dialect::{Dialect, SqlValue, SqliteDialect};
use oxide_migrate::{Connection, DataAdapter, Result, Row, SqliteConnection};
use sqlx::sqlite::SqlitePoolOptions;

/// Answers one statement: `(sql, params) -> rows`.
pub type Handler = Box<dyn FnMut(&str, &[SqlValue]) -> Result<Vec<Row>> + Send>;

/// Shared record of every statement a [`ScriptedConnection`] received.
#[derive(Clone, Default)]
pub struct StatementLog(Arc<Mutex<Vec<(String, Vec<SqlValue>)>>>);

impl StatementLog {
    fn push(&self, sql: &str, params: &[SqlValue]) {
        self.0
            .lock()
            .unwrap()
            .push((String::from(sql), params.to_vec()));
    }

    /// All statements in order, including BEGIN/COMMIT/ROLLBACK.
    pub fn statements(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|(sql, _)| sql.clone()).collect()
    }

    /// Statements that change the database: DDL and DML.
    pub fn writes(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter(|sql| {
                ["CREATE", "ALTER", "INSERT", "UPDATE", "DROP"]
                    .iter()
                    .any(|prefix| sql.starts_with(prefix))
            })
            .collect()
    }

    /// Parameters of the first statement starting with `prefix`.
    pub fn params_of(&self, prefix: &str) -> Option<Vec<SqlValue>> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .find(|(sql, _)| sql.starts_with(prefix))
            .map(|(_, params)| params.clone())
    }

    /// Number of statements containing `fragment` whose first parameter is
    /// `first_param`.
    pub fn lookups(&self, fragment: &str, first_param: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(sql, params)| {
                sql.contains(fragment)
                    && params.first() == Some(&SqlValue::Text(String::from(first_param)))
            })
            .count()
    }
}

/// A connection that records statements and answers them from a script.
pub struct ScriptedConnection {
    handler: Handler,
    log: StatementLog,
}

impl ScriptedConnection {
    pub fn new(
        handler: impl FnMut(&str, &[SqlValue]) -> Result<Vec<Row>> + Send + 'static,
    ) -> (Self, StatementLog) {
        let log = StatementLog::default();
        let connection = Self {
            handler: Box::new(handler),
            log: log.clone(),
        };
        (connection, log)
    }
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn open(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        self.log.push(sql, params);
        (self.handler)(sql, params)
    }

    async fn begin(&mut self) -> Result<()> {
        self.log.push("BEGIN", &[]);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.log.push("COMMIT", &[]);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.log.push("ROLLBACK", &[]);
        Ok(())
    }
}

/// Builds a scripted adapter for `dialect`.
pub fn scripted<D: Dialect>(
    dialect: D,
    handler: impl FnMut(&str, &[SqlValue]) -> Result<Vec<Row>> + Send + 'static,
) -> (DataAdapter<ScriptedConnection, D>, StatementLog) {
    let (connection, log) = ScriptedConnection::new(handler);
    (DataAdapter::new(connection, dialect), log)
}

/// A single `count` row.
pub fn count(n: i64) -> Vec<Row> {
    vec![Row::new().with("count", SqlValue::Int(n))]
}

/// A single `value` row.
pub fn value_row(n: i64) -> Vec<Row> {
    vec![Row::new().with("value", SqlValue::Int(n))]
}

/// A ledger row as the ledger query returns it.
pub fn ledger_row(applies_to: &str, version: &str) -> Row {
    Row::new()
        .with("appliesTo", text(applies_to))
        .with("model", SqlValue::Null)
        .with("version", text(version))
        .with("description", SqlValue::Null)
}

/// A column row as the catalog query returns it.
pub fn column_row(
    name: &str,
    data_type: &str,
    size: Option<i64>,
    precision: Option<i64>,
    scale: Option<i64>,
    nullable: bool,
    primary: bool,
) -> Row {
    let number = |v: Option<i64>| v.map_or(SqlValue::Null, SqlValue::Int);
    Row::new()
        .with("name", text(name))
        .with("type", text(data_type))
        .with("ordinal", SqlValue::Null)
        .with("size", number(size))
        .with("precision", number(precision))
        .with("scale", number(scale))
        .with("nullable", SqlValue::Int(i64::from(nullable)))
        .with("primary", SqlValue::Int(i64::from(primary)))
}

pub fn text(value: &str) -> SqlValue {
    SqlValue::Text(String::from(value))
}

/// An adapter over a fresh in-memory SQLite database.
pub async fn sqlite_adapter() -> DataAdapter<SqliteConnection, SqliteDialect> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    DataAdapter::new(SqliteConnection::new(pool), SqliteDialect::new())
}
