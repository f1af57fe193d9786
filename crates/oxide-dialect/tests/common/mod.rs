#![allow(dead_code)]

use oxide_dialect::query::QueryExpression;
use oxide_dialect::{Dialect, Formatter, OracleDialect, PostgresDialect, SqliteDialect};

pub fn oracle(query: &QueryExpression) -> String {
    Formatter::new(&OracleDialect::new()).format(query)
}

pub fn postgres(query: &QueryExpression) -> String {
    Formatter::new(&PostgresDialect::new()).format(query)
}

pub fn sqlite(query: &QueryExpression) -> String {
    Formatter::new(&SqliteDialect::new()).format(query)
}

/// Formats with plain field aliases turned off, leaving only the SQL shape.
pub fn unaliased(dialect: &dyn Dialect, query: &QueryExpression) -> String {
    Formatter::new(dialect).force_alias(false).format(query)
}

/// Every dialect under test, for properties that must hold for all of them.
pub fn all_dialects() -> Vec<Box<dyn Dialect>> {
    vec![
        Box::new(OracleDialect::new()),
        Box::new(OracleDialect::legacy()),
        Box::new(PostgresDialect::new()),
        Box::new(SqliteDialect::new()),
    ]
}
