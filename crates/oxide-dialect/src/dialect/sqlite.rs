//! SQLite dialect.
//!
//! SQLite has no sequences and only supports `ADD COLUMN` in `ALTER TABLE`.
//! Declared column types are reported back verbatim by `pragma_table_info`,
//! so canonical type strings round-trip without reconstruction.

use super::{BoundQuery, Dialect, FunctionArg};
use crate::field::{ColumnMetadata, FieldDescriptor, LogicalType};
use crate::name::QualifiedName;
use crate::profile::DialectProfile;
use crate::query::ScalarFunction;
use crate::value::SqlValue;

/// SQLite dialect.
#[derive(Debug, Clone)]
pub struct SqliteDialect {
    profile: DialectProfile,
}

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profile: DialectProfile::sqlite(),
        }
    }

    /// The `sqlite_master` of the attached database holding `name`.
    fn master(&self, name: &QualifiedName) -> String {
        match &name.schema {
            Some(schema) => format!("{}.sqlite_master", self.escape_identifier(schema)),
            None => String::from("sqlite_master"),
        }
    }

    fn object_exists(&self, object_type: &str, name: &QualifiedName) -> BoundQuery {
        (
            format!(
                "SELECT COUNT(*) AS \"count\" FROM {} WHERE type = '{object_type}' AND name = ?",
                self.master(name)
            ),
            vec![SqlValue::Text(name.name.clone())],
        )
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

fn strftime(arg: Option<&FunctionArg<'_>>, format: &str) -> String {
    let sql = arg.map_or("NULL", |a| a.sql);
    format!("CAST(STRFTIME('{format}', {sql}) AS INTEGER)")
}

/// Text predicates drop out when either operand is NULL.
fn text_operands<'a>(args: &'a [FunctionArg<'a>]) -> Option<(&'a str, &'a str)> {
    match args {
        [source, pattern, ..] if !source.is_null() && !pattern.is_null() => {
            Some((source.sql, pattern.sql))
        }
        _ => None,
    }
}

impl Dialect for SqliteDialect {
    fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    fn column_type(&self, field: &FieldDescriptor) -> String {
        let widths = &self.profile.widths;
        match field.logical_type {
            LogicalType::Boolean => String::from("BOOLEAN"),
            LogicalType::Byte | LogicalType::Short => String::from("SMALLINT"),
            LogicalType::Counter | LogicalType::Integer => String::from("INTEGER"),
            LogicalType::Long | LogicalType::Duration => String::from("BIGINT"),
            LogicalType::Currency => format!(
                "NUMERIC({},4)",
                field.size.unwrap_or(widths.currency_precision)
            ),
            LogicalType::Decimal => match (field.size, field.scale) {
                (Some(size), Some(scale)) => format!("NUMERIC({size},{scale})"),
                (Some(size), None) => format!("NUMERIC({size})"),
                _ => String::from("NUMERIC"),
            },
            LogicalType::Date | LogicalType::DateTime => String::from("DATETIME"),
            LogicalType::Time => String::from("TIME"),
            LogicalType::Url | LogicalType::Text | LogicalType::Note => {
                format!("NVARCHAR({})", field.size.unwrap_or(widths.text))
            }
            LogicalType::Image | LogicalType::Binary => String::from("BLOB"),
            LogicalType::Guid => String::from("VARCHAR(36)"),
            LogicalType::Number | LogicalType::Float | LogicalType::Other(_) => {
                String::from("REAL")
            }
        }
    }

    fn compile_function(&self, function: ScalarFunction, args: &[FunctionArg<'_>]) -> String {
        let arg = |i: usize| args.get(i).map_or("NULL", |a| a.sql);
        match function {
            ScalarFunction::IndexOf => format!("(INSTR({},{})-1)", arg(0), arg(1)),
            ScalarFunction::Concat => format!("({} || {})", arg(0), arg(1)),
            ScalarFunction::Substring => {
                let start = match args.get(1).and_then(FunctionArg::as_i64) {
                    Some(start) => start.saturating_add(1).to_string(),
                    None => format!("({})+1", arg(1)),
                };
                match args.get(2) {
                    Some(length) => format!("SUBSTR({},{start},{})", arg(0), length.sql),
                    None => format!("SUBSTR({},{start})", arg(0)),
                }
            }
            ScalarFunction::Length => format!("LENGTH({})", arg(0)),
            ScalarFunction::Ceiling => {
                let a = arg(0);
                format!("(CAST({a} AS INTEGER) + ({a} > CAST({a} AS INTEGER)))")
            }
            ScalarFunction::Floor => {
                let a = arg(0);
                format!("(CAST({a} AS INTEGER) - ({a} < CAST({a} AS INTEGER)))")
            }
            ScalarFunction::Round => match args.get(1) {
                Some(digits) => format!("ROUND({},{})", arg(0), digits.sql),
                None => format!("ROUND({})", arg(0)),
            },
            ScalarFunction::ToLower => format!("LOWER({})", arg(0)),
            ScalarFunction::ToUpper => format!("UPPER({})", arg(0)),
            ScalarFunction::Trim => format!("TRIM({})", arg(0)),
            ScalarFunction::StartsWith => text_operands(args)
                .map(|(a, b)| format!("(INSTR({a},{b}) = 1)"))
                .unwrap_or_default(),
            ScalarFunction::Contains => text_operands(args)
                .map(|(a, b)| format!("(INSTR({a},{b}) > 0)"))
                .unwrap_or_default(),
            ScalarFunction::EndsWith => text_operands(args)
                .map(|(a, b)| format!("(SUBSTR({a},-LENGTH({b})) = {b})"))
                .unwrap_or_default(),
            ScalarFunction::Day => strftime(args.first(), "%d"),
            ScalarFunction::Month => strftime(args.first(), "%m"),
            ScalarFunction::Year => strftime(args.first(), "%Y"),
            ScalarFunction::Hour => strftime(args.first(), "%H"),
            ScalarFunction::Minute => strftime(args.first(), "%M"),
            ScalarFunction::Second => strftime(args.first(), "%S"),
            ScalarFunction::DateOnly => format!("DATE({})", arg(0)),
        }
    }

    fn compile_pagination(&self, sql: &str, skip: Option<u64>, take: Option<u64>) -> String {
        match (skip, take) {
            (None, None) => String::from(sql),
            (None, Some(take)) => format!("{sql} LIMIT {take}"),
            (Some(skip), None) => format!("{sql} LIMIT -1 OFFSET {skip}"),
            (Some(skip), Some(take)) => format!("{sql} LIMIT {take} OFFSET {skip}"),
        }
    }

    fn table_exists_query(&self, name: &QualifiedName) -> BoundQuery {
        self.object_exists("table", name)
    }

    fn view_exists_query(&self, name: &QualifiedName) -> BoundQuery {
        self.object_exists("view", name)
    }

    fn columns_query(&self, name: &QualifiedName) -> BoundQuery {
        let mut params = vec![SqlValue::Text(name.name.clone())];
        let source = match &name.schema {
            Some(schema) => {
                params.push(SqlValue::Text(schema.clone()));
                "pragma_table_info(?, ?)"
            }
            None => "pragma_table_info(?)",
        };
        (
            format!(
                "SELECT name AS \"name\", type AS \"type\", cid AS \"ordinal\", \
                 NULL AS \"size\", NULL AS \"precision\", NULL AS \"scale\", \
                 CASE WHEN \"notnull\" = 0 THEN 1 ELSE 0 END AS \"nullable\", \
                 CASE WHEN pk > 0 THEN 1 ELSE 0 END AS \"primary\" \
                 FROM {source} ORDER BY cid"
            ),
            params,
        )
    }

    fn sequence_exists_query(&self, _name: &QualifiedName) -> BoundQuery {
        (String::from("SELECT 0 AS \"count\""), Vec::new())
    }

    fn add_columns_sql(&self, table: &QualifiedName, fields: &[FieldDescriptor]) -> Vec<String> {
        let table = self.qualified_identifier(table);
        fields
            .iter()
            .map(|f| format!("ALTER TABLE {table} ADD COLUMN {}", self.column_definition(f)))
            .collect()
    }

    /// SQLite cannot change a column in place; the reconciler rejects
    /// changes on this dialect before asking for statements.
    fn change_columns_sql(
        &self,
        _table: &QualifiedName,
        _fields: &[FieldDescriptor],
        _live: &[ColumnMetadata],
    ) -> Vec<String> {
        Vec::new()
    }

    fn next_value_sql(&self, _sequence: &QualifiedName) -> Option<String> {
        None
    }
}
