//! PostgreSQL dialect.

use chrono::{DateTime, FixedOffset};

use super::{
    local_timestamp, nullability_change, nullability_clause, BoundQuery, Dialect, FunctionArg,
};
use crate::field::{ColumnMetadata, FieldDescriptor, LogicalType};
use crate::name::QualifiedName;
use crate::profile::DialectProfile;
use crate::query::ScalarFunction;
use crate::value::SqlValue;

/// PostgreSQL dialect.
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    profile: DialectProfile,
}

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profile: DialectProfile::postgres(),
        }
    }

    /// Binds the object name and restricts the schema column to the given
    /// schema, or to the search path when there is none.
    fn lookup(&self, sql: String, schema_column: &str, name: &QualifiedName) -> BoundQuery {
        let mut sql = sql;
        let mut params = vec![SqlValue::Text(name.name.clone())];
        match &name.schema {
            Some(schema) => {
                sql.push_str(&format!(" AND {schema_column} = {}", self.placeholder(2)));
                params.push(SqlValue::Text(schema.clone()));
            }
            None => sql.push_str(&format!(
                " AND {schema_column} = ANY(current_schemas(false))"
            )),
        }
        (sql, params)
    }

    fn regex_match(&self, args: &[FunctionArg<'_>], prefix: &str, suffix: &str) -> String {
        let [source, pattern, ..] = args else {
            return String::new();
        };
        if source.is_null() || pattern.is_null() {
            return String::new();
        }
        let pattern = match pattern.as_text() {
            Some(text) => self.escape(
                &SqlValue::Text(format!("{prefix}{}{suffix}", regex::escape(text))),
                false,
            ),
            None => format!("'{prefix}' || {} || '{suffix}'", pattern.sql),
        };
        format!("({} ~ {pattern})", source.sql)
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

fn extract(arg: Option<&FunctionArg<'_>>, field: &str) -> String {
    let sql = arg.map_or("NULL", |a| a.sql);
    format!("CAST(EXTRACT({field} FROM {sql}) AS INTEGER)")
}

impl Dialect for PostgresDialect {
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
                (Some(size), None) => format!("NUMERIC({size},0)"),
                _ => String::from("NUMERIC"),
            },
            LogicalType::Date | LogicalType::DateTime => {
                String::from("TIMESTAMP WITH TIME ZONE")
            }
            LogicalType::Time => String::from("TIME WITHOUT TIME ZONE"),
            LogicalType::Url | LogicalType::Text | LogicalType::Note => format!(
                "CHARACTER VARYING({})",
                field.size.unwrap_or(widths.text)
            ),
            LogicalType::Image | LogicalType::Binary => String::from("BYTEA"),
            LogicalType::Guid => String::from("CHARACTER VARYING(36)"),
            LogicalType::Number | LogicalType::Float | LogicalType::Other(_) => {
                String::from("DOUBLE PRECISION")
            }
        }
    }

    /// The columns query reports `format_type()` output, which already
    /// carries the modifiers.
    fn reconstruct_type(&self, column: &ColumnMetadata) -> String {
        format!(
            "{}{}",
            column.data_type.trim().to_uppercase(),
            nullability_clause(column)
        )
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn timestamp_literal(&self, value: &DateTime<FixedOffset>) -> String {
        format!("TIMESTAMP WITH TIME ZONE '{}'", local_timestamp(value))
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        format!("'\\x{hex}'::bytea")
    }

    fn compile_function(&self, function: ScalarFunction, args: &[FunctionArg<'_>]) -> String {
        let arg = |i: usize| args.get(i).map_or("NULL", |a| a.sql);
        match function {
            ScalarFunction::IndexOf => format!("(POSITION({} IN {})-1)", arg(1), arg(0)),
            ScalarFunction::Concat => format!("CONCAT({},{})", arg(0), arg(1)),
            ScalarFunction::Substring => {
                let start = match args.get(1).and_then(FunctionArg::as_i64) {
                    Some(start) => start.saturating_add(1).to_string(),
                    None => format!("({})+1", arg(1)),
                };
                match args.get(2) {
                    Some(length) => {
                        format!("SUBSTRING({} FROM {start} FOR {})", arg(0), length.sql)
                    }
                    None => format!("SUBSTRING({} FROM {start})", arg(0)),
                }
            }
            ScalarFunction::Length => format!("LENGTH({})", arg(0)),
            ScalarFunction::Ceiling => format!("CEILING({})", arg(0)),
            ScalarFunction::Floor => format!("FLOOR({})", arg(0)),
            ScalarFunction::Round => match args.get(1) {
                Some(digits) => format!("ROUND({},{})", arg(0), digits.sql),
                None => format!("ROUND({})", arg(0)),
            },
            ScalarFunction::ToLower => format!("LOWER({})", arg(0)),
            ScalarFunction::ToUpper => format!("UPPER({})", arg(0)),
            ScalarFunction::Trim => format!("TRIM({})", arg(0)),
            ScalarFunction::StartsWith => self.regex_match(args, "^", ""),
            ScalarFunction::Contains => self.regex_match(args, "", ""),
            ScalarFunction::EndsWith => self.regex_match(args, "", "$"),
            ScalarFunction::Day => extract(args.first(), "DAY"),
            ScalarFunction::Month => extract(args.first(), "MONTH"),
            ScalarFunction::Year => extract(args.first(), "YEAR"),
            ScalarFunction::Hour => extract(args.first(), "HOUR"),
            ScalarFunction::Minute => extract(args.first(), "MINUTE"),
            ScalarFunction::Second => extract(args.first(), "SECOND"),
            ScalarFunction::DateOnly => format!("CAST({} AS DATE)", arg(0)),
        }
    }

    fn table_exists_query(&self, name: &QualifiedName) -> BoundQuery {
        let sql = format!(
            "SELECT COUNT(*) AS \"count\" FROM information_schema.tables \
             WHERE table_type = 'BASE TABLE' AND table_name = {}",
            self.placeholder(1)
        );
        self.lookup(sql, "table_schema", name)
    }

    fn view_exists_query(&self, name: &QualifiedName) -> BoundQuery {
        let sql = format!(
            "SELECT COUNT(*) AS \"count\" FROM information_schema.views WHERE table_name = {}",
            self.placeholder(1)
        );
        self.lookup(sql, "table_schema", name)
    }

    fn columns_query(&self, name: &QualifiedName) -> BoundQuery {
        let sql = format!(
            "SELECT a.attname AS \"name\", format_type(a.atttypid, a.atttypmod) AS \"type\", \
             a.attnum AS \"ordinal\", NULL AS \"size\", NULL AS \"precision\", NULL AS \"scale\", \
             NOT a.attnotnull AS \"nullable\", \
             COALESCE(a.attnum = ANY(i.indkey), FALSE) AS \"primary\" \
             FROM pg_catalog.pg_attribute a \
             JOIN pg_catalog.pg_class c ON c.oid = a.attrelid \
             JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace \
             LEFT JOIN pg_catalog.pg_index i ON i.indrelid = c.oid AND i.indisprimary \
             WHERE a.attnum > 0 AND NOT a.attisdropped AND c.relname = {}",
            self.placeholder(1)
        );
        let (mut sql, params) = self.lookup(sql, "n.nspname", name);
        sql.push_str(" ORDER BY a.attnum");
        (sql, params)
    }

    fn sequence_exists_query(&self, name: &QualifiedName) -> BoundQuery {
        let sql = format!(
            "SELECT COUNT(*) AS \"count\" FROM information_schema.sequences WHERE sequence_name = {}",
            self.placeholder(1)
        );
        self.lookup(sql, "sequence_schema", name)
    }

    fn add_columns_sql(&self, table: &QualifiedName, fields: &[FieldDescriptor]) -> Vec<String> {
        if fields.is_empty() {
            return Vec::new();
        }
        let clauses: Vec<String> = fields
            .iter()
            .map(|f| format!("ADD COLUMN {}", self.column_definition(f)))
            .collect();
        vec![format!(
            "ALTER TABLE {} {}",
            self.qualified_identifier(table),
            clauses.join(", ")
        )]
    }

    fn change_columns_sql(
        &self,
        table: &QualifiedName,
        fields: &[FieldDescriptor],
        live: &[ColumnMetadata],
    ) -> Vec<String> {
        if fields.is_empty() {
            return Vec::new();
        }
        let mut clauses = Vec::new();
        for f in fields {
            let column = self.escape_identifier(&f.name);
            clauses.push(format!("ALTER COLUMN {column} TYPE {}", self.column_type(f)));
            match nullability_change(f, live) {
                Some(true) => clauses.push(format!("ALTER COLUMN {column} DROP NOT NULL")),
                Some(false) => clauses.push(format!("ALTER COLUMN {column} SET NOT NULL")),
                None => {}
            }
        }
        vec![format!(
            "ALTER TABLE {} {}",
            self.qualified_identifier(table),
            clauses.join(", ")
        )]
    }

    fn next_value_sql(&self, sequence: &QualifiedName) -> Option<String> {
        let name = self.escape(
            &SqlValue::Text(self.qualified_identifier(sequence)),
            false,
        );
        Some(format!("SELECT nextval({name}) AS \"value\""))
    }
}
