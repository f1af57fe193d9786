//! SQL dialects.
//!
//! A [`Dialect`] owns everything that differs between backends: the logical
//! type mapping, literal and identifier escaping, scalar-function
//! translation, pagination, catalog introspection queries and DDL. Shared
//! behavior lives in default methods driven by the dialect's
//! [`DialectProfile`].

mod oracle;
mod postgres;
mod sqlite;

pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use chrono::{DateTime, FixedOffset, Local};

use crate::field::{ColumnMetadata, FieldDescriptor};
use crate::name::QualifiedName;
use crate::profile::{DialectProfile, Pagination};
use crate::query::ScalarFunction;
use crate::value::SqlValue;

/// Layout of timestamp literals, always rendered in the local offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f%:z";

/// Name of the pseudo-column row-number pagination filters on.
pub const ROW_INDEX_COLUMN: &str = "__RowIndex";

/// A SQL statement together with its positional parameters.
pub type BoundQuery = (String, Vec<SqlValue>);

/// A compiled function argument.
#[derive(Debug, Clone, Copy)]
pub struct FunctionArg<'a> {
    /// The argument rendered as SQL.
    pub sql: &'a str,
    /// The literal value, when the argument is a constant.
    pub literal: Option<&'a SqlValue>,
}

impl FunctionArg<'_> {
    /// Returns true if the argument is a NULL literal.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.literal.is_some_and(SqlValue::is_null)
    }

    /// Returns the argument as an integer constant.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.literal.and_then(SqlValue::as_i64)
    }

    /// Returns the argument as a text constant.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.literal.and_then(SqlValue::as_str)
    }
}

/// Trait for backend-specific SQL generation.
///
/// Catalog queries return `(sql, params)` pairs using the dialect's
/// placeholder style. Column queries must alias their output as `name`,
/// `type`, `ordinal`, `size`, `precision`, `scale`, `nullable` and `primary`;
/// existence queries as `count`; next-value queries as `value`.
pub trait Dialect: Send + Sync {
    /// Returns the dialect profile.
    fn profile(&self) -> &DialectProfile;

    /// Returns the dialect name.
    fn name(&self) -> &'static str {
        self.profile().name
    }

    // Type mapping

    /// Maps a field to its column type, without nullability.
    fn column_type(&self, field: &FieldDescriptor) -> String;

    /// Returns the canonical type string of a field: its column type plus
    /// the nullability clause.
    fn format_type(&self, field: &FieldDescriptor) -> String {
        let nullability = if field.accepts_null() {
            " NULL"
        } else {
            " NOT NULL"
        };
        format!("{}{nullability}", self.column_type(field))
    }

    /// Rebuilds the canonical type string of an introspected column so it
    /// can be compared with [`Dialect::format_type`].
    fn reconstruct_type(&self, column: &ColumnMetadata) -> String {
        format!(
            "{}{}",
            column.data_type.trim().to_uppercase(),
            nullability_clause(column)
        )
    }

    // Escaping

    /// Quotes an identifier. Dotted names are quoted per component and
    /// already-quoted components are left as they are.
    fn escape_identifier(&self, name: &str) -> String {
        let quote = self.profile().identifier_quote;
        name.split('.')
            .map(|part| {
                let quoted = part.len() >= 2 && part.starts_with(quote) && part.ends_with(quote);
                if part == "*" || quoted {
                    String::from(part)
                } else {
                    format!("{quote}{part}{quote}")
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quotes a possibly schema-qualified object name.
    fn qualified_identifier(&self, name: &QualifiedName) -> String {
        match &name.schema {
            Some(schema) => format!(
                "{}.{}",
                self.escape_identifier(schema),
                self.escape_identifier(&name.name)
            ),
            None => self.escape_identifier(&name.name),
        }
    }

    /// Renders a value as a SQL literal. `unquoted` omits the quotes around
    /// text so the result can be spliced into another literal.
    fn escape(&self, value: &SqlValue, unquoted: bool) -> String {
        match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(b) => String::from(self.boolean_literal(*b)),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) if f.is_finite() => f.to_string(),
            SqlValue::Float(_) => String::from("NULL"),
            SqlValue::Text(s) => {
                let escaped = self.normalize_escapes(&backslash_escape(s));
                if unquoted {
                    escaped
                } else {
                    format!("'{escaped}'")
                }
            }
            SqlValue::Blob(bytes) => self.blob_literal(bytes),
            SqlValue::Timestamp(ts) => self.timestamp_literal(ts),
        }
    }

    /// Renders a boolean literal.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    /// Renders a timestamp literal.
    fn timestamp_literal(&self, value: &DateTime<FixedOffset>) -> String {
        format!("'{}'", local_timestamp(value))
    }

    /// Renders a binary literal.
    fn blob_literal(&self, bytes: &[u8]) -> String {
        let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
        format!("X'{hex}'")
    }

    /// Rewrites backslash escapes into the dialect's own quoting rules.
    fn normalize_escapes(&self, escaped: &str) -> String {
        normalize(escaped)
    }

    /// Renders the placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String {
        self.profile().placeholder.render(index)
    }

    // Compilation

    /// Translates a scalar function call. An empty result is an empty
    /// predicate and is dropped by the formatter.
    fn compile_function(&self, function: ScalarFunction, args: &[FunctionArg<'_>]) -> String;

    /// Applies `skip`/`take` to a compiled select.
    fn compile_pagination(&self, sql: &str, skip: Option<u64>, take: Option<u64>) -> String {
        match self.profile().pagination {
            Pagination::LimitOffset => match (skip, take) {
                (None, None) => String::from(sql),
                (None, Some(take)) => format!("{sql} LIMIT {take}"),
                (Some(skip), None) => format!("{sql} OFFSET {skip}"),
                (Some(skip), Some(take)) => format!("{sql} LIMIT {take} OFFSET {skip}"),
            },
            Pagination::RowNumber => {
                let range = match (skip, take) {
                    (None, None) => return String::from(sql),
                    (None, Some(take)) => format!("<= {take}"),
                    (Some(skip), None) => format!("> {skip}"),
                    (Some(skip), Some(take)) => {
                        format!(
                            "BETWEEN {} AND {}",
                            skip.saturating_add(1),
                            skip.saturating_add(take)
                        )
                    }
                };
                let index = self.escape_identifier(ROW_INDEX_COLUMN);
                format!("SELECT * FROM (SELECT t0.*, ROWNUM AS {index} FROM ({sql}) t0) WHERE {index} {range}")
            }
        }
    }

    // Catalog

    /// Counts tables named `name`.
    fn table_exists_query(&self, name: &QualifiedName) -> BoundQuery;

    /// Counts views named `name`.
    fn view_exists_query(&self, name: &QualifiedName) -> BoundQuery;

    /// Lists the columns of table `name`.
    fn columns_query(&self, name: &QualifiedName) -> BoundQuery;

    /// Counts sequences named `name`.
    fn sequence_exists_query(&self, name: &QualifiedName) -> BoundQuery;

    // DDL

    /// Renders `"name" TYPE NULL|NOT NULL`.
    fn column_definition(&self, field: &FieldDescriptor) -> String {
        format!(
            "{} {}",
            self.escape_identifier(&field.name),
            self.format_type(field)
        )
    }

    /// Generates `CREATE TABLE` for the non-relation fields, with a named
    /// primary key constraint over the primary fields.
    fn create_table_sql(&self, table: &QualifiedName, fields: &[FieldDescriptor]) -> String {
        let columns: Vec<&FieldDescriptor> = fields.iter().filter(|f| !f.is_relation()).collect();
        let mut parts: Vec<String> = columns.iter().map(|f| self.column_definition(f)).collect();

        let keys: Vec<String> = columns
            .iter()
            .filter(|f| f.primary)
            .map(|f| self.escape_identifier(&f.name))
            .collect();
        if !keys.is_empty() {
            parts.push(format!(
                "CONSTRAINT {} PRIMARY KEY ({})",
                self.escape_identifier(&format!("{}_pk", table.name)),
                keys.join(", ")
            ));
        }

        format!(
            "CREATE TABLE {} ({})",
            self.qualified_identifier(table),
            parts.join(", ")
        )
    }

    /// Generates the statements adding `fields` to an existing table.
    fn add_columns_sql(&self, table: &QualifiedName, fields: &[FieldDescriptor]) -> Vec<String>;

    /// Generates the statements changing existing columns to `fields`.
    /// `live` holds the introspected columns, so nullability is only
    /// restated where it actually changes.
    fn change_columns_sql(
        &self,
        table: &QualifiedName,
        fields: &[FieldDescriptor],
        live: &[ColumnMetadata],
    ) -> Vec<String>;

    /// Generates `CREATE SEQUENCE`.
    fn create_sequence_sql(&self, sequence: &QualifiedName) -> String {
        format!(
            "CREATE SEQUENCE {} START WITH 1 INCREMENT BY 1",
            self.qualified_identifier(sequence)
        )
    }

    /// Generates the statement advancing a sequence, returning `value`.
    /// `None` when the dialect has no sequences.
    fn next_value_sql(&self, sequence: &QualifiedName) -> Option<String>;

    /// Generates `CREATE VIEW ... AS <select>`.
    fn create_view_sql(&self, view: &QualifiedName, select: &str) -> String {
        format!("CREATE VIEW {} AS {select}", self.qualified_identifier(view))
    }

    /// Generates `DROP VIEW`.
    fn drop_view_sql(&self, view: &QualifiedName) -> String {
        format!("DROP VIEW {}", self.qualified_identifier(view))
    }
}

/// Renders a timestamp in the local offset using [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn local_timestamp(value: &DateTime<FixedOffset>) -> String {
    value
        .with_timezone(&Local)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// `" NOT NULL"` for primary or non-nullable columns, `" NULL"` otherwise.
#[must_use]
pub fn nullability_clause(column: &ColumnMetadata) -> &'static str {
    if column.primary || !column.nullable {
        " NOT NULL"
    } else {
        " NULL"
    }
}

/// The nullability `field` asks for when its live column accepts nulls
/// differently, `None` when it already matches. Columns missing from `live`
/// always report their nullability.
#[must_use]
pub fn nullability_change(field: &FieldDescriptor, live: &[ColumnMetadata]) -> Option<bool> {
    let wanted = field.accepts_null();
    let current = live
        .iter()
        .find(|column| column.name.eq_ignore_ascii_case(&field.name))
        .map(|column| column.nullable && !column.primary);
    (current != Some(wanted)).then_some(wanted)
}

/// Escapes quotes, backslashes and control characters with backslashes.
#[must_use]
pub fn backslash_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\0' => out.push_str("\\0"),
            '\x08' => out.push_str("\\b"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

/// Rewrites backslash escapes into standard SQL quoting: `\'` becomes `''`,
/// the other escapes become their character. A trailing lone backslash is
/// kept literally.
#[must_use]
pub fn normalize(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\'') => out.push_str("''"),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\x08'),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('Z') => out.push('\x1a'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_round_trips_plain_text() {
        let input = "it's a \"quoted\" C:\\path\nline";
        assert_eq!(
            normalize(&backslash_escape(input)),
            "it''s a \"quoted\" C:\\path\nline"
        );
    }

    #[test]
    fn test_normalize_trailing_backslash() {
        assert_eq!(normalize("abc\\"), "abc\\");
        assert_eq!(normalize("\\q"), "\\q");
    }

    #[test]
    fn test_nullability_clause() {
        let mut column = ColumnMetadata {
            name: String::from("a"),
            data_type: String::from("integer"),
            ordinal: None,
            size: None,
            scale: None,
            precision: None,
            nullable: true,
            primary: false,
        };
        assert_eq!(nullability_clause(&column), " NULL");
        column.primary = true;
        assert_eq!(nullability_clause(&column), " NOT NULL");
        column.primary = false;
        column.nullable = false;
        assert_eq!(nullability_clause(&column), " NOT NULL");
    }

    #[test]
    fn test_row_number_range_saturates() {
        let sql = OracleDialect::new().compile_pagination("SELECT 1", Some(u64::MAX), Some(5));
        assert!(sql.ends_with(&format!("BETWEEN {} AND {}", u64::MAX, u64::MAX)));
    }

    #[test]
    fn test_substring_start_saturates() {
        let start = SqlValue::Int(i64::MAX);
        let args = [
            FunctionArg { sql: "\"name\"", literal: None },
            FunctionArg { sql: "9223372036854775807", literal: Some(&start) },
        ];
        assert_eq!(
            SqliteDialect::new().compile_function(ScalarFunction::Substring, &args),
            format!("SUBSTR(\"name\",{})", i64::MAX)
        );
    }

    #[test]
    fn test_nullability_change_against_live_columns() {
        let live = ColumnMetadata {
            name: String::from("NAME"),
            data_type: String::from("NVARCHAR2"),
            ordinal: None,
            size: Some(100),
            scale: None,
            precision: None,
            nullable: true,
            primary: false,
        };
        let field = FieldDescriptor::new("name", crate::field::LogicalType::Text);
        assert_eq!(nullability_change(&field, &[live.clone()]), None);
        assert_eq!(nullability_change(&field.clone().nullable(false), &[live]), Some(false));
        assert_eq!(nullability_change(&field, &[]), Some(true));
    }
}
