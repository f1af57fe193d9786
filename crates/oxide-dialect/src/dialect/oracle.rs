//! Oracle dialect.
//!
//! Oracle has no `LIMIT`, so pagination filters on `ROWNUM`. Scalar selects
//! need `FROM DUAL`, booleans are `NUMBER(1,0)` and text predicates compile
//! to `REGEXP_LIKE`.

use chrono::{DateTime, FixedOffset};

use super::{
    local_timestamp, nullability_change, nullability_clause, BoundQuery, Dialect, FunctionArg,
};
use crate::field::{ColumnMetadata, FieldDescriptor, LogicalType};
use crate::name::QualifiedName;
use crate::profile::DialectProfile;
use crate::query::ScalarFunction;
use crate::value::SqlValue;

const PRIMARY_KEYS: &str = "SELECT cols.TABLE_NAME, cols.COLUMN_NAME, cols.OWNER, cons.CONSTRAINT_TYPE \
    FROM ALL_CONSTRAINTS cons, ALL_CONS_COLUMNS cols WHERE cons.CONSTRAINT_TYPE = 'P' \
    AND cons.CONSTRAINT_NAME = cols.CONSTRAINT_NAME AND cons.OWNER = cols.OWNER";

/// Oracle dialect.
#[derive(Debug, Clone)]
pub struct OracleDialect {
    profile: DialectProfile,
}

impl OracleDialect {
    /// Creates a dialect for current Oracle releases.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_profile(DialectProfile::oracle())
    }

    /// Creates a dialect matching the legacy adapter revision.
    #[must_use]
    pub const fn legacy() -> Self {
        Self::with_profile(DialectProfile::oracle_legacy())
    }

    /// Creates a dialect with a custom profile.
    #[must_use]
    pub const fn with_profile(profile: DialectProfile) -> Self {
        Self { profile }
    }

    /// Binds the object name and appends an owner filter when the name
    /// carries a schema.
    fn lookup(&self, sql: String, owner_column: &str, name: &QualifiedName) -> BoundQuery {
        let mut params = vec![SqlValue::Text(name.name.clone())];
        let mut sql = sql;
        if let Some(schema) = &name.schema {
            sql.push_str(&format!(
                " AND UPPER({owner_column}) = UPPER({})",
                self.placeholder(2)
            ));
            params.push(SqlValue::Text(schema.clone()));
        }
        (sql, params)
    }

    fn object_exists(&self, object_type: &str, name: &QualifiedName) -> BoundQuery {
        let sql = format!(
            "SELECT COUNT(*) AS \"count\" FROM ALL_OBJECTS WHERE OBJECT_TYPE IN ('{object_type}') AND OBJECT_NAME = {}",
            self.placeholder(1)
        );
        self.lookup(sql, "OWNER", name)
    }

    /// `REGEXP_LIKE(a, '<prefix>pattern<suffix>')`, escaping literal
    /// patterns so they match verbatim.
    fn regexp_like(&self, args: &[FunctionArg<'_>], prefix: &str, suffix: &str) -> String {
        let [source, pattern, ..] = args else {
            return String::new();
        };
        if source.is_null() || pattern.is_null() {
            return String::new();
        }
        let pattern = match pattern.as_text() {
            Some(text) => {
                let literal = SqlValue::Text(format!("{prefix}{}{suffix}", regex::escape(text)));
                self.escape(&literal, false)
            }
            None => {
                let mut parts = Vec::new();
                if !prefix.is_empty() {
                    parts.push(format!("'{prefix}'"));
                }
                parts.push(String::from(pattern.sql));
                if !suffix.is_empty() {
                    parts.push(format!("'{suffix}'"));
                }
                parts.join(" || ")
            }
        };
        format!("REGEXP_LIKE({}, {pattern})", source.sql)
    }
}

impl Default for OracleDialect {
    fn default() -> Self {
        Self::new()
    }
}

fn to_char_number(arg: &FunctionArg<'_>, format: &str) -> String {
    format!("CAST(TO_CHAR({},'{format}') AS NUMBER)", arg.sql)
}

impl Dialect for OracleDialect {
    fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    fn column_type(&self, field: &FieldDescriptor) -> String {
        let widths = &self.profile.widths;
        match field.logical_type {
            LogicalType::Boolean | LogicalType::Byte => String::from("NUMBER(1,0)"),
            LogicalType::Counter => integral(widths.integer_precision),
            LogicalType::Currency => format!(
                "NUMBER({},4)",
                field.size.unwrap_or(widths.currency_precision)
            ),
            LogicalType::Decimal => match (field.size, field.scale) {
                (Some(size), Some(0) | None) => integral(size),
                (Some(size), Some(scale)) => format!("NUMBER({size},{scale})"),
                _ => String::from("NUMBER"),
            },
            LogicalType::Date | LogicalType::DateTime => String::from("TIMESTAMP WITH TIME ZONE"),
            LogicalType::Long | LogicalType::Duration => integral(widths.long_precision),
            LogicalType::Integer => integral(field.size.unwrap_or(widths.integer_precision)),
            LogicalType::Url | LogicalType::Text | LogicalType::Note => {
                format!("NVARCHAR2({})", field.size.unwrap_or(widths.text))
            }
            LogicalType::Image | LogicalType::Binary => String::from("BLOB"),
            LogicalType::Guid => String::from("VARCHAR2(36)"),
            LogicalType::Short => String::from("NUMBER(2,0)"),
            LogicalType::Number
            | LogicalType::Float
            | LogicalType::Time
            | LogicalType::Other(_) => String::from("NUMBER"),
        }
    }

    fn reconstruct_type(&self, column: &ColumnMetadata) -> String {
        let data_type = column.data_type.trim().to_uppercase();
        let base = match data_type.as_str() {
            "NUMBER" => match (column.precision, column.scale) {
                (Some(p), Some(s)) if s > 0 => format!("NUMBER({p},{s})"),
                (Some(p), _) => integral(p),
                (None, _) => String::from("NUMBER"),
            },
            "NVARCHAR2" | "VARCHAR2" | "NCHAR" | "CHAR" => match column.size {
                Some(size) => format!("{data_type}({size})"),
                None => data_type,
            },
            other if other.starts_with("TIMESTAMP") && other.ends_with("WITH TIME ZONE") => {
                String::from("TIMESTAMP WITH TIME ZONE")
            }
            _ => data_type,
        };
        format!("{base}{}", nullability_clause(column))
    }

    fn timestamp_literal(&self, value: &DateTime<FixedOffset>) -> String {
        format!(
            "TO_TIMESTAMP_TZ('{}','YYYY-MM-DD HH24:MI:SS.FF3TZH:TZM')",
            local_timestamp(value)
        )
    }

    fn compile_function(&self, function: ScalarFunction, args: &[FunctionArg<'_>]) -> String {
        let arg = |i: usize| args.get(i).map_or("NULL", |a| a.sql);
        match function {
            ScalarFunction::IndexOf => format!("(INSTR({},{})-1)", arg(0), arg(1)),
            ScalarFunction::Concat => format!("CONCAT({},{})", arg(0), arg(1)),
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
            ScalarFunction::Ceiling => format!("CEIL({})", arg(0)),
            ScalarFunction::Floor => format!("FLOOR({})", arg(0)),
            ScalarFunction::Round => match args.get(1) {
                Some(digits) => format!("ROUND({},{})", arg(0), digits.sql),
                None => format!("ROUND({})", arg(0)),
            },
            ScalarFunction::ToLower => format!("LOWER({})", arg(0)),
            ScalarFunction::ToUpper => format!("UPPER({})", arg(0)),
            ScalarFunction::Trim => format!("TRIM({})", arg(0)),
            ScalarFunction::StartsWith => self.regexp_like(args, "^", ""),
            ScalarFunction::Contains => self.regexp_like(args, "", ""),
            ScalarFunction::EndsWith => self.regexp_like(args, "", "$"),
            ScalarFunction::Day => args.first().map_or_else(String::new, |a| to_char_number(a, "DD")),
            ScalarFunction::Month => args.first().map_or_else(String::new, |a| to_char_number(a, "MM")),
            ScalarFunction::Year => args.first().map_or_else(String::new, |a| to_char_number(a, "YYYY")),
            ScalarFunction::Hour => args.first().map_or_else(String::new, |a| to_char_number(a, "HH24")),
            ScalarFunction::Minute => args.first().map_or_else(String::new, |a| to_char_number(a, "MI")),
            ScalarFunction::Second => args.first().map_or_else(String::new, |a| to_char_number(a, "SS")),
            ScalarFunction::DateOnly => format!(
                "TO_TIMESTAMP_TZ(TO_CHAR({}, 'YYYY-MM-DD'),'YYYY-MM-DD')",
                arg(0)
            ),
        }
    }

    fn table_exists_query(&self, name: &QualifiedName) -> BoundQuery {
        self.object_exists("TABLE", name)
    }

    fn view_exists_query(&self, name: &QualifiedName) -> BoundQuery {
        self.object_exists("VIEW", name)
    }

    fn columns_query(&self, name: &QualifiedName) -> BoundQuery {
        let sql = format!(
            "SELECT c0.COLUMN_NAME AS \"name\", c0.DATA_TYPE AS \"type\", c0.COLUMN_ID AS \"ordinal\", \
             c0.CHAR_LENGTH AS \"size\", c0.DATA_PRECISION AS \"precision\", c0.DATA_SCALE AS \"scale\", \
             CASE WHEN c0.NULLABLE = 'Y' THEN 1 ELSE 0 END AS \"nullable\", \
             CASE WHEN t0.CONSTRAINT_TYPE = 'P' THEN 1 ELSE 0 END AS \"primary\" \
             FROM ALL_TAB_COLUMNS c0 LEFT JOIN ({PRIMARY_KEYS}) t0 ON c0.TABLE_NAME = t0.TABLE_NAME \
             AND c0.OWNER = t0.OWNER AND c0.COLUMN_NAME = t0.COLUMN_NAME WHERE c0.TABLE_NAME = {}",
            self.placeholder(1)
        );
        let (mut sql, params) = self.lookup(sql, "c0.OWNER", name);
        sql.push_str(" ORDER BY c0.COLUMN_ID");
        (sql, params)
    }

    fn sequence_exists_query(&self, name: &QualifiedName) -> BoundQuery {
        let sql = format!(
            "SELECT COUNT(*) AS \"count\" FROM ALL_SEQUENCES WHERE SEQUENCE_NAME = {}",
            self.placeholder(1)
        );
        self.lookup(sql, "SEQUENCE_OWNER", name)
    }

    fn add_columns_sql(&self, table: &QualifiedName, fields: &[FieldDescriptor]) -> Vec<String> {
        let columns = fields.iter().map(|f| self.column_definition(f)).collect();
        batched(self, "ADD", table, columns)
    }

    /// Oracle rejects a `MODIFY` that restates the current nullability, so
    /// the clause is only added when it changes.
    fn change_columns_sql(
        &self,
        table: &QualifiedName,
        fields: &[FieldDescriptor],
        live: &[ColumnMetadata],
    ) -> Vec<String> {
        let columns: Vec<String> = fields
            .iter()
            .map(|f| {
                let nullability = match nullability_change(f, live) {
                    Some(true) => " NULL",
                    Some(false) => " NOT NULL",
                    None => "",
                };
                format!(
                    "{} {}{nullability}",
                    self.escape_identifier(&f.name),
                    self.column_type(f)
                )
            })
            .collect();
        batched(self, "MODIFY", table, columns)
    }

    fn next_value_sql(&self, sequence: &QualifiedName) -> Option<String> {
        Some(format!(
            "SELECT {}.NEXTVAL AS \"value\" FROM DUAL",
            self.qualified_identifier(sequence)
        ))
    }
}

/// Integral `NUMBER` of precision `p`. One- and two-digit columns keep an
/// explicit zero scale, wider ones drop it; introspection reconstructs the
/// same text.
fn integral(p: impl Into<i64>) -> String {
    let p = p.into();
    if p <= 2 {
        format!("NUMBER({p},0)")
    } else {
        format!("NUMBER({p})")
    }
}

/// `ALTER TABLE t <clause> (col1 ..., col2 ...)`, one statement per table.
fn batched(
    dialect: &OracleDialect,
    clause: &str,
    table: &QualifiedName,
    columns: Vec<String>,
) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }
    vec![format!(
        "ALTER TABLE {} {clause} ({})",
        dialect.qualified_identifier(table),
        columns.join(", ")
    )]
}
