//! # oxide-dialect
//!
//! Dialect-aware type mapping and SQL compilation.
//!
//! This crate provides:
//! - A vendor-neutral data model for declared fields and introspected columns
//! - Abstract query expressions with scalar functions, aggregates and paging
//! - A [`Dialect`] strategy trait with Oracle, PostgreSQL and SQLite
//!   implementations, each driven by a [`DialectProfile`]
//! - A [`Formatter`] compiling query expressions for a dialect
//!
//! ## Type Mapping
//!
//! ```rust
//! use oxide_dialect::{Dialect, FieldDescriptor, LogicalType, OracleDialect};
//!
//! let dialect = OracleDialect::new();
//! let id = FieldDescriptor::new("id", LogicalType::Counter).primary();
//! assert_eq!(dialect.format_type(&id), "NUMBER(10) NOT NULL");
//! ```
//!
//! ## Query Compilation
//!
//! ```rust
//! use oxide_dialect::query::{field, QueryExpression};
//! use oxide_dialect::{Formatter, SqliteDialect};
//!
//! let dialect = SqliteDialect::new();
//! let query = QueryExpression::query("person")
//!     .select([field("name")])
//!     .where_clause(field("id").eq(1))
//!     .take(1);
//!
//! assert_eq!(
//!     Formatter::new(&dialect).format(&query),
//!     r#"SELECT "name" AS "name" FROM "person" WHERE "id" = 1 LIMIT 1"#
//! );
//! ```

pub mod dialect;
pub mod field;
pub mod formatter;
pub mod name;
pub mod profile;
pub mod query;
pub mod value;

pub use dialect::{Dialect, OracleDialect, PostgresDialect, SqliteDialect};
pub use field::{ColumnMetadata, FieldDescriptor, LogicalType};
pub use formatter::Formatter;
pub use name::QualifiedName;
pub use profile::{Capabilities, DialectProfile, Pagination, Placeholder, TypeWidths};
pub use query::{QueryExpression, Statement};
pub use value::{SqlValue, ToSqlValue};
