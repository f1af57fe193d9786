//! Schema reconciliation for Rust.
//!
//! `oxide-migrate` brings database tables to the shape a migration declares,
//! records every applied version in a ledger table, and hands out identity
//! values. All SQL is produced by an `oxide-dialect` [`Dialect`], so the same
//! migration runs against Oracle, PostgreSQL or SQLite.
//!
//! # Architecture
//!
//! - **Connection** - The backend seam: statements, parameters, transactions
//! - **DataAdapter** - Statement execution and scoped transactions
//! - **Catalog** - Table and view introspection
//! - **Reconciler** - Create or alter a table from a [`SchemaMigration`]
//! - **History** - The `migrations` ledger
//! - **Identity** - Native sequences or the `increment_id` counter table
//!
//! # Example
//!
//! ```rust,no_run
//! use oxide_dialect::{FieldDescriptor, LogicalType, SqliteDialect};
//! use oxide_migrate::prelude::*;
//!
//! # async fn run() -> oxide_migrate::Result<()> {
//! let connection = SqliteConnection::connect("sqlite:app.db").await?;
//! let mut adapter = DataAdapter::new(connection, SqliteDialect::new());
//!
//! let mut migration = SchemaMigration::new("person", "1.0")
//!     .model("Person")
//!     .add(FieldDescriptor::new("id", LogicalType::Counter).primary())
//!     .add(FieldDescriptor::new("name", LogicalType::Text).size(100));
//!
//! let outcome = adapter.migrate(&mut migration).await?;
//! assert_eq!(outcome.status, MigrationStatus::Created);
//!
//! let id = adapter.next_identity("person", "id").await?;
//! assert_eq!(id, 1);
//! adapter.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! [`Dialect`]: oxide_dialect::Dialect

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod history;
pub mod identity;
pub mod migration;
pub mod reconcile;
pub mod sqlite;

pub use adapter::DataAdapter;
pub use catalog::{TableCatalog, ViewCatalog, INITIAL_VERSION};
pub use config::ConnectOptions;
pub use connection::{Connection, Row};
pub use error::{MigrateError, Result};
pub use history::{LedgerEntry, LEDGER_TABLE};
pub use identity::{IdentityStrategy, IDENTITY_TABLE};
pub use migration::{MigrationOutcome, MigrationStatus, SchemaMigration, Version};
pub use reconcile::reconcile_fields;
pub use sqlite::SqliteConnection;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::adapter::DataAdapter;
    pub use crate::config::ConnectOptions;
    pub use crate::connection::{Connection, Row};
    pub use crate::error::{MigrateError, Result};
    pub use crate::identity::IdentityStrategy;
    pub use crate::migration::{MigrationOutcome, MigrationStatus, SchemaMigration, Version};
    pub use crate::sqlite::SqliteConnection;
}
