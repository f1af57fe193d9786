//! Migration history tracking.
//!
//! This module manages the `migrations` ledger table that records which
//! schema versions have been applied to each table.

use oxide_dialect::{Dialect, FieldDescriptor, LogicalType, QualifiedName, SqlValue};
use tracing::{debug, info};

use crate::adapter::DataAdapter;
use crate::connection::Connection;
use crate::error::{MigrateError, Result};
use crate::migration::SchemaMigration;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "migrations";

/// Returns the ledger's column definitions.
pub fn ledger_fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("appliesTo", LogicalType::Text)
            .size(255)
            .nullable(false),
        FieldDescriptor::new("model", LogicalType::Text).size(255),
        FieldDescriptor::new("description", LogicalType::Text).size(255),
        FieldDescriptor::new("version", LogicalType::Text)
            .size(24)
            .nullable(false),
    ]
}

/// A record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Target table as written in the migration.
    pub applies_to: String,
    /// Model name.
    pub model: Option<String>,
    /// Applied version.
    pub version: String,
    /// Description.
    pub description: Option<String>,
}

impl<C: Connection, D: Dialect> DataAdapter<C, D> {
    /// Returns the resolved ledger table name.
    pub fn ledger_table(&self) -> QualifiedName {
        QualifiedName::new(LEDGER_TABLE).or_schema(self.default_schema())
    }

    /// Returns true if the ledger table exists.
    pub async fn ledger_exists(&mut self) -> Result<bool> {
        if self.ledger_ready {
            return Ok(true);
        }
        let ledger = self.ledger_table();
        self.table(&ledger.to_string()).exists().await
    }

    /// Creates the ledger table if it does not exist.
    ///
    /// The result is cached on the adapter. When creation fails but the
    /// table exists afterwards, another process created it concurrently and
    /// [`MigrateError::Race`] is returned.
    pub async fn ensure_ledger(&mut self) -> Result<()> {
        if self.ledger_ready {
            return Ok(());
        }
        let ledger = self.ledger_table();
        if !self.ledger_exists().await? {
            let sql = self.dialect().create_table_sql(&ledger, &ledger_fields());
            if let Err(err) = self.execute(sql, &[]).await {
                if self.ledger_exists().await? {
                    return Err(MigrateError::Race(format!(
                        "ledger table {ledger} was created concurrently: {err}"
                    )));
                }
                return Err(err);
            }
            info!(table = %ledger, "Created migration ledger");
        }
        self.ledger_ready = true;
        Ok(())
    }

    /// Records `migration` as applied.
    pub async fn record_version(&mut self, migration: &SchemaMigration) -> Result<()> {
        let sql = format!(
            "INSERT INTO {} ({}, {}, {}, {}) VALUES ({}, {}, {}, {})",
            self.dialect().qualified_identifier(&self.ledger_table()),
            self.dialect().escape_identifier("appliesTo"),
            self.dialect().escape_identifier("model"),
            self.dialect().escape_identifier("version"),
            self.dialect().escape_identifier("description"),
            self.dialect().placeholder(1),
            self.dialect().placeholder(2),
            self.dialect().placeholder(3),
            self.dialect().placeholder(4),
        );
        let params = [
            SqlValue::Text(migration.applies_to.clone()),
            optional_text(migration.model.as_deref()),
            SqlValue::Text(migration.version.clone()),
            optional_text(migration.description.as_deref()),
        ];
        self.execute(sql, &params).await?;
        debug!(
            table = %migration.applies_to,
            version = %migration.version,
            "Recorded migration"
        );
        Ok(())
    }

    /// Returns the ledger entries for `applies_to`, oldest first.
    pub async fn ledger_entries(&mut self, applies_to: &str) -> Result<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT {0} AS {0}, {1} AS {1}, {2} AS {2}, {3} AS {3} FROM {4} WHERE {0} = {5}",
            self.dialect().escape_identifier("appliesTo"),
            self.dialect().escape_identifier("model"),
            self.dialect().escape_identifier("version"),
            self.dialect().escape_identifier("description"),
            self.dialect().qualified_identifier(&self.ledger_table()),
            self.dialect().placeholder(1),
        );
        let rows = self
            .execute(sql, &[SqlValue::Text(String::from(applies_to))])
            .await?;
        rows.iter()
            .map(|row| {
                let version = row.get_str("version").ok_or_else(|| {
                    MigrateError::InvalidState(format!("ledger row for {applies_to} has no version"))
                })?;
                Ok(LedgerEntry {
                    applies_to: String::from(row.get_str("appliesTo").unwrap_or(applies_to)),
                    model: row.get_str("model").map(String::from),
                    version: String::from(version),
                    description: row.get_str("description").map(String::from),
                })
            })
            .collect()
    }
}

fn optional_text(value: Option<&str>) -> SqlValue {
    value.map_or(SqlValue::Null, |v| SqlValue::Text(String::from(v)))
}
