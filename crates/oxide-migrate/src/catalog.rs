//! Catalog introspection for tables and views.

use futures::FutureExt;
use oxide_dialect::{ColumnMetadata, Dialect, QualifiedName, QueryExpression};
use tracing::{debug, info};

use crate::adapter::{count_of, DataAdapter};
use crate::connection::{Connection, Row};
use crate::error::{MigrateError, Result};
use crate::migration::Version;

/// Version reported for tables without ledger entries.
pub const INITIAL_VERSION: &str = "0.0";

/// Introspects one table.
pub struct TableCatalog<'a, C, D> {
    adapter: &'a mut DataAdapter<C, D>,
    applies_to: String,
    name: QualifiedName,
}

impl<'a, C: Connection, D: Dialect> TableCatalog<'a, C, D> {
    pub(crate) fn new(adapter: &'a mut DataAdapter<C, D>, name: &str) -> Self {
        let qualified = adapter.qualify(name);
        Self {
            adapter,
            applies_to: String::from(name),
            name: qualified,
        }
    }

    /// Returns the resolved table name.
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Returns true if the table exists.
    pub async fn exists(&mut self) -> Result<bool> {
        let query = self.adapter.dialect().table_exists_query(&self.name);
        let rows = self.adapter.execute_bound(query).await?;
        Ok(count_of(&rows)? > 0)
    }

    /// Returns the table's columns in ordinal order.
    pub async fn columns(&mut self) -> Result<Vec<ColumnMetadata>> {
        let query = self.adapter.dialect().columns_query(&self.name);
        let rows = self.adapter.execute_bound(query).await?;
        rows.iter().map(column_from_row).collect()
    }

    /// Returns true if the sequence `<table>_seq` exists.
    pub async fn has_sequence(&mut self) -> Result<bool> {
        let sequence = self.name.sibling(format!("{}_seq", self.name.name));
        let query = self.adapter.dialect().sequence_exists_query(&sequence);
        let rows = self.adapter.execute_bound(query).await?;
        Ok(count_of(&rows)? > 0)
    }

    /// Returns the highest version the ledger records for this table, or
    /// `"0.0"` when there is none.
    pub async fn version(&mut self) -> Result<String> {
        if !self.adapter.ledger_exists().await? {
            return Ok(String::from(INITIAL_VERSION));
        }
        let entries = self.adapter.ledger_entries(&self.applies_to).await?;
        let version = Version::max_of(entries.iter().map(|entry| entry.version.as_str()))
            .map_or_else(|| String::from(INITIAL_VERSION), |v| v.to_string());
        debug!(table = %self.name, version = %version, "Resolved table version");
        Ok(version)
    }
}

/// Introspects and manages one view.
pub struct ViewCatalog<'a, C, D> {
    adapter: &'a mut DataAdapter<C, D>,
    name: QualifiedName,
}

impl<'a, C: Connection, D: Dialect> ViewCatalog<'a, C, D> {
    pub(crate) fn new(adapter: &'a mut DataAdapter<C, D>, name: &str) -> Self {
        let name = adapter.qualify(name);
        Self { adapter, name }
    }

    /// Returns the resolved view name.
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// Returns true if the view exists.
    pub async fn exists(&mut self) -> Result<bool> {
        let query = self.adapter.dialect().view_exists_query(&self.name);
        let rows = self.adapter.execute_bound(query).await?;
        Ok(count_of(&rows)? > 0)
    }

    /// Drops the view. Does nothing when it does not exist.
    #[allow(clippy::should_implement_trait)]
    pub async fn drop(&mut self) -> Result<()> {
        if !self.exists().await? {
            return Ok(());
        }
        let sql = self.adapter.dialect().drop_view_sql(&self.name);
        self.adapter.execute(sql, &[]).await?;
        info!(view = %self.name, "Dropped view");
        Ok(())
    }

    /// Replaces the view with `query`, dropping any previous definition in
    /// the same transaction.
    pub async fn create(&mut self, query: &QueryExpression) -> Result<()> {
        let name = self.name.clone();
        let select = self.adapter.formatter().format(query);
        self.adapter
            .execute_in_transaction(|adapter| {
                async move {
                    let mut view = ViewCatalog {
                        adapter,
                        name: name.clone(),
                    };
                    view.drop().await?;
                    let sql = view.adapter.dialect().create_view_sql(&name, &select);
                    view.adapter.execute(sql, &[]).await?;
                    info!(view = %name, "Created view");
                    Ok::<_, MigrateError>(())
                }
                .boxed()
            })
            .await
    }
}

fn column_from_row(row: &Row) -> Result<ColumnMetadata> {
    let name = row
        .get_str("name")
        .ok_or_else(|| MigrateError::InvalidState(String::from("column row without a name")))?;
    let data_type = row.get_str("type").ok_or_else(|| {
        MigrateError::InvalidState(format!("column {name} reported without a type"))
    })?;
    Ok(ColumnMetadata {
        name: String::from(name),
        data_type: String::from(data_type),
        ordinal: row.get_i64("ordinal"),
        size: row.get_i64("size"),
        scale: row.get_i64("scale"),
        precision: row.get_i64("precision"),
        nullable: row.get_bool("nullable").unwrap_or(true),
        primary: row.get_bool("primary").unwrap_or(false),
    })
}
