//! Schema reconciliation: bring a table to the shape a migration declares.

use oxide_dialect::{ColumnMetadata, Dialect, QualifiedName};
use tracing::{info, warn};

use crate::adapter::DataAdapter;
use crate::connection::Connection;
use crate::error::{MigrateError, Result};
use crate::migration::{MigrationOutcome, MigrationStatus, SchemaMigration, Version};

/// Prunes `migration` against the live `columns` of its table.
///
/// - `remove`: entries that are not live columns or are primary are dropped.
/// - `change`: entries without a live column move to `add`; primary entries
///   and entries whose type already matches are dropped.
/// - `add`: entries matching a primary column or a column of the same type
///   are dropped; entries whose type differs move to `change`.
///
/// Relation fields never survive. Types are compared as canonical strings
/// ([`Dialect::format_type`] against [`Dialect::reconstruct_type`]).
pub fn reconcile_fields(
    dialect: &dyn Dialect,
    migration: &mut SchemaMigration,
    columns: &[ColumnMetadata],
) {
    let find = |name: &str| columns.iter().find(|column| column.name == name);

    migration
        .remove
        .retain(|field| find(&field.name).is_some_and(|column| !column.primary));

    let mut missing = Vec::new();
    migration.change.retain(|field| {
        if field.is_relation() {
            return false;
        }
        match find(&field.name) {
            None => {
                missing.push(field.clone());
                false
            }
            Some(column) if column.primary => false,
            Some(column) => dialect.format_type(field) != dialect.reconstruct_type(column),
        }
    });
    migration.add.extend(missing);

    let mut differing = Vec::new();
    migration.add.retain(|field| {
        if field.is_relation() {
            return false;
        }
        match find(&field.name) {
            None => true,
            Some(column) if column.primary => false,
            Some(column) if dialect.format_type(field) == dialect.reconstruct_type(column) => false,
            Some(_) => {
                differing.push(field.clone());
                false
            }
        }
    });
    for field in differing {
        if !migration.change.iter().any(|f| f.name == field.name) {
            migration.change.push(field);
        }
    }
}

impl<C: Connection, D: Dialect> DataAdapter<C, D> {
    /// Reconciles the target table with `migration` and records the version.
    ///
    /// A migration whose version is not newer than the ledger's is skipped
    /// (`updated` is set). Missing tables are created; existing tables get
    /// the columns they lack or whose type differs. Column removals are
    /// reported, never executed. Any limitation of the dialect is detected
    /// before DDL runs.
    pub async fn migrate(&mut self, migration: &mut SchemaMigration) -> Result<MigrationOutcome> {
        migration.validate()?;
        self.ensure_ledger().await?;

        let current = self.table(&migration.applies_to).version().await?;
        if Version::parse(&current) >= Version::parse(&migration.version) {
            migration.updated = true;
            info!(
                table = %migration.applies_to,
                version = %current,
                "Migration already applied"
            );
            return Ok(MigrationOutcome::new(MigrationStatus::AlreadyApplied, 0));
        }

        let table = self.qualify(&migration.applies_to);
        let exists = self.table(&migration.applies_to).exists().await?;
        let (status, statements) = if exists {
            (
                MigrationStatus::Altered,
                self.plan_alter(&table, migration).await?,
            )
        } else {
            (MigrationStatus::Created, self.plan_create(&table, migration)?)
        };

        if statements.is_empty() {
            migration.updated = true;
            info!(table = %table, version = %migration.version, "Table is up to date");
            return Ok(MigrationOutcome::new(MigrationStatus::UpToDate, 0));
        }

        for sql in &statements {
            self.execute(sql.as_str(), &[]).await?;
        }
        match status {
            MigrationStatus::Created => info!(table = %table, "Created table"),
            _ => info!(
                table = %table,
                added = migration.add.len(),
                changed = migration.change.len(),
                "Altered table"
            ),
        }
        self.record_version(migration).await?;
        info!(
            table = %migration.applies_to,
            version = %migration.version,
            "Applied migration"
        );
        Ok(MigrationOutcome::new(status, statements.len()))
    }

    fn plan_create(
        &self,
        table: &QualifiedName,
        migration: &mut SchemaMigration,
    ) -> Result<Vec<String>> {
        migration.add.retain(|field| !field.is_relation());
        if migration.add.is_empty() {
            return Err(MigrateError::Configuration(format!(
                "migration for {table} declares no columns to create"
            )));
        }
        migration.change.clear();
        migration.remove.clear();
        Ok(vec![self.dialect().create_table_sql(table, &migration.add)])
    }

    async fn plan_alter(
        &mut self,
        table: &QualifiedName,
        migration: &mut SchemaMigration,
    ) -> Result<Vec<String>> {
        let capabilities = self.dialect().profile().capabilities;
        let dialect_name = self.dialect().name();
        if !migration.remove.is_empty() && !capabilities.drop_column {
            return Err(MigrateError::UnsupportedOperation(format!(
                "{dialect_name} cannot remove columns from {table}"
            )));
        }
        if !migration.change.is_empty() && !capabilities.alter_column {
            return Err(MigrateError::UnsupportedOperation(format!(
                "{dialect_name} cannot change columns of {table}"
            )));
        }

        let columns = self.table(&migration.applies_to).columns().await?;
        reconcile_fields(self.dialect(), migration, &columns);

        if !migration.change.is_empty() && !capabilities.alter_column {
            let names: Vec<&str> = migration.change.iter().map(|f| f.name.as_str()).collect();
            return Err(MigrateError::UnsupportedOperation(format!(
                "{dialect_name} cannot change columns {} of {table}",
                names.join(", ")
            )));
        }
        for field in &migration.remove {
            warn!(
                table = %table,
                column = %field.name,
                "Column removal requested but not executed"
            );
        }

        let mut statements = Vec::new();
        if !migration.add.is_empty() {
            statements.extend(self.dialect().add_columns_sql(table, &migration.add));
        }
        if !migration.change.is_empty() {
            statements.extend(self.dialect().change_columns_sql(
                table,
                &migration.change,
                &columns,
            ));
        }
        Ok(statements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_dialect::{FieldDescriptor, LogicalType, OracleDialect};

    fn column(name: &str, data_type: &str, size: Option<i64>, nullable: bool, primary: bool) -> ColumnMetadata {
        ColumnMetadata {
            name: String::from(name),
            data_type: String::from(data_type),
            ordinal: None,
            size,
            scale: None,
            precision: None,
            nullable,
            primary,
        }
    }

    fn person_columns() -> Vec<ColumnMetadata> {
        vec![
            column("id", "NUMBER", None, false, true),
            column("name", "NVARCHAR2", Some(100), true, false),
        ]
    }

    #[test]
    fn test_matching_add_is_pruned() {
        let dialect = OracleDialect::new();
        let mut migration = SchemaMigration::new("person", "1.1")
            .add(FieldDescriptor::new("id", LogicalType::Counter).primary())
            .add(FieldDescriptor::new("name", LogicalType::Text).size(100));
        reconcile_fields(&dialect, &mut migration, &person_columns());
        assert!(migration.add.is_empty());
        assert!(migration.change.is_empty());
    }

    #[test]
    fn test_differing_add_moves_to_change() {
        let dialect = OracleDialect::new();
        let mut migration = SchemaMigration::new("person", "1.1")
            .add(FieldDescriptor::new("name", LogicalType::Text).size(200))
            .add(FieldDescriptor::new("email", LogicalType::Text).size(120));
        reconcile_fields(&dialect, &mut migration, &person_columns());
        assert_eq!(migration.add.len(), 1);
        assert_eq!(migration.add[0].name, "email");
        assert_eq!(migration.change.len(), 1);
        assert_eq!(migration.change[0].name, "name");
    }

    #[test]
    fn test_change_of_missing_column_moves_to_add() {
        let dialect = OracleDialect::new();
        let mut migration = SchemaMigration::new("person", "1.1")
            .change(FieldDescriptor::new("email", LogicalType::Text).size(120))
            .change(FieldDescriptor::new("id", LogicalType::Long).primary());
        reconcile_fields(&dialect, &mut migration, &person_columns());
        assert_eq!(migration.add.len(), 1);
        assert_eq!(migration.add[0].name, "email");
        assert!(migration.change.is_empty());
    }

    #[test]
    fn test_remove_keeps_only_live_non_primary_columns() {
        let dialect = OracleDialect::new();
        let mut migration = SchemaMigration::new("person", "1.1")
            .remove(FieldDescriptor::new("id", LogicalType::Counter))
            .remove(FieldDescriptor::new("name", LogicalType::Text))
            .remove(FieldDescriptor::new("ghost", LogicalType::Text));
        reconcile_fields(&dialect, &mut migration, &person_columns());
        assert_eq!(migration.remove.len(), 1);
        assert_eq!(migration.remove[0].name, "name");
    }

    #[test]
    fn test_relations_are_dropped() {
        let dialect = OracleDialect::new();
        let mut migration = SchemaMigration::new("person", "1.1")
            .add(FieldDescriptor::new("orders", "Order").one_to_many());
        reconcile_fields(&dialect, &mut migration, &person_columns());
        assert!(migration.add.is_empty());
    }

    #[test]
    fn test_unchanged_zero_scale_numbers_stay_untouched() {
        let dialect = OracleDialect::new();
        let number = |name: &str, precision| ColumnMetadata {
            precision: Some(precision),
            scale: Some(0),
            size: Some(22),
            ..column(name, "NUMBER", None, true, false)
        };
        let mut migration = SchemaMigration::new("t", "1.1")
            .add(FieldDescriptor::new("flag", LogicalType::Integer).size(2))
            .add(FieldDescriptor::new("amount", LogicalType::Decimal).size(12).scale(0));
        reconcile_fields(&dialect, &mut migration, &[number("flag", 2), number("amount", 12)]);
        assert!(migration.add.is_empty());
        assert!(migration.change.is_empty());
    }
}
