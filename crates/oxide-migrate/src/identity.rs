//! Identity generation: native sequences or a counter table.

use futures::FutureExt;
use oxide_dialect::query::{field, Entity};
use oxide_dialect::{Dialect, FieldDescriptor, LogicalType, QueryExpression, SqlValue};
use tracing::{debug, info};

use crate::adapter::{count_of, DataAdapter};
use crate::connection::Connection;
use crate::error::{MigrateError, Result};
use crate::migration::SchemaMigration;

/// Name of the counter table used when sequences are unavailable.
pub const IDENTITY_TABLE: &str = "increment_id";

/// How identity values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityStrategy {
    /// A native sequence named `<entity>_<attribute>_seq`.
    Sequence,
    /// A row of the `increment_id` table.
    Counter,
}

/// Returns the migration that creates the counter table.
pub fn identity_migration() -> SchemaMigration {
    SchemaMigration::new(IDENTITY_TABLE, "1.0")
        .model("increments")
        .description("Increments migration (version 1.0)")
        .add(
            FieldDescriptor::new("entity", LogicalType::Text)
                .size(120)
                .primary(),
        )
        .add(
            FieldDescriptor::new("attribute", LogicalType::Text)
                .size(120)
                .primary(),
        )
        .add(FieldDescriptor::new("value", LogicalType::Integer))
}

impl<C: Connection, D: Dialect> DataAdapter<C, D> {
    /// Returns the strategy [`next_identity`](Self::next_identity) uses.
    pub fn identity_strategy(&self) -> IdentityStrategy {
        if self.dialect().profile().capabilities.sequences {
            IdentityStrategy::Sequence
        } else {
            IdentityStrategy::Counter
        }
    }

    /// Returns the next identity value for `entity.attribute`.
    pub async fn next_identity(&mut self, entity: &str, attribute: &str) -> Result<i64> {
        let strategy = self.identity_strategy();
        self.next_identity_with(strategy, entity, attribute).await
    }

    /// Returns the next identity value using `strategy`.
    ///
    /// The counter strategy is a read followed by a write. Concurrent callers
    /// for the same pair need external mutual exclusion.
    pub async fn next_identity_with(
        &mut self,
        strategy: IdentityStrategy,
        entity: &str,
        attribute: &str,
    ) -> Result<i64> {
        match strategy {
            IdentityStrategy::Sequence => self.next_sequence_value(entity, attribute).await,
            IdentityStrategy::Counter => self.next_counter_value(entity, attribute).await,
        }
    }

    async fn next_sequence_value(&mut self, entity: &str, attribute: &str) -> Result<i64> {
        let table = self.qualify(entity);
        let sequence = table.sibling(format!("{}_{attribute}_seq", table.name));
        let next_value = self.dialect().next_value_sql(&sequence).ok_or_else(|| {
            MigrateError::UnsupportedOperation(format!(
                "{} has no sequences",
                self.dialect().name()
            ))
        })?;

        let query = self.dialect().sequence_exists_query(&sequence);
        let rows = self.execute_bound(query).await?;
        if count_of(&rows)? == 0 {
            let sql = self.dialect().create_sequence_sql(&sequence);
            self.execute(sql, &[]).await?;
            info!(sequence = %sequence, "Created sequence");
        }

        let rows = self.execute(next_value, &[]).await?;
        rows.first()
            .and_then(|row| row.get_i64("value"))
            .ok_or_else(|| {
                MigrateError::InvalidState(format!("sequence {sequence} returned no value"))
            })
    }

    async fn next_counter_value(&mut self, entity: &str, attribute: &str) -> Result<i64> {
        let mut bootstrap = identity_migration();
        self.migrate(&mut bootstrap).await?;

        let entity = String::from(entity);
        let attribute = String::from(attribute);
        self.execute_in_transaction(|adapter| {
            async move { adapter.advance_counter(&entity, &attribute).await }.boxed()
        })
        .await
    }

    async fn advance_counter(&mut self, entity: &str, attribute: &str) -> Result<i64> {
        let dialect = self.dialect();
        let counters = dialect.qualified_identifier(&self.qualify(IDENTITY_TABLE));
        let entity_column = dialect.escape_identifier("entity");
        let attribute_column = dialect.escape_identifier("attribute");
        let value_column = dialect.escape_identifier("value");
        let (p1, p2, p3) = (
            dialect.placeholder(1),
            dialect.placeholder(2),
            dialect.placeholder(3),
        );
        let keys = [
            SqlValue::Text(String::from(entity)),
            SqlValue::Text(String::from(attribute)),
        ];

        let select = format!(
            "SELECT {value_column} AS {value_column} FROM {counters} \
             WHERE {entity_column} = {p1} AND {attribute_column} = {p2}"
        );
        let update = format!(
            "UPDATE {counters} SET {value_column} = {p1} \
             WHERE {entity_column} = {p2} AND {attribute_column} = {p3}"
        );
        let insert = format!(
            "INSERT INTO {counters} ({entity_column}, {attribute_column}, {value_column}) \
             VALUES ({p1}, {p2}, {p3})"
        );

        let rows = self.execute(select, &keys).await?;
        if let Some(row) = rows.first() {
            let current = row.get_i64("value").ok_or_else(|| {
                MigrateError::InvalidState(format!("counter for {entity}.{attribute} is empty"))
            })?;
            let next = next_after(current, entity, attribute)?;
            let [entity_key, attribute_key] = keys;
            self.execute(update, &[SqlValue::Int(next), entity_key, attribute_key])
                .await?;
            debug!(entity = %entity, attribute = %attribute, value = next, "Advanced counter");
            return Ok(next);
        }

        let seed_query = QueryExpression::query(Entity::new(self.qualify(entity).to_string()))
            .select([field(attribute).max()]);
        let seed = self
            .execute(seed_query, &[])
            .await?
            .first()
            .and_then(|row| row.get_i64(attribute))
            .unwrap_or(0);
        let next = next_after(seed, entity, attribute)?;
        let [entity_key, attribute_key] = keys;
        self.execute(insert, &[entity_key, attribute_key, SqlValue::Int(next)])
            .await?;
        info!(entity = %entity, attribute = %attribute, value = next, "Seeded counter");
        Ok(next)
    }
}

fn next_after(current: i64, entity: &str, attribute: &str) -> Result<i64> {
    current.checked_add(1).ok_or_else(|| {
        MigrateError::InvalidState(format!("counter for {entity}.{attribute} is exhausted"))
    })
}
