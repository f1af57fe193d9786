//! Identity generation through native sequences and the counter table,
//! against scripted Oracle and PostgreSQL backends.

mod common;
use common::*;

use oxide_dialect::{OracleDialect, PostgresDialect, SqlValue, SqliteDialect};
use oxide_migrate::{IdentityStrategy, MigrateError, Result, Row};

/// A backend with native sequences that starts without any.
fn sequence_backend() -> impl FnMut(&str, &[SqlValue]) -> Result<Vec<Row>> + Send + 'static {
    let mut created = false;
    let mut current = 0;
    move |sql: &str, _params: &[SqlValue]| {
        if sql.starts_with("CREATE SEQUENCE") {
            created = true;
            return Ok(Vec::new());
        }
        if sql.contains("information_schema.sequences") || sql.contains("ALL_SEQUENCES") {
            return Ok(count(i64::from(created)));
        }
        if sql.to_uppercase().contains("NEXTVAL") {
            current += 1;
            return Ok(value_row(current));
        }
        Ok(Vec::new())
    }
}

// ===================================================================
// Strategy selection
// ===================================================================

#[test]
fn strategy_follows_sequence_capability() {
    let (postgres, _) = scripted(PostgresDialect::new(), sequence_backend());
    let (oracle, _) = scripted(OracleDialect::new(), sequence_backend());
    let (sqlite, _) = scripted(SqliteDialect::new(), sequence_backend());
    assert_eq!(postgres.identity_strategy(), IdentityStrategy::Sequence);
    assert_eq!(oracle.identity_strategy(), IdentityStrategy::Sequence);
    assert_eq!(sqlite.identity_strategy(), IdentityStrategy::Counter);
}

// ===================================================================
// Sequences
// ===================================================================

#[tokio::test]
async fn sequence_values_increase_without_gaps() {
    let (mut adapter, log) = scripted(PostgresDialect::new(), sequence_backend());

    let mut values = Vec::new();
    for _ in 0..3 {
        values.push(adapter.next_identity("person", "id").await.unwrap());
    }

    assert_eq!(values, [1, 2, 3]);
    assert_eq!(
        log.writes(),
        [r#"CREATE SEQUENCE "person_id_seq" START WITH 1 INCREMENT BY 1"#]
    );
}

#[tokio::test]
async fn oracle_sequence_reads_from_dual() {
    let (mut adapter, log) = scripted(OracleDialect::new(), sequence_backend());

    assert_eq!(adapter.next_identity("person", "id").await.unwrap(), 1);

    assert!(log
        .statements()
        .contains(&String::from(r#"SELECT "person_id_seq".NEXTVAL AS "value" FROM DUAL"#)));
}

#[tokio::test]
async fn sequence_lives_beside_qualified_entity() {
    let (mut adapter, log) = scripted(OracleDialect::new(), sequence_backend());

    adapter.next_identity("hr.person", "id").await.unwrap();

    assert_eq!(
        log.writes(),
        [r#"CREATE SEQUENCE "hr"."person_id_seq" START WITH 1 INCREMENT BY 1"#]
    );
    assert_eq!(log.lookups("ALL_SEQUENCES", "person_id_seq"), 1);
}

#[tokio::test]
async fn forcing_sequences_without_support_fails_before_sql() {
    let (mut adapter, log) = scripted(SqliteDialect::new(), sequence_backend());

    let err = adapter
        .next_identity_with(IdentityStrategy::Sequence, "person", "id")
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::UnsupportedOperation(_)));
    assert!(log.statements().is_empty());
}

// ===================================================================
// Counter table
// ===================================================================

#[tokio::test]
async fn counter_reads_then_updates_inside_a_transaction() {
    let (mut adapter, log) = scripted(OracleDialect::new(), |sql: &str, _params: &[SqlValue]| {
        if sql.starts_with("SELECT") && sql.contains(r#"FROM "migrations""#) {
            return Ok(vec![ledger_row("increment_id", "1.0")]);
        }
        if sql.starts_with("SELECT") && sql.contains(r#"FROM "increment_id""#) {
            return Ok(value_row(41));
        }
        if sql.contains("COUNT(*)") {
            return Ok(count(1));
        }
        Ok(Vec::new())
    });

    let value = adapter
        .next_identity_with(IdentityStrategy::Counter, "person", "id")
        .await
        .unwrap();

    assert_eq!(value, 42);
    let update = r#"UPDATE "increment_id" SET "value" = :1 WHERE "entity" = :2 AND "attribute" = :3"#;
    assert_eq!(log.writes(), [update]);
    assert_eq!(
        log.params_of("UPDATE").unwrap(),
        vec![SqlValue::Int(42), text("person"), text("id")]
    );
    let statements = log.statements();
    let begin = statements.iter().position(|s| s == "BEGIN").unwrap();
    assert!(statements[begin + 1].starts_with(r#"SELECT "value" AS "value" FROM "increment_id""#));
    assert_eq!(statements[begin + 2], update);
    assert_eq!(statements[begin + 3], "COMMIT");
}
