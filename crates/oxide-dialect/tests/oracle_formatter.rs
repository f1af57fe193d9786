//! Tests for compiling query expressions with the Oracle dialect: row-number
//! pagination, DUAL, text predicates and literal escaping.

mod common;
use common::*;

use chrono::DateTime;
use oxide_dialect::dialect::local_timestamp;
use oxide_dialect::query::{field, value, Entity, QueryExpression, SelectItem};
use oxide_dialect::{Dialect, OracleDialect, SqlValue};

// ===================================================================
// Selection
// ===================================================================

#[test]
fn select_fields_are_force_aliased() {
    let q = QueryExpression::query("person").select([field("id"), field("name")]);
    assert_eq!(
        oracle(&q),
        r#"SELECT "id" AS "id", "name" AS "name" FROM "person""#
    );
}

#[test]
fn select_star_when_no_fields() {
    let q = QueryExpression::query("person");
    assert_eq!(oracle(&q), r#"SELECT * FROM "person""#);
}

#[test]
fn select_qualified_entity_with_alias() {
    let q = QueryExpression::query(Entity::new("hr.person").alias("p")).select([field("p.name")]);
    assert_eq!(
        oracle(&q),
        r#"SELECT "p"."name" AS "name" FROM "hr"."person" "p""#
    );
}

#[test]
fn select_explicit_alias_wins() {
    let q = QueryExpression::query("person").select([field("name").aliased("title")]);
    assert_eq!(oracle(&q), r#"SELECT "name" AS "title" FROM "person""#);
}

#[test]
fn select_aggregates() {
    let q = QueryExpression::query("person").select([
        SelectItem::from(field("id").max()),
        field("*").count().aliased("total"),
    ]);
    assert_eq!(
        oracle(&q),
        r#"SELECT MAX("id") AS "id", COUNT(*) AS "total" FROM "person""#
    );
}

#[test]
fn select_distinct_grouped_ordered() {
    let q = QueryExpression::query("person")
        .select([field("dept")])
        .distinct()
        .group_by([field("dept")])
        .order_by_desc(field("dept"));
    assert_eq!(
        unaliased(&OracleDialect::new(), &q),
        r#"SELECT DISTINCT "dept" FROM "person" GROUP BY "dept" ORDER BY "dept" DESC"#
    );
}

#[test]
fn select_left_join() {
    let q = QueryExpression::query(Entity::new("person").alias("p"))
        .select([field("p.name"), field("d.title")])
        .left_join(
            Entity::new("dept").alias("d"),
            field("p.dept").eq(field("d.id")),
        );
    assert_eq!(
        unaliased(&OracleDialect::new(), &q),
        r#"SELECT "p"."name", "d"."title" FROM "person" "p" LEFT JOIN "dept" "d" ON "p"."dept" = "d"."id""#
    );
}

// ===================================================================
// Fixed expressions
// ===================================================================

#[test]
fn fixed_expression_selects_from_dual() {
    let q = QueryExpression::fixed().select([value(1).add(2).aliased("total")]);
    assert_eq!(oracle(&q), r#"SELECT 1 + 2 AS "total" FROM DUAL"#);
}

#[test]
fn fixed_expression_without_dummy_table() {
    let q = QueryExpression::fixed().select([value(1).add(2).aliased("total")]);
    assert_eq!(sqlite(&q), r#"SELECT 1 + 2 AS "total""#);
    assert_eq!(postgres(&q), r#"SELECT 1 + 2 AS "total""#);
}

// ===================================================================
// Pagination
// ===================================================================

#[test]
fn paging_wraps_with_rownum() {
    let q = QueryExpression::query("person")
        .order_by(field("id"))
        .skip(10)
        .take(5);
    assert_eq!(
        oracle(&q),
        r#"SELECT * FROM (SELECT t0.*, ROWNUM AS "__RowIndex" FROM (SELECT * FROM "person" ORDER BY "id" ASC) t0) WHERE "__RowIndex" BETWEEN 11 AND 15"#
    );
}

#[test]
fn paging_skip_only() {
    let q = QueryExpression::query("person").skip(10);
    assert!(oracle(&q).ends_with(r#"WHERE "__RowIndex" > 10"#));
}

#[test]
fn paging_take_only() {
    let q = QueryExpression::query("person").take(5);
    assert!(oracle(&q).ends_with(r#"WHERE "__RowIndex" <= 5"#));
}

#[test]
fn paging_absent_leaves_query_alone() {
    let q = QueryExpression::query("person").order_by(field("id"));
    assert_eq!(oracle(&q), r#"SELECT * FROM "person" ORDER BY "id" ASC"#);
}

// ===================================================================
// Scalar functions
// ===================================================================

fn oracle_expr(q: QueryExpression) -> String {
    unaliased(&OracleDialect::new(), &q)
}

#[test]
fn function_index_of_is_zero_based() {
    let q = QueryExpression::query("person").select([field("name").index_of("a")]);
    assert_eq!(
        oracle_expr(q),
        r#"SELECT (INSTR("name",'a')-1) FROM "person""#
    );
}

#[test]
fn function_substring_shifts_start() {
    let q = QueryExpression::query("person").select([
        field("name").substring(1, Some(2)),
        field("name").substring(3, None),
    ]);
    assert_eq!(
        oracle_expr(q),
        r#"SELECT SUBSTR("name",2,2), SUBSTR("name",4) FROM "person""#
    );
}

#[test]
fn function_concat_length_case() {
    let q = QueryExpression::query("person").select([
        field("first").concat(field("last")),
        field("name").length(),
        field("name").to_lower(),
        field("name").to_upper(),
        field("name").trim(),
    ]);
    assert_eq!(
        oracle_expr(q),
        r#"SELECT CONCAT("first","last"), LENGTH("name"), LOWER("name"), UPPER("name"), TRIM("name") FROM "person""#
    );
}

#[test]
fn function_rounding() {
    let q = QueryExpression::query("item").select([
        field("price").ceiling(),
        field("price").floor(),
        field("price").round(Some(2)),
    ]);
    assert_eq!(
        oracle_expr(q),
        r#"SELECT CEIL("price"), FLOOR("price"), ROUND("price",2) FROM "item""#
    );
}

#[test]
fn function_date_parts() {
    let q = QueryExpression::query("event").select([
        field("created").day(),
        field("created").month(),
        field("created").year(),
        field("created").hour(),
        field("created").minute(),
        field("created").second(),
    ]);
    assert_eq!(
        oracle_expr(q),
        "SELECT CAST(TO_CHAR(\"created\",'DD') AS NUMBER), CAST(TO_CHAR(\"created\",'MM') AS NUMBER), \
         CAST(TO_CHAR(\"created\",'YYYY') AS NUMBER), CAST(TO_CHAR(\"created\",'HH24') AS NUMBER), \
         CAST(TO_CHAR(\"created\",'MI') AS NUMBER), CAST(TO_CHAR(\"created\",'SS') AS NUMBER) FROM \"event\""
    );
}

#[test]
fn function_date_only() {
    let q = QueryExpression::query("event").select([field("created").date_only()]);
    assert_eq!(
        oracle_expr(q),
        r#"SELECT TO_TIMESTAMP_TZ(TO_CHAR("created", 'YYYY-MM-DD'),'YYYY-MM-DD') FROM "event""#
    );
}

// ===================================================================
// Text predicates
// ===================================================================

#[test]
fn predicate_starts_with() {
    let q = QueryExpression::query("person").where_clause(field("name").starts_with("Jo"));
    assert_eq!(
        oracle(&q),
        r#"SELECT * FROM "person" WHERE REGEXP_LIKE("name", '^Jo')"#
    );
}

#[test]
fn predicate_contains_and_ends_with() {
    let q = QueryExpression::query("person")
        .where_clause(field("name").contains("an"))
        .where_clause(field("name").ends_with("son"));
    assert_eq!(
        oracle(&q),
        r#"SELECT * FROM "person" WHERE REGEXP_LIKE("name", 'an') AND REGEXP_LIKE("name", 'son$')"#
    );
}

#[test]
fn predicate_with_null_operand_is_dropped() {
    let q = QueryExpression::query("person").where_clause(field("name").starts_with(SqlValue::Null));
    assert_eq!(oracle(&q), r#"SELECT * FROM "person""#);
}

#[test]
fn predicate_against_column_pattern() {
    let q = QueryExpression::query("person").where_clause(field("name").starts_with(field("prefix")));
    assert_eq!(
        oracle(&q),
        r#"SELECT * FROM "person" WHERE REGEXP_LIKE("name", '^' || "prefix")"#
    );
}

// ===================================================================
// Literals
// ===================================================================

#[test]
fn literal_quotes_are_doubled() {
    let d = OracleDialect::new();
    assert_eq!(d.escape(&SqlValue::Text(String::from("O'Brien")), false), "'O''Brien'");
    assert_eq!(d.escape(&SqlValue::Text(String::from("O'Brien")), true), "O''Brien");
}

#[test]
fn literal_backslashes_survive() {
    let d = OracleDialect::new();
    assert_eq!(
        d.escape(&SqlValue::Text(String::from("C:\\temp\\")), false),
        "'C:\\temp\\'"
    );
}

#[test]
fn literal_booleans_are_numeric() {
    let d = OracleDialect::new();
    assert_eq!(d.escape(&SqlValue::Bool(true), false), "1");
    assert_eq!(d.escape(&SqlValue::Bool(false), false), "0");
}

#[test]
fn literal_timestamp_is_timezone_aware() {
    let d = OracleDialect::new();
    let ts = DateTime::parse_from_rfc3339("2024-03-01T10:00:00.250+02:00").unwrap();
    assert_eq!(
        d.escape(&SqlValue::Timestamp(ts), false),
        format!(
            "TO_TIMESTAMP_TZ('{}','YYYY-MM-DD HH24:MI:SS.FF3TZH:TZM')",
            local_timestamp(&ts)
        )
    );
    assert!(local_timestamp(&ts).contains(".250"));
}

#[test]
fn literal_null_and_blob() {
    let d = OracleDialect::new();
    assert_eq!(d.escape(&SqlValue::Null, false), "NULL");
    assert_eq!(d.escape(&SqlValue::Blob(vec![0xde, 0xad]), false), "X'DEAD'");
}

// ===================================================================
// Identifiers
// ===================================================================

#[test]
fn identifier_quoting_is_idempotent() {
    let d = OracleDialect::new();
    assert_eq!(d.escape_identifier("person"), r#""person""#);
    assert_eq!(d.escape_identifier("hr.person"), r#""hr"."person""#);
    assert_eq!(d.escape_identifier(r#""hr"."person""#), r#""hr"."person""#);
    assert_eq!(d.escape_identifier("p.*"), r#""p".*"#);
}
