//! Tests for scalar-function translation and literals on PostgreSQL and
//! SQLite.

mod common;
use common::*;

use oxide_dialect::query::{field, QueryExpression};
use oxide_dialect::{Dialect, PostgresDialect, SqlValue, SqliteDialect};

fn sqlite_select(expr: oxide_dialect::query::Expr) -> String {
    unaliased(&SqliteDialect::new(), &QueryExpression::query("t").select([expr]))
}

fn postgres_select(expr: oxide_dialect::query::Expr) -> String {
    unaliased(&PostgresDialect::new(), &QueryExpression::query("t").select([expr]))
}

// ===================================================================
// SQLite
// ===================================================================

#[test]
fn sqlite_index_of_and_substring() {
    assert_eq!(
        sqlite_select(field("name").index_of("b")),
        r#"SELECT (INSTR("name",'b')-1) FROM "t""#
    );
    assert_eq!(
        sqlite_select(field("name").substring(0, Some(3))),
        r#"SELECT SUBSTR("name",1,3) FROM "t""#
    );
}

#[test]
fn sqlite_concat_uses_operator() {
    assert_eq!(
        sqlite_select(field("a").concat("x")),
        r#"SELECT ("a" || 'x') FROM "t""#
    );
}

#[test]
fn sqlite_text_predicates() {
    let q = QueryExpression::query("t")
        .where_clause(field("name").starts_with("Jo"))
        .where_clause(field("name").ends_with("n"));
    assert_eq!(
        sqlite(&q),
        r#"SELECT * FROM "t" WHERE (INSTR("name",'Jo') = 1) AND (SUBSTR("name",-LENGTH('n')) = 'n')"#
    );
}

#[test]
fn sqlite_date_parts() {
    assert_eq!(
        sqlite_select(field("created").year()),
        r#"SELECT CAST(STRFTIME('%Y', "created") AS INTEGER) FROM "t""#
    );
    assert_eq!(
        sqlite_select(field("created").date_only()),
        r#"SELECT DATE("created") FROM "t""#
    );
}

#[test]
fn sqlite_paging() {
    let q = QueryExpression::query("t").order_by(field("id")).skip(10).take(5);
    assert_eq!(
        sqlite(&q),
        r#"SELECT * FROM "t" ORDER BY "id" ASC LIMIT 5 OFFSET 10"#
    );
}

#[test]
fn sqlite_booleans_are_numeric() {
    let d = SqliteDialect::new();
    assert_eq!(d.escape(&SqlValue::Bool(true), false), "1");
}

// ===================================================================
// PostgreSQL
// ===================================================================

#[test]
fn postgres_index_of_uses_position() {
    assert_eq!(
        postgres_select(field("name").index_of("b")),
        r#"SELECT (POSITION('b' IN "name")-1) FROM "t""#
    );
}

#[test]
fn postgres_substring() {
    assert_eq!(
        postgres_select(field("name").substring(2, None)),
        r#"SELECT SUBSTRING("name" FROM 3) FROM "t""#
    );
}

#[test]
fn postgres_text_predicate_is_regex() {
    let q = QueryExpression::query("t").where_clause(field("name").contains("a+b"));
    assert_eq!(
        postgres(&q),
        r#"SELECT * FROM "t" WHERE ("name" ~ 'a\+b')"#
    );
}

#[test]
fn postgres_date_parts() {
    assert_eq!(
        postgres_select(field("created").month()),
        r#"SELECT CAST(EXTRACT(MONTH FROM "created") AS INTEGER) FROM "t""#
    );
}

#[test]
fn postgres_paging_skip_only() {
    let q = QueryExpression::query("t").skip(3);
    assert_eq!(postgres(&q), r#"SELECT * FROM "t" OFFSET 3"#);
}

#[test]
fn postgres_booleans_and_placeholders() {
    let d = PostgresDialect::new();
    assert_eq!(d.escape(&SqlValue::Bool(false), false), "FALSE");
    assert_eq!(d.placeholder(3), "$3");
}

// ===================================================================
// Shared
// ===================================================================

#[test]
fn quotes_never_leave_dangling_escapes() {
    for dialect in all_dialects() {
        let escaped = dialect.escape(&SqlValue::Text(String::from("a'b\\")), false);
        assert_eq!(escaped, "'a''b\\'", "{}", dialect.name());
    }
}

#[test]
fn in_list_renders_values() {
    let q = QueryExpression::query("t").where_clause(field("id").in_list(vec![1, 2, 3]));
    assert_eq!(sqlite(&q), r#"SELECT * FROM "t" WHERE "id" IN (1, 2, 3)"#);
}
