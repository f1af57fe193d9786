//! SQLite connection over an sqlx pool.

use async_trait::async_trait;
use oxide_dialect::dialect::local_timestamp;
use oxide_dialect::SqlValue;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::debug;

use crate::connection::{Connection, Row};
use crate::error::{MigrateError, Result};

/// A [`Connection`] that holds one pooled SQLite connection while open.
///
/// ```rust,no_run
/// # async fn run() -> oxide_migrate::Result<()> {
/// use oxide_migrate::SqliteConnection;
/// use sqlx::sqlite::SqlitePoolOptions;
///
/// let pool = SqlitePoolOptions::new()
///     .max_connections(1)
///     .connect("sqlite::memory:")
///     .await?;
/// let connection = SqliteConnection::new(pool);
/// # let _ = connection;
/// # Ok(())
/// # }
/// ```
pub struct SqliteConnection {
    pool: SqlitePool,
    conn: Option<PoolConnection<Sqlite>>,
}

impl SqliteConnection {
    /// Creates a closed connection drawing from `pool`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, conn: None }
    }

    /// Connects a new pool to `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        Ok(Self::new(SqlitePool::connect(url).await?))
    }

    /// Returns the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns true while a pooled connection is held.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    async fn run(&mut self, sql: &str) -> Result<()> {
        let conn = self.session()?;
        sqlx::query(sql).execute(&mut **conn).await?;
        Ok(())
    }

    fn session(&mut self) -> Result<&mut PoolConnection<Sqlite>> {
        self.conn
            .as_mut()
            .ok_or_else(|| MigrateError::InvalidState(String::from("connection is not open")))
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn open(&mut self) -> Result<()> {
        if self.conn.is_none() {
            debug!("Acquiring SQLite connection");
            self.conn = Some(self.pool.acquire().await?);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.conn.take().is_some() {
            debug!("Released SQLite connection");
        }
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>> {
        let conn = self.session()?;
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_param(query, param);
        }
        let rows = query.fetch_all(&mut **conn).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn begin(&mut self) -> Result<()> {
        self.run("BEGIN").await
    }

    async fn commit(&mut self) -> Result<()> {
        self.run("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.run("ROLLBACK").await
    }
}

/// Binds a SqlValue parameter to a query. Timestamps are bound as text in
/// the same form the dialect renders timestamp literals.
fn bind_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SqlValue,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Blob(b) => query.bind(b.clone()),
        SqlValue::Timestamp(t) => query.bind(local_timestamp(t)),
    }
}

/// Converts a driver row using the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row> {
    let mut out = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let type_name = raw.type_info().name().to_uppercase();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get::<i64, _>(index)?),
                "REAL" => SqlValue::Float(row.try_get::<f64, _>(index)?),
                "BLOB" => SqlValue::Blob(row.try_get::<Vec<u8>, _>(index)?),
                _ => SqlValue::Text(row.try_get::<String, _>(index)?),
            }
        };
        out.push(column.name(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory() -> SqliteConnection {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        SqliteConnection::new(pool)
    }

    #[tokio::test]
    async fn test_execute_requires_open() {
        let mut conn = memory().await;
        let err = conn.execute("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, MigrateError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_decodes_storage_classes() {
        let mut conn = memory().await;
        conn.open().await.unwrap();
        let rows = conn
            .execute(
                "SELECT ? AS \"i\", ? AS \"f\", ? AS \"t\", NULL AS \"n\"",
                &[
                    SqlValue::Int(7),
                    SqlValue::Float(1.5),
                    SqlValue::Text(String::from("x")),
                ],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_i64("i"), Some(7));
        assert_eq!(rows[0].get("f"), Some(&SqlValue::Float(1.5)));
        assert_eq!(rows[0].get_str("t"), Some("x"));
        assert_eq!(rows[0].get("n"), Some(&SqlValue::Null));
        conn.close().await.unwrap();
        assert!(!conn.is_open());
    }

    #[tokio::test]
    async fn test_rollback_discards_changes() {
        let mut conn = memory().await;
        conn.open().await.unwrap();
        conn.execute("CREATE TABLE t (v INTEGER)", &[]).await.unwrap();
        conn.begin().await.unwrap();
        conn.execute("INSERT INTO t (v) VALUES (1)", &[]).await.unwrap();
        conn.rollback().await.unwrap();
        let rows = conn
            .execute("SELECT COUNT(*) AS \"count\" FROM t", &[])
            .await
            .unwrap();
        assert_eq!(rows[0].get_i64("count"), Some(0));
    }
}
