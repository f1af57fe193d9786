//! The data adapter: statement execution and scoped transactions over a
//! [`Connection`], driven by a [`Dialect`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use oxide_dialect::dialect::BoundQuery;
use oxide_dialect::{Dialect, Formatter, QualifiedName, QueryExpression, SqlValue, Statement};
use tracing::{debug, warn};

use crate::catalog::{TableCatalog, ViewCatalog};
use crate::config::ConnectOptions;
use crate::connection::{Connection, Row};
use crate::error::{MigrateError, Result};

/// Flags the adapter when a transaction body is dropped before finishing.
struct TransactionGuard {
    abandoned: Arc<AtomicBool>,
    armed: bool,
}

impl TransactionGuard {
    fn new(abandoned: Arc<AtomicBool>) -> Self {
        Self {
            abandoned,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        if self.armed {
            self.abandoned.store(true, Ordering::SeqCst);
        }
    }
}

/// Runs statements, transactions, catalog lookups, migrations and identity
/// generation against one connection.
///
/// ```rust,no_run
/// # async fn run() -> oxide_migrate::Result<()> {
/// use oxide_dialect::SqliteDialect;
/// use oxide_migrate::{DataAdapter, SqliteConnection};
///
/// let connection = SqliteConnection::connect("sqlite::memory:").await?;
/// let mut adapter = DataAdapter::new(connection, SqliteDialect::new());
/// let rows = adapter.execute("SELECT 1 AS \"one\"", &[]).await?;
/// assert_eq!(rows[0].get_i64("one"), Some(1));
/// adapter.close().await;
/// # Ok(())
/// # }
/// ```
pub struct DataAdapter<C, D> {
    connection: C,
    dialect: D,
    default_schema: Option<String>,
    pub(crate) ledger_ready: bool,
    in_transaction: bool,
    abandoned: Arc<AtomicBool>,
}

impl<C: Connection, D: Dialect> DataAdapter<C, D> {
    /// Creates an adapter. Nothing is opened until the first statement.
    pub fn new(connection: C, dialect: D) -> Self {
        Self {
            connection,
            dialect,
            default_schema: None,
            ledger_ready: false,
            in_transaction: false,
            abandoned: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Sets the schema used for names without an owner.
    #[must_use]
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Applies connection options (currently the default schema).
    #[must_use]
    pub fn with_options(mut self, options: &ConnectOptions) -> Self {
        self.default_schema = options.schema.clone();
        self
    }

    /// Returns the dialect.
    pub fn dialect(&self) -> &D {
        &self.dialect
    }

    /// Returns a formatter for the dialect.
    pub fn formatter(&self) -> Formatter<'_> {
        Formatter::new(&self.dialect)
    }

    /// Returns the default schema.
    pub fn default_schema(&self) -> Option<&str> {
        self.default_schema.as_deref()
    }

    /// Returns the connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Returns the connection mutably.
    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    /// Returns true while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Resolves `owner.name` or `name` against the default schema.
    pub fn qualify(&self, name: &str) -> QualifiedName {
        QualifiedName::parse(name).or_schema(self.default_schema.as_deref())
    }

    /// Opens the connection.
    pub async fn open(&mut self) -> Result<()> {
        self.connection.open().await
    }

    /// Closes the connection. Failures are logged and swallowed.
    pub async fn close(&mut self) {
        if let Err(err) = self.connection.close().await {
            warn!(error = %err, "Failed to close connection");
        }
    }

    /// Compiles and runs a statement.
    ///
    /// Query expressions are compiled with the adapter's formatter; raw SQL
    /// runs as written. Any connection failure is wrapped in
    /// [`MigrateError::Backend`] together with the statement text.
    pub async fn execute(
        &mut self,
        statement: impl Into<Statement>,
        params: &[SqlValue],
    ) -> Result<Vec<Row>> {
        let sql = self.formatter().compile(&statement.into());
        self.recover_abandoned().await;
        debug!(sql = %sql, "Executing SQL");
        if let Err(err) = self.connection.open().await {
            return Err(MigrateError::backend(sql, err));
        }
        match self.connection.execute(&sql, params).await {
            Ok(rows) => Ok(rows),
            Err(err) => Err(MigrateError::backend(sql, err)),
        }
    }

    /// Runs a dialect catalog query.
    pub(crate) async fn execute_bound(&mut self, (sql, params): BoundQuery) -> Result<Vec<Row>> {
        self.execute(sql, &params).await
    }

    /// Runs `body` inside a transaction.
    ///
    /// Commits when the body succeeds and rolls back when it fails; the
    /// body's error wins over a failed rollback. When a transaction is
    /// already open the body joins it. If the returned future is dropped
    /// before it finishes, the next operation on the adapter rolls the
    /// abandoned transaction back first.
    ///
    /// ```rust,no_run
    /// # async fn run() -> oxide_migrate::Result<()> {
    /// use oxide_dialect::SqliteDialect;
    /// use oxide_migrate::{DataAdapter, MigrateError, SqliteConnection};
    ///
    /// let connection = SqliteConnection::connect("sqlite::memory:").await?;
    /// let mut adapter = DataAdapter::new(connection, SqliteDialect::new());
    /// adapter
    ///     .execute_in_transaction(|adapter| {
    ///         Box::pin(async move {
    ///             adapter.execute("CREATE TABLE t (v INTEGER)", &[]).await?;
    ///             adapter.execute("INSERT INTO t (v) VALUES (1)", &[]).await?;
    ///             Ok::<_, MigrateError>(())
    ///         })
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute_in_transaction<T, F>(&mut self, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut Self) -> BoxFuture<'c, Result<T>>,
    {
        self.recover_abandoned().await;
        if self.in_transaction {
            return body(self).await;
        }

        self.connection.open().await?;
        if let Err(err) = self.connection.begin().await {
            return Err(MigrateError::backend("BEGIN", err));
        }
        self.in_transaction = true;
        let guard = TransactionGuard::new(Arc::clone(&self.abandoned));

        let result = body(self).await;

        self.in_transaction = false;
        let outcome = match result {
            Ok(value) => match self.connection.commit().await {
                Ok(()) => Ok(value),
                Err(err) => Err(MigrateError::backend("COMMIT", err)),
            },
            Err(err) => {
                if let Err(rollback_err) = self.connection.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        };
        guard.disarm();
        outcome
    }

    /// Rolls back a transaction whose body was dropped mid-flight.
    ///
    /// Returns true if there was one. Every adapter operation calls this
    /// before issuing statements.
    pub async fn recover_abandoned(&mut self) -> bool {
        if !self.abandoned.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.in_transaction = false;
        warn!("Rolling back abandoned transaction");
        if let Err(err) = self.connection.rollback().await {
            warn!(error = %err, "Rollback of abandoned transaction failed");
        }
        true
    }

    /// Returns the catalog for table `name` (`owner.table` or `table`).
    pub fn table(&mut self, name: &str) -> TableCatalog<'_, C, D> {
        TableCatalog::new(self, name)
    }

    /// Returns the catalog for view `name` (`owner.view` or `view`).
    pub fn view(&mut self, name: &str) -> ViewCatalog<'_, C, D> {
        ViewCatalog::new(self, name)
    }

    /// Replaces view `name` with `query`.
    pub async fn create_view(&mut self, name: &str, query: &QueryExpression) -> Result<()> {
        self.view(name).create(query).await
    }

    /// Returns true if sequence `name` exists.
    pub async fn sequence_exists(&mut self, name: &str) -> Result<bool> {
        let sequence = self.qualify(name);
        let query = self.dialect.sequence_exists_query(&sequence);
        let rows = self.execute_bound(query).await?;
        Ok(count_of(&rows)? > 0)
    }
}

/// Reads the `count` column of a single-row catalog result.
pub(crate) fn count_of(rows: &[Row]) -> Result<i64> {
    rows.first()
        .and_then(|row| row.get_i64("count"))
        .ok_or_else(|| MigrateError::InvalidState(String::from("expected a count row")))
}
