//! Error types for schema reconciliation and statement execution.

/// Errors that can occur while talking to a backend or reconciling a schema.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// A migration or connection description is malformed. No DDL was run.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The dialect cannot perform the requested schema change. No DDL was run.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A statement failed on the backend.
    #[error("Statement failed: {statement}: {source}")]
    Backend {
        /// The SQL text that failed.
        statement: String,
        /// The underlying failure.
        #[source]
        source: Box<MigrateError>,
    },

    /// Another process created the migration ledger concurrently.
    #[error("Race detected: {0}")]
    Race(String),

    /// Database driver error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend returned something the engine cannot interpret, or the
    /// connection was used out of order.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl MigrateError {
    /// Wraps a connection failure with the statement that caused it.
    #[must_use]
    pub fn backend(statement: impl Into<String>, source: Self) -> Self {
        Self::Backend {
            statement: statement.into(),
            source: Box::new(source),
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_keeps_statement() {
        let err = MigrateError::backend(
            "SELECT 1",
            MigrateError::InvalidState(String::from("closed")),
        );
        assert_eq!(
            err.to_string(),
            "Statement failed: SELECT 1: Invalid state: closed"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
