//! Database error types
//!
//! This module defines the error types that can occur during database operations
//! and their translation into the domain's `PortError`.

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Unique constraint violation (SQLSTATE 23505)
    #[error("Duplicate entry: {message}")]
    DuplicateEntry {
        message: String,
        constraint: Option<String>,
    },

    /// Foreign key constraint violation (SQLSTATE 23503)
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        message: String,
        constraint: Option<String>,
    },

    /// Check constraint violation (SQLSTATE 23514)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored value could not be turned back into a domain value
    #[error("Invalid stored value: {0}")]
    Decode(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Case", "CASE-123");
    /// assert!(error.to_string().contains("Case"));
    /// ```
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn decode(message: impl std::fmt::Display) -> Self {
        DatabaseError::Decode(message.to_string())
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry { .. }
                | DatabaseError::ForeignKeyViolation { .. }
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }

    /// Maps a PostgreSQL SQLSTATE code to an error variant
    ///
    /// https://www.postgresql.org/docs/current/errcodes-appendix.html
    pub fn from_sqlstate(code: &str, message: String, constraint: Option<String>) -> Self {
        match code {
            "23505" => DatabaseError::DuplicateEntry { message, constraint },
            "23503" => DatabaseError::ForeignKeyViolation { message, constraint },
            "23514" => DatabaseError::ConstraintViolation(message),
            _ => DatabaseError::QueryFailed(message),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => DatabaseError::QueryFailed("Record not found".to_string()),
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::Decode(error.to_string())
            }
            sqlx::Error::Database(db_err) => match db_err.code() {
                Some(code) => DatabaseError::from_sqlstate(
                    code.as_ref(),
                    db_err.message().to_string(),
                    db_err.constraint().map(str::to_string),
                ),
                None => DatabaseError::QueryFailed(db_err.message().to_string()),
            },
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

impl From<DatabaseError> for PortError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::NotFound { entity, id } => PortError::NotFound {
                entity_type: entity.to_string(),
                id,
            },
            DatabaseError::DuplicateEntry { message, constraint } => {
                PortError::Duplicate { message, constraint }
            }
            DatabaseError::ForeignKeyViolation { message, constraint } => {
                PortError::ReferenceViolation { message, constraint }
            }
            DatabaseError::ConstraintViolation(message) => PortError::validation(message),
            DatabaseError::ConnectionFailed(message) => PortError::connection(message),
            DatabaseError::PoolExhausted => PortError::Timeout {
                operation: "acquire_connection".to_string(),
                duration_ms: 0,
            },
            other => PortError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlstate_mapping() {
        let dup = DatabaseError::from_sqlstate(
            "23505",
            "duplicate key value violates unique constraint".to_string(),
            Some("cases_branch_tag_key".to_string()),
        );
        assert!(matches!(dup, DatabaseError::DuplicateEntry { .. }));

        let fk = DatabaseError::from_sqlstate("23503", "still referenced".to_string(), None);
        assert!(matches!(fk, DatabaseError::ForeignKeyViolation { .. }));

        let other = DatabaseError::from_sqlstate("42P01", "relation does not exist".to_string(), None);
        assert!(matches!(other, DatabaseError::QueryFailed(_)));
    }

    #[test]
    fn test_port_error_translation() {
        let port: PortError = DatabaseError::DuplicateEntry {
            message: "tag".to_string(),
            constraint: Some("cases_branch_tag_key".to_string()),
        }
        .into();
        assert!(port.is_duplicate());

        let port: PortError = DatabaseError::ForeignKeyViolation {
            message: "branch referenced".to_string(),
            constraint: None,
        }
        .into();
        assert!(matches!(port, PortError::ReferenceViolation { .. }));

        let port: PortError = DatabaseError::not_found("Payment", "PAY-1").into();
        assert!(port.is_not_found());

        let port: PortError = DatabaseError::PoolExhausted.into();
        assert!(port.is_transient());
    }

    #[test]
    fn test_error_classification() {
        assert!(DatabaseError::not_found("Case", "x").is_not_found());
        assert!(DatabaseError::ConstraintViolation("check".into()).is_constraint_violation());
        assert!(DatabaseError::PoolExhausted.is_connection_error());
    }
}
