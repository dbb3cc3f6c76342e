//! Error types for the database abstraction layer.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Every failure surfaced by a driver maps to exactly one of these kinds; callers treat
//! any of them as terminal for the current operation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Unsupported capability: {message} (driver: {driver})")]
    UnsupportedCapability { driver: String, message: String },

    #[error("Could not connect to database: {message}")]
    Connect { message: String },

    #[error("Execution failed: {message} (SQL: {sql})")]
    Execution {
        /// Statement text with the physical table prefix redacted unless debugging.
        sql: String,
        message: String,
    },

    #[error("Invalid cursor: {cursor}")]
    InvalidCursor { cursor: String },

    #[error("Unsupported operation: {operation} is not available for {driver}")]
    UnsupportedOperation { operation: String, driver: String },

    #[error("Transaction error: {message}")]
    Transaction { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create an unsupported capability error.
    pub fn unsupported_capability(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedCapability {
            driver: driver.into(),
            message: message.into(),
        }
    }

    /// Create a connect error wrapping the native diagnostic.
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Create an execution error for a failed statement.
    pub fn execution(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create an invalid cursor error.
    pub fn invalid_cursor(cursor: impl std::fmt::Display) -> Self {
        Self::InvalidCursor {
            cursor: cursor.to_string(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported_operation(operation: impl Into<String>, driver: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
            driver: driver.into(),
        }
    }

    /// Create a transaction state error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction {
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The failing SQL text, for execution errors.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    ///
    /// This layer never retries on its own; only connect failures are worth
    /// a caller-side retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::internal(format!("Serialization error: {}", err))
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
