//! Native client seam.
//!
//! A native client is the raw transport a dialect driver sits on: it can open a
//! physical connection, run one statement at a time and report row counts. Nothing
//! above this module knows about a vendor's wire protocol.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Diagnostic reported by a native client call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NativeError {
    pub message: String,
    /// Vendor error code, when the client reports one.
    pub code: Option<i64>,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }
}

impl From<sqlx::Error> for NativeError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().and_then(|c| c.parse().ok());
                NativeError {
                    message: db_err.message().to_string(),
                    code,
                }
            }
            other => NativeError::new(other.to_string()),
        }
    }
}

/// Parameters handed to a native connect call.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Dialect-specific target, e.g. `host/port:database` for Firebird.
    pub target: String,
    pub user: String,
    pub password: String,
    pub charset: String,
}

impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("target", &self.target)
            .field("user", &self.user)
            .field("password", &"****")
            .field("charset", &self.charset)
            .finish()
    }
}

/// Everything one executed statement produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<JsonValue>>,
    pub rows_affected: u64,
}

impl NativeResult {
    /// Result of a statement that returns rows.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<JsonValue>>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: 0,
        }
    }

    /// Result of a statement that only changes rows.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }
}

/// Factory for physical connections.
#[async_trait]
pub trait NativeClient: Send + Sync {
    /// Client name for diagnostics.
    fn name(&self) -> &str;

    /// Capability check: whether the client can be used in this runtime.
    fn is_available(&self) -> bool;

    /// Open a physical connection.
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn NativeConnection>, NativeError>;
}

/// One open physical connection. At most one call is in flight at a time.
#[async_trait]
pub trait NativeConnection: Send {
    /// Run a single statement and collect its rows.
    async fn query(&mut self, sql: &str) -> Result<NativeResult, NativeError>;

    /// Open a native transaction.
    async fn begin(&mut self) -> Result<(), NativeError>;

    /// Commit the native transaction.
    async fn commit(&mut self) -> Result<(), NativeError>;

    /// Roll back the native transaction.
    async fn rollback(&mut self) -> Result<(), NativeError>;

    /// Whether the handle is still usable.
    fn is_valid(&self) -> bool;

    /// Release the native handle.
    async fn close(self: Box<Self>) -> Result<(), NativeError>;
}
