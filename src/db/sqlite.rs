//! SQLite native client over `sqlx`.
//!
//! Holds a single `SqliteConnection` per driver. Statements are sent as raw SQL so
//! a script of several statements runs in one call, the same way a vendor client
//! library would run it.

use crate::db::native::{ConnectParams, NativeClient, NativeConnection, NativeError, NativeResult};
use crate::db::types;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{Column, ConnectOptions, Connection, Either, Executor, Row};
use std::str::FromStr;
use tracing::{debug, warn};

pub const MEMORY_DATABASE: &str = ":memory:";

/// Native client for SQLite database files.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteClient {
    create_if_missing: bool,
}

impl SqliteClient {
    /// A client that refuses to open a file that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that creates the database file on first connect.
    pub fn creating() -> Self {
        Self {
            create_if_missing: true,
        }
    }

    fn options(&self, target: &str) -> Result<SqliteConnectOptions, NativeError> {
        if target.is_empty() {
            return Err(NativeError::new("No SQLite database file given"));
        }
        if target == MEMORY_DATABASE {
            return Ok(SqliteConnectOptions::from_str("sqlite::memory:")?);
        }
        Ok(SqliteConnectOptions::new()
            .filename(target)
            .create_if_missing(self.create_if_missing))
    }
}

#[async_trait]
impl NativeClient for SqliteClient {
    fn name(&self) -> &str {
        "sqlx-sqlite"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn NativeConnection>, NativeError> {
        let conn = self.options(&params.target)?.connect().await?;
        debug!(target = %params.target, "Opened SQLite connection");
        Ok(Box::new(SqliteNative {
            conn,
            broken: false,
        }))
    }
}

/// One open SQLite connection.
pub struct SqliteNative {
    conn: SqliteConnection,
    /// Set once the connection reported a transport-level failure.
    broken: bool,
}

impl SqliteNative {
    /// Record a failure, marking the handle unusable when the connection itself failed.
    fn check(&mut self, err: sqlx::Error) -> NativeError {
        if is_connection_failure(&err) {
            warn!(error = %err, "SQLite connection is no longer usable");
            self.broken = true;
        }
        NativeError::from(err)
    }

    async fn run(&mut self, sql: &str) -> Result<(), NativeError> {
        match self.conn.execute(sql).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.check(e)),
        }
    }
}

/// Errors after which the connection cannot be used again. Statement errors
/// (bad SQL, constraint violations) leave it usable.
fn is_connection_failure(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

#[async_trait]
impl NativeConnection for SqliteNative {
    async fn query(&mut self, sql: &str) -> Result<NativeResult, NativeError> {
        match collect(&mut self.conn, sql).await {
            Ok(result) => Ok(result),
            Err(e) => Err(self.check(e)),
        }
    }

    async fn begin(&mut self) -> Result<(), NativeError> {
        self.run("BEGIN").await
    }

    async fn commit(&mut self) -> Result<(), NativeError> {
        self.run("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), NativeError> {
        self.run("ROLLBACK").await
    }

    fn is_valid(&self) -> bool {
        !self.broken
    }

    async fn close(self: Box<Self>) -> Result<(), NativeError> {
        self.conn.close().await?;
        Ok(())
    }
}

/// Run every statement in `sql`, collecting rows and summing affected counts.
async fn collect(conn: &mut SqliteConnection, sql: &str) -> Result<NativeResult, sqlx::Error> {
    let mut result = NativeResult::default();
    let mut stream = conn.fetch_many(sql);

    while let Some(step) = stream.try_next().await? {
        match step {
            Either::Left(done) => result.rows_affected += done.rows_affected(),
            Either::Right(row) => {
                if result.columns.is_empty() {
                    result.columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                }
                result.rows.push(types::sqlite::decode_row(&row));
            }
        }
    }

    Ok(result)
}
