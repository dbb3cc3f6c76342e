//! Connection and transaction driver.
//!
//! `DatabaseDriver` owns one physical connection, the statement text set by the
//! caller, the buffered result sets behind every live cursor and the transaction
//! state machine. Engine differences live in the `Dialect` it is built with; the
//! raw transport lives behind a `NativeClient`.
//!
//! # State
//!
//! ```text
//! Disconnected --connect()--> Connected --disconnect()--> Disconnected
//!
//! Transaction: None --start--> Active --commit--> Committed
//!                                     --rollback--> RolledBack
//! ```
//!
//! Savepoints form a stack inside an `Active` transaction. Committing or rolling
//! back "to savepoint" only pops the top of that stack.

use crate::db::dialect::{self, Dialect};
use crate::db::native::{ConnectParams, NativeClient, NativeConnection, NativeResult};
use crate::db::prefix::{self, PREFIX_TOKEN};
use crate::db::query::Query;
use crate::db::sqlite::SqliteClient;
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionConfig, DriverKind, Row};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Character set requested from the native client on connect.
pub const CONNECTION_CHARSET: &str = "UTF-8";

/// Statements kept by the debug log; older entries are dropped first.
pub const DEBUG_LOG_LIMIT: usize = 100;

/// Handle to a buffered result set produced by one `execute()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(u64);

impl fmt::Display for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Transaction state of the current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    None,
    Active,
    Committed,
    RolledBack,
}

impl TransactionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Callback run before the native connection is released.
pub type DisconnectHandler = Box<dyn FnMut(&DatabaseDriver) -> DbResult<()> + Send>;

/// Rows of one executed statement, consumed front to back.
#[derive(Debug)]
struct ResultSet {
    columns: Vec<String>,
    rows: VecDeque<Vec<JsonValue>>,
    num_rows: usize,
}

impl From<NativeResult> for ResultSet {
    fn from(result: NativeResult) -> Self {
        let num_rows = result.rows.len();
        Self {
            columns: result.columns,
            rows: result.rows.into(),
            num_rows,
        }
    }
}

impl ResultSet {
    fn next_assoc(&mut self) -> Option<Row> {
        let row = self.rows.pop_front()?;
        Some(self.columns.iter().cloned().zip(row).collect())
    }
}

/// Database driver for one connection.
pub struct DatabaseDriver {
    config: ConnectionConfig,
    dialect: Arc<dyn Dialect>,
    client: Option<Arc<dyn NativeClient>>,
    connection: Option<Box<dyn NativeConnection>>,
    sql: Option<String>,
    pub(crate) query_object: Option<Query>,
    cursors: HashMap<CursorId, ResultSet>,
    cursor: Option<CursorId>,
    next_cursor: u64,
    affected_rows: u64,
    transaction: TransactionState,
    savepoints: Vec<String>,
    disconnect_handlers: Vec<DisconnectHandler>,
    count: usize,
    log: Vec<String>,
}

impl fmt::Debug for DatabaseDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseDriver")
            .field("config", &self.config)
            .field("dialect", &self.dialect.name())
            .field("connected", &self.connection.is_some())
            .field("cursors", &self.cursors.len())
            .field("transaction", &self.transaction)
            .field("savepoints", &self.savepoints)
            .finish()
    }
}

impl DatabaseDriver {
    /// Create a driver using the built-in native client for the configured kind.
    ///
    /// Firebird has no built-in client; such a driver reports
    /// `UnsupportedCapability` on connect unless built with `with_client`.
    pub fn new(config: ConnectionConfig) -> Self {
        let client: Option<Arc<dyn NativeClient>> = match config.driver {
            DriverKind::Sqlite => Some(Arc::new(SqliteClient::new())),
            DriverKind::Firebird => None,
        };
        Self::build(config, client)
    }

    /// Create a driver on top of a caller-provided native client.
    pub fn with_client(config: ConnectionConfig, client: Arc<dyn NativeClient>) -> Self {
        Self::build(config, Some(client))
    }

    fn build(config: ConnectionConfig, client: Option<Arc<dyn NativeClient>>) -> Self {
        Self {
            dialect: dialect::for_kind(config.driver),
            config,
            client,
            connection: None,
            sql: None,
            query_object: None,
            cursors: HashMap::new(),
            cursor: None,
            next_cursor: 1,
            affected_rows: 0,
            transaction: TransactionState::None,
            savepoints: Vec::new(),
            disconnect_handlers: Vec::new(),
            count: 0,
            log: Vec::new(),
        }
    }

    /// Whether a built-in native client exists for `kind`.
    pub fn is_kind_supported(kind: DriverKind) -> bool {
        matches!(kind, DriverKind::Sqlite)
    }

    /// Capability check for this driver's native client.
    pub fn is_supported(&self) -> bool {
        self.client.as_ref().is_some_and(|c| c.is_available())
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn name(&self) -> &'static str {
        self.dialect.name()
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    pub fn null_date(&self) -> &'static str {
        self.dialect.null_date()
    }

    pub fn min_version(&self) -> &'static str {
        self.dialect.min_version()
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    /// Open the native connection. No-op when already connected.
    pub async fn connect(&mut self) -> DbResult<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let client = match &self.client {
            Some(client) if client.is_available() => Arc::clone(client),
            _ => {
                return Err(DbError::unsupported_capability(
                    self.name(),
                    format!("the native {} client is not installed or enabled", self.name()),
                ));
            }
        };

        let params = ConnectParams {
            target: self.dialect.connection_target(&self.config),
            user: self.config.user.clone(),
            password: self.config.password.clone(),
            charset: CONNECTION_CHARSET.to_string(),
        };

        let connection = client.connect(&params).await.map_err(|e| {
            DbError::connect(format!("Error connecting to {} database: {}", self.name(), e))
        })?;

        info!(
            driver = self.name(),
            client = client.name(),
            target = %params.target,
            "Connected to database"
        );
        self.connection = Some(connection);
        self.transaction = TransactionState::None;
        self.savepoints.clear();
        Ok(())
    }

    /// Run the disconnect handlers, then release the native connection.
    ///
    /// No-op when not connected. Handler failures are logged and do not stop the
    /// connection from being released. Every cursor dies with the connection.
    pub async fn disconnect(&mut self) {
        if self.connection.is_none() {
            return;
        }

        let mut handlers = std::mem::take(&mut self.disconnect_handlers);
        for (idx, handler) in handlers.iter_mut().enumerate() {
            if let Err(e) = handler(self) {
                warn!(handler = idx, error = %e, "Disconnect handler failed");
            }
        }
        handlers.append(&mut self.disconnect_handlers);
        self.disconnect_handlers = handlers;

        self.cursors.clear();
        self.cursor = None;
        self.transaction = TransactionState::None;
        self.savepoints.clear();

        if let Some(connection) = self.connection.take()
            && let Err(e) = connection.close().await
        {
            warn!(driver = self.name(), error = %e, "Error closing native connection");
        }
        info!(driver = self.name(), "Disconnected from database");
    }

    /// Attempt to connect, then report whether the native handle is valid.
    pub async fn connected(&mut self) -> bool {
        if let Err(e) = self.connect().await {
            warn!(driver = self.name(), error = %e, "Connection attempt failed");
        }
        self.connection.as_ref().is_some_and(|c| c.is_valid())
    }

    /// Register a callback run at the start of every `disconnect()`.
    pub fn add_disconnect_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&DatabaseDriver) -> DbResult<()> + Send + 'static,
    {
        self.disconnect_handlers.push(Box::new(handler));
    }

    // =========================================================================
    // Statements and cursors
    // =========================================================================

    /// Set the logical SQL run by the next `execute()`.
    pub fn set_query(&mut self, sql: impl Into<String>) -> &mut Self {
        self.sql = Some(sql.into());
        self
    }

    /// The logical SQL last set, before prefix rewriting.
    pub fn query_sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    /// Run the SQL set by `set_query` and make its result the current cursor.
    pub async fn execute(&mut self) -> DbResult<CursorId> {
        let logical = self
            .sql
            .clone()
            .ok_or_else(|| DbError::invalid_input("No SQL statement has been set"))?;

        self.cursor = None;
        let result = self.run_native(&logical).await?;

        let id = CursorId(self.next_cursor);
        self.next_cursor += 1;
        self.cursors.insert(id, ResultSet::from(result));
        self.cursor = Some(id);
        Ok(id)
    }

    /// Set and execute a statement whose rows are not needed.
    pub(crate) async fn run(&mut self, sql: String) -> DbResult<()> {
        self.set_query(sql);
        let cursor = self.execute().await?;
        self.free_result(Some(cursor))
    }

    async fn run_native(&mut self, logical: &str) -> DbResult<NativeResult> {
        self.connect().await?;
        let sql = self.replace_prefix(logical);

        self.count += 1;
        if self.config.debug {
            if self.log.len() >= DEBUG_LOG_LIMIT {
                self.log.remove(0);
            }
            self.log.push(sql.clone());
            debug!(sql = %sql, "Executing statement");
        } else {
            debug!(sql = %logical, "Executing statement");
        }

        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| DbError::connect("Not connected to database"))?;

        match connection.query(&sql).await {
            Ok(result) => {
                self.affected_rows = result.rows_affected;
                Ok(result)
            }
            Err(e) => {
                self.affected_rows = 0;
                Err(DbError::execution(self.redact(&sql), self.redact(&e.message)))
            }
        }
    }

    /// Put the logical token back in place of the physical prefix, unless debugging.
    fn redact(&self, text: &str) -> String {
        if self.config.debug || self.config.prefix.is_empty() {
            text.to_string()
        } else {
            text.replace(&self.config.prefix, PREFIX_TOKEN)
        }
    }

    fn cursor_id(&self, cursor: Option<CursorId>) -> DbResult<CursorId> {
        cursor
            .or(self.cursor)
            .ok_or_else(|| DbError::invalid_cursor("no current cursor"))
    }

    fn result_set(&mut self, cursor: Option<CursorId>) -> DbResult<&mut ResultSet> {
        let id = self.cursor_id(cursor)?;
        self.cursors
            .get_mut(&id)
            .ok_or_else(|| DbError::invalid_cursor(id))
    }

    /// Next row of the given (or current) cursor as positional values.
    pub fn fetch_array(&mut self, cursor: Option<CursorId>) -> DbResult<Option<Vec<JsonValue>>> {
        Ok(self.result_set(cursor)?.rows.pop_front())
    }

    /// Next row of the given (or current) cursor keyed by column name.
    pub fn fetch_assoc(&mut self, cursor: Option<CursorId>) -> DbResult<Option<Row>> {
        Ok(self.result_set(cursor)?.next_assoc())
    }

    /// Next row of the given (or current) cursor deserialized into `T`.
    pub fn fetch_object<T: DeserializeOwned>(&mut self, cursor: Option<CursorId>) -> DbResult<Option<T>> {
        match self.fetch_assoc(cursor)? {
            Some(row) => Ok(Some(serde_json::from_value(JsonValue::Object(row))?)),
            None => Ok(None),
        }
    }

    /// Release a cursor. A second release of the same cursor is an `InvalidCursor` error.
    pub fn free_result(&mut self, cursor: Option<CursorId>) -> DbResult<()> {
        let id = self.cursor_id(cursor)?;
        self.cursors
            .remove(&id)
            .ok_or_else(|| DbError::invalid_cursor(id))?;
        if self.cursor == Some(id) {
            self.cursor = None;
        }
        Ok(())
    }

    /// Rows changed by the last executed statement.
    pub fn get_affected_rows(&self) -> DbResult<u64> {
        self.require_connection()?;
        Ok(self.affected_rows)
    }

    /// Rows returned by the statement behind the given (or current) cursor.
    pub fn get_num_rows(&self, cursor: Option<CursorId>) -> DbResult<usize> {
        self.require_connection()?;
        let id = self.cursor_id(cursor)?;
        self.cursors
            .get(&id)
            .map(|set| set.num_rows)
            .ok_or_else(|| DbError::invalid_cursor(id))
    }

    fn require_connection(&self) -> DbResult<()> {
        if self.connection.is_some() {
            Ok(())
        } else {
            Err(DbError::connect("Not connected to database"))
        }
    }

    /// Number of statements executed through this driver.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The most recent executed statements, oldest first, recorded only in
    /// debug mode and capped at `DEBUG_LOG_LIMIT`.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Empty the debug log and return what it held.
    pub fn take_log(&mut self) -> Vec<String> {
        std::mem::take(&mut self.log)
    }

    // =========================================================================
    // Load helpers
    // =========================================================================

    async fn load_rows(&mut self) -> DbResult<(Vec<String>, Vec<Vec<JsonValue>>)> {
        let cursor = self.execute().await?;
        let set = self
            .cursors
            .remove(&cursor)
            .ok_or_else(|| DbError::invalid_cursor(cursor))?;
        self.cursor = None;
        Ok((set.columns, set.rows.into()))
    }

    async fn load_assoc_rows(&mut self) -> DbResult<Vec<Row>> {
        let (columns, rows) = self.load_rows().await?;
        Ok(rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect())
    }

    /// First column of the first row.
    pub async fn load_result(&mut self) -> DbResult<Option<JsonValue>> {
        let (_, rows) = self.load_rows().await?;
        Ok(rows.into_iter().next().and_then(|row| row.into_iter().next()))
    }

    pub async fn load_row(&mut self) -> DbResult<Option<Vec<JsonValue>>> {
        let (_, rows) = self.load_rows().await?;
        Ok(rows.into_iter().next())
    }

    pub async fn load_assoc(&mut self) -> DbResult<Option<Row>> {
        Ok(self.load_assoc_rows().await?.into_iter().next())
    }

    pub async fn load_assoc_list(&mut self) -> DbResult<Vec<Row>> {
        self.load_assoc_rows().await
    }

    /// One column of every row.
    pub async fn load_column(&mut self, offset: usize) -> DbResult<Vec<JsonValue>> {
        let (_, rows) = self.load_rows().await?;
        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().nth(offset).unwrap_or(JsonValue::Null))
            .collect())
    }

    pub async fn load_object<T: DeserializeOwned>(&mut self) -> DbResult<Option<T>> {
        match self.load_assoc().await? {
            Some(row) => Ok(Some(serde_json::from_value(JsonValue::Object(row))?)),
            None => Ok(None),
        }
    }

    pub async fn load_object_list<T: DeserializeOwned>(&mut self) -> DbResult<Vec<T>> {
        self.load_assoc_rows()
            .await?
            .into_iter()
            .map(|row| serde_json::from_value(JsonValue::Object(row)).map_err(DbError::from))
            .collect()
    }

    /// Run a statement that must produce exactly one row.
    async fn load_single_row(&mut self, sql: String) -> DbResult<Row> {
        self.set_query(sql);
        let mut rows = self.load_assoc_rows().await?;
        if rows.len() != 1 {
            let sql = self.sql.clone().unwrap_or_default();
            return Err(DbError::execution(
                self.redact(&sql),
                format!("expected exactly one row, got {}", rows.len()),
            ));
        }
        Ok(rows.remove(0))
    }

    fn single_value(&self, mut row: Row, column: &str) -> DbResult<JsonValue> {
        row.remove(column)
            .ok_or_else(|| DbError::internal(format!("Result has no '{}' column", column)))
    }

    /// Server version string.
    pub async fn version(&mut self) -> DbResult<String> {
        let sql = self.dialect.version_sql();
        let row = self.load_single_row(sql).await?;
        match self.single_value(row, "version")? {
            JsonValue::String(s) => Ok(s.trim().to_string()),
            other => Ok(other.to_string()),
        }
    }

    /// Whether the server is at least the dialect's minimum version.
    pub async fn is_min_version(&mut self) -> DbResult<bool> {
        let version = self.version().await?;
        Ok(compare_versions(&version, self.min_version()) != std::cmp::Ordering::Less)
    }

    /// 1-based position of `substring` in `string`, 0 when absent.
    pub async fn string_position(&mut self, substring: &str, string: &str) -> DbResult<i64> {
        let sql = self.dialect.string_position_sql(substring, string);
        let row = self.load_single_row(sql).await?;
        let value = self.single_value(row, "position")?;
        value
            .as_i64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| DbError::internal(format!("Position is not an integer: {}", value)))
    }

    /// Random number in `[0, 1)` generated by the server.
    pub async fn random(&mut self) -> DbResult<f64> {
        let sql = self.dialect.random_sql();
        let row = self.load_single_row(sql).await?;
        let value = self.single_value(row, "random")?;
        value
            .as_f64()
            .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
            .ok_or_else(|| DbError::internal(format!("Random value is not a number: {}", value)))
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    pub fn transaction_state(&self) -> TransactionState {
        self.transaction
    }

    /// Active savepoints, oldest first.
    pub fn savepoints(&self) -> &[String] {
        &self.savepoints
    }

    /// Begin a transaction, or push a savepoint when one is active and `as_savepoint` is set.
    pub async fn transaction_start(&mut self, as_savepoint: bool) -> DbResult<()> {
        self.connect().await?;

        if self.transaction.is_active() {
            if !as_savepoint {
                return Err(DbError::transaction("A transaction is already active"));
            }
            let mut depth = self.savepoints.len() + 1;
            let mut name = format!("SP_{}", depth);
            while self.savepoints.contains(&name) {
                depth += 1;
                name = format!("SP_{}", depth);
            }
            return self.transaction_savepoint(&name).await;
        }

        self.native()?.begin().await.map_err(|e| {
            DbError::transaction(format!("Could not start transaction: {}", e))
        })?;
        self.transaction = TransactionState::Active;
        self.savepoints.clear();
        debug!(driver = self.name(), "Transaction started");
        Ok(())
    }

    /// Commit the transaction, or release only the newest savepoint.
    pub async fn transaction_commit(&mut self, to_savepoint: bool) -> DbResult<()> {
        if to_savepoint && let Some(name) = self.savepoints.last().cloned() {
            let sql = self.dialect.release_savepoint_sql(&name);
            self.run(sql).await?;
            self.savepoints.pop();
            return Ok(());
        }

        self.require_active()?;
        self.native()?.commit().await.map_err(|e| {
            DbError::transaction(format!("Could not commit transaction: {}", e))
        })?;
        self.transaction = TransactionState::Committed;
        self.savepoints.clear();
        debug!(driver = self.name(), "Transaction committed");
        Ok(())
    }

    /// Roll back the transaction, or only to the newest savepoint.
    pub async fn transaction_rollback(&mut self, to_savepoint: bool) -> DbResult<()> {
        if to_savepoint && let Some(name) = self.savepoints.last().cloned() {
            let sql = self.dialect.rollback_to_savepoint_sql(&name);
            self.run(sql).await?;
            self.savepoints.pop();
            return Ok(());
        }

        self.require_active()?;
        self.native()?.rollback().await.map_err(|e| {
            DbError::transaction(format!("Could not roll back transaction: {}", e))
        })?;
        self.transaction = TransactionState::RolledBack;
        self.savepoints.clear();
        debug!(driver = self.name(), "Transaction rolled back");
        Ok(())
    }

    /// Create a named savepoint in the active transaction.
    pub async fn transaction_savepoint(&mut self, name: &str) -> DbResult<()> {
        self.require_active()?;
        if self.savepoints.iter().any(|s| s == name) {
            return Err(DbError::transaction(format!(
                "Savepoint '{}' already exists",
                name
            )));
        }
        let sql = self.dialect.savepoint_sql(name);
        self.run(sql).await?;
        self.savepoints.push(name.to_string());
        Ok(())
    }

    /// Release a named savepoint and every savepoint created after it.
    pub async fn release_transaction_savepoint(&mut self, name: &str) -> DbResult<()> {
        self.require_active()?;
        let position = self
            .savepoints
            .iter()
            .position(|s| s == name)
            .ok_or_else(|| DbError::transaction(format!("Unknown savepoint '{}'", name)))?;
        let sql = self.dialect.release_savepoint_sql(name);
        self.run(sql).await?;
        self.savepoints.truncate(position);
        Ok(())
    }

    /// Table locks end with the transaction; commit it if one is active.
    pub async fn unlock_tables(&mut self) -> DbResult<()> {
        if self.transaction.is_active() {
            self.transaction_commit(false).await?;
        }
        Ok(())
    }

    fn require_active(&self) -> DbResult<()> {
        if self.transaction.is_active() {
            Ok(())
        } else {
            Err(DbError::transaction("No active transaction"))
        }
    }

    fn native(&mut self) -> DbResult<&mut Box<dyn NativeConnection>> {
        self.connection
            .as_mut()
            .ok_or_else(|| DbError::connect("Not connected to database"))
    }

    // =========================================================================
    // Session settings
    // =========================================================================

    /// The database is fixed by the connection target, so selection always succeeds.
    pub fn select(&self, _database: &str) -> DbResult<bool> {
        Ok(true)
    }

    /// The connection charset is negotiated on connect; only ensures a connection.
    pub async fn set_utf(&mut self) -> DbResult<()> {
        self.connect().await
    }

    /// Collation is not reported by either dialect.
    pub fn collation(&self) -> Option<String> {
        None
    }

    pub fn connection_collation(&self) -> String {
        String::new()
    }

    // =========================================================================
    // Quoting
    // =========================================================================

    /// Rewrite the `#__` token to the configured prefix.
    pub fn replace_prefix(&self, sql: &str) -> String {
        self.replace_prefix_token(sql, PREFIX_TOKEN)
    }

    pub fn replace_prefix_token(&self, sql: &str, token: &str) -> String {
        prefix::replace_prefix(sql, token, &self.config.prefix)
    }

    pub fn escape(&self, text: &str) -> String {
        self.dialect.escape(text)
    }

    pub fn quote(&self, text: &str) -> String {
        self.dialect.quote(text)
    }

    pub fn quote_name(&self, name: &str) -> String {
        self.dialect.quote_name(name)
    }

    pub fn quote_name_as(&self, name: &str, alias: &str) -> String {
        prefix::quote_name_as(name, alias, self.dialect.name_quote())
    }
}

/// Compare dotted version strings numerically, ignoring any non-numeric tail.
fn compare_versions(left: &str, right: &str) -> std::cmp::Ordering {
    fn parts(version: &str) -> Vec<u64> {
        version
            .split(|c: char| !c.is_ascii_digit())
            .filter(|p| !p.is_empty())
            .filter_map(|p| p.parse().ok())
            .collect()
    }
    let (mut l, mut r) = (parts(left), parts(right));
    let len = l.len().max(r.len());
    l.resize(len, 0);
    r.resize(len, 0);
    l.cmp(&r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("3.45.1", "3.35.0"), Ordering::Greater);
        assert_eq!(compare_versions("2.5", "2.5.0"), Ordering::Equal);
        assert_eq!(compare_versions("WI-V2.1.7", "2.5"), Ordering::Less);
    }

    #[test]
    fn test_cursor_display() {
        assert_eq!(CursorId(7).to_string(), "#7");
    }

    #[test]
    fn test_firebird_without_client_is_unsupported() {
        let driver = DatabaseDriver::new(ConnectionConfig::default());
        assert!(!driver.is_supported());
        assert!(!DatabaseDriver::is_kind_supported(DriverKind::Firebird));
        assert!(DatabaseDriver::is_kind_supported(DriverKind::Sqlite));
    }

    #[tokio::test]
    async fn test_connect_without_client_fails_with_unsupported_capability() {
        let mut driver = DatabaseDriver::new(ConnectionConfig::default());
        let err = driver.connect().await.unwrap_err();
        assert!(matches!(err, DbError::UnsupportedCapability { .. }));
        assert!(!driver.connected().await);
    }

    #[tokio::test]
    async fn test_execute_without_sql_is_invalid_input() {
        let mut driver = DatabaseDriver::new(ConnectionConfig::new(DriverKind::Sqlite));
        let err = driver.execute().await.unwrap_err();
        assert!(matches!(err, DbError::InvalidInput { .. }));
    }

    #[test]
    fn test_fetch_without_cursor_is_invalid_cursor() {
        let mut driver = DatabaseDriver::new(ConnectionConfig::new(DriverKind::Sqlite));
        assert!(matches!(
            driver.fetch_array(None),
            Err(DbError::InvalidCursor { .. })
        ));
        assert!(matches!(
            driver.free_result(Some(CursorId(3))),
            Err(DbError::InvalidCursor { .. })
        ));
    }

    #[test]
    fn test_redact_restores_token() {
        let driver = DatabaseDriver::new(
            ConnectionConfig::new(DriverKind::Sqlite).with_prefix("jos_"),
        );
        assert_eq!(driver.redact("SELECT * FROM jos_users"), "SELECT * FROM #__users");

        let driver = DatabaseDriver::new(
            ConnectionConfig::new(DriverKind::Sqlite)
                .with_prefix("jos_")
                .with_debug(true),
        );
        assert_eq!(driver.redact("SELECT * FROM jos_users"), "SELECT * FROM jos_users");
    }

    #[test]
    fn test_quoting_delegates_to_dialect() {
        let driver = DatabaseDriver::new(ConnectionConfig::default().with_prefix("jos_"));
        assert_eq!(driver.quote_name("#__users"), "\"#__users\"");
        assert_eq!(driver.quote("it's"), "'it''s'");
        assert_eq!(driver.escape("it's"), "it''s");
        assert_eq!(driver.quote_name_as("u.id", "key"), "\"u\".\"id\" AS \"key\"");
        assert_eq!(driver.replace_prefix("SELECT * FROM #__users"), "SELECT * FROM jos_users");
    }
}
