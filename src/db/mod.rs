//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Native client seam and the SQLite client
//! - SQL dialects (Firebird, SQLite)
//! - Identifier quoting and table-prefix rewriting
//! - Value serialization for SQL literals
//! - Connection, cursor and transaction handling
//! - Schema introspection and object persistence

pub mod dialect;
pub mod driver;
pub mod native;
pub mod persist;
pub mod prefix;
pub mod query;
pub mod schema;
pub mod sqlite;
pub mod types;

pub use dialect::{Dialect, Firebird, Sqlite};
pub use driver::{CursorId, DEBUG_LOG_LIMIT, DatabaseDriver, DisconnectHandler, TransactionState};
pub use native::{ConnectParams, NativeClient, NativeConnection, NativeError, NativeResult};
pub use prefix::PREFIX_TOKEN;
pub use query::{Query, QueryFeatures};
pub use sqlite::SqliteClient;
pub use types::{TypeCategory, sql_value};
