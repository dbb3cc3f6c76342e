//! Database abstraction layer.
//!
//! One uniform driver contract over different SQL engines: connection and
//! transaction handling, cursors, schema introspection, dialect-correct value
//! serialization and `#__` table-prefix rewriting. Firebird and SQLite dialects
//! are provided; the raw transport is pluggable through `db::NativeClient`.

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::Config;
pub use db::DatabaseDriver;
pub use error::{DbError, DbResult};
pub use models::{ConnectionConfig, DriverKind};
