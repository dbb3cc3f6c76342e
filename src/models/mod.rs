//! Data models for the database abstraction layer.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod schema;

// Re-export commonly used types
pub use connection::{
    ConnectionConfig, ConnectionConfigError, DEFAULT_HOST, DEFAULT_PASSWORD, DEFAULT_USER,
    DriverKind,
};
pub use schema::{ColumnMetadata, ColumnTypes, base_type_name};

/// A fetched row keyed by column name, in result-set column order.
pub type Row = serde_json::Map<String, serde_json::Value>;
